//! Meal survey endpoints, for members and for the organizers' shopping list.

use axum::{extract::State, Extension};

use super::{error, success, ApiJson, ApiResult};
use crate::auth::CurrentMember;
use crate::models::{
    MealOptions, MealPreference, MealPreferenceWithMember, SaveMealPreferenceRequest,
};
use crate::summary::{summarize, MealSummary};
use crate::AppState;

/// GET /api/meal/options - Choices offered by the survey.
pub async fn get_meal_options(State(state): State<AppState>) -> ApiResult<MealOptions> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    success(MealOptions::catalogue(), revision_id)
}

/// GET /api/meal - The caller's own answer, `null` before the first save.
pub async fn get_my_meal_preference(
    State(state): State<AppState>,
    Extension(CurrentMember(member)): Extension<CurrentMember>,
) -> ApiResult<Option<MealPreference>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_meal_preference(&member.id).await {
        Ok(preference) => success(preference, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/meal - Create or replace the caller's answer.
pub async fn save_my_meal_preference(
    State(state): State<AppState>,
    Extension(CurrentMember(member)): Extension<CurrentMember>,
    ApiJson(request): ApiJson<SaveMealPreferenceRequest>,
) -> ApiResult<MealPreference> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let input = match request.validate() {
        Ok(input) => input,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.upsert_meal_preference(&member.id, &input).await {
        Ok(preference) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(preference, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/meal - Every answer with the member's name, newest first.
pub async fn list_meal_preferences(
    State(state): State<AppState>,
) -> ApiResult<Vec<MealPreferenceWithMember>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_meal_preferences().await {
        Ok(preferences) => success(preferences, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/meal/summary - Frequency tables for the shopping list.
pub async fn get_meal_summary(State(state): State<AppState>) -> ApiResult<MealSummary> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let preferences = match state.repo.list_meal_preferences().await {
        Ok(p) => p,
        Err(e) => return error(e, revision_id),
    };
    let members = match state.repo.all_members().await {
        Ok(m) => m,
        Err(e) => return error(e, revision_id),
    };

    success(summarize(&preferences, &members), revision_id)
}
