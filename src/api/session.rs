//! Login and home screen endpoints.

use axum::{extract::State, Extension};

use super::{error, success, ApiJson, ApiResult};
use crate::auth::CurrentMember;
use crate::errors::AppError;
use crate::models::{default_program, HomeView, LoginRequest, LoginResponse, TimelineEntry};
use crate::AppState;

/// Shown for any failed login; never says which field was wrong.
const LOGIN_FAILED: &str = "名前または誕生日が正しくありません。";

/// POST /api/session/login - Look up a member by name and birthday.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let name = request.name.trim();
    let birthday = request.birthday.trim();
    if name.is_empty() || birthday.is_empty() {
        return error(AppError::Unauthorized(LOGIN_FAILED.to_string()), revision_id);
    }

    match state.repo.authenticate(name, birthday).await {
        Ok(Some(member)) => {
            tracing::info!("Member {} logged in", member.id);
            success(
                LoginResponse {
                    member_id: member.id,
                    role: member.role,
                    first_name: member.first_name,
                },
                revision_id,
            )
        }
        Ok(None) => error(AppError::Unauthorized(LOGIN_FAILED.to_string()), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/session/home - Greeting, role and the day's timeline.
pub async fn home(
    State(state): State<AppState>,
    Extension(CurrentMember(member)): Extension<CurrentMember>,
) -> ApiResult<HomeView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let schedule = match state.repo.list_schedules().await {
        Ok(items) if items.is_empty() => default_program(),
        Ok(items) => items.into_iter().map(TimelineEntry::from).collect(),
        Err(e) => return error(e, revision_id),
    };

    success(
        HomeView {
            is_admin: member.is_admin(),
            first_name: member.first_name,
            role: member.role,
            schedule,
        },
        revision_id,
    )
}
