//! Schedule endpoints.

use axum::extract::{Path, State};

use super::{error, success, ApiJson, ApiResult};
use crate::models::{SaveScheduleRequest, ScheduleEntryInput, ScheduleItem};
use crate::AppState;

/// GET /api/schedules - Stored rows ordered by start time.
pub async fn list_schedules(State(state): State<AppState>) -> ApiResult<Vec<ScheduleItem>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_schedules().await {
        Ok(items) => success(items, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/admin/schedules - Save every row of the editor at once.
pub async fn save_schedules(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SaveScheduleRequest>,
) -> ApiResult<Vec<ScheduleItem>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let entries: Vec<ScheduleEntryInput> = match request
        .items
        .into_iter()
        .map(ScheduleEntryInput::validated)
        .collect()
    {
        Ok(entries) => entries,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.save_schedules(&entries).await {
        Ok(items) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(items, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/admin/schedules/:id - Remove one row.
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_schedule(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
