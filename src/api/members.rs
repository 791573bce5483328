//! Roster endpoints for organizers.

use axum::extract::{Path, Query, State};

use super::{error, success, ApiJson, ApiResult};
use crate::models::{
    CreateMemberRequest, Member, MemberListItem, MemberQuery, UpdatePresenceRequest,
};
use crate::AppState;

/// GET /api/admin/members - Roster ordered by name, optionally filtered by `q`.
pub async fn list_members(
    State(state): State<AppState>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<Vec<MemberListItem>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_members(query.q.as_deref()).await {
        Ok(members) => success(members, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/admin/members - Register an attendee or organizer.
pub async fn create_member(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateMemberRequest>,
) -> ApiResult<Member> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let request = match request.validated() {
        Ok(r) => r,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.create_member(&request).await {
        Ok(member) => {
            tracing::info!("Registered member {} ({})", member.id, member.role.as_str());
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(member, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/admin/members/:id/presence - Set the attendance flag.
pub async fn update_presence(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdatePresenceRequest>,
) -> ApiResult<Member> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.set_presence(&id, request.is_present).await {
        Ok(member) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(member, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/admin/members/:id - Remove a member from the roster.
pub async fn delete_member(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_member(&id).await {
        Ok(()) => {
            tracing::info!("Deleted member {}", id);
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
