//! Music box endpoints.

use axum::{
    extract::{Path, State},
    Extension,
};

use super::{error, success, ApiJson, ApiResult};
use crate::auth::CurrentMember;
use crate::errors::AppError;
use crate::models::{clean_text, CreateSongRequest, SongRequest};
use crate::AppState;

/// GET /api/requests - The shared playlist, newest first.
pub async fn list_requests(State(state): State<AppState>) -> ApiResult<Vec<SongRequest>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_requests().await {
        Ok(requests) => success(requests, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/requests - Post a song on behalf of the caller.
pub async fn create_request(
    State(state): State<AppState>,
    Extension(CurrentMember(member)): Extension<CurrentMember>,
    ApiJson(request): ApiJson<CreateSongRequest>,
) -> ApiResult<SongRequest> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let request = CreateSongRequest {
        song_title: request.song_title.trim().to_string(),
        artist_name: clean_text(request.artist_name),
        message: clean_text(request.message),
    };

    if request.song_title.is_empty() {
        return error(
            AppError::Validation("Song title is required".to_string()),
            revision_id,
        );
    }

    match state.repo.create_request(&member, &request).await {
        Ok(created) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(created, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/admin/requests/:id - Remove a request from the playlist.
pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_request(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
