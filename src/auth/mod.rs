//! Request gating.
//!
//! Three layers, outermost first: an optional deployment pre-shared key, the
//! member session resolved from `x-member-id`, and the organizer check.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::models::Member;
use crate::AppState;

/// Header name for the deployment API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the member id handed out at login.
pub const MEMBER_ID_HEADER: &str = "x-member-id";

/// The logged-in member, inserted into request extensions by [`session_layer`].
#[derive(Debug, Clone)]
pub struct CurrentMember(pub Member);

/// PSK authentication layer function that takes the expected PSK as a parameter.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // No PSK configured: open deployment
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .map(str::to_string);

    match provided {
        Some(key) if constant_time_compare(&key, &expected) => next.run(request).await,
        Some(_) => AppError::Unauthorized("Invalid API key".to_string()).into_response(),
        None => AppError::Unauthorized("Missing API key".to_string()).into_response(),
    }
}

/// Resolve `x-member-id` to a member, or reject with 401.
pub async fn session_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let member_id = request
        .headers()
        .get(MEMBER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let Some(member_id) = member_id else {
        return AppError::Unauthorized("Login required".to_string()).into_response();
    };

    match state.repo.get_member(&member_id).await {
        Ok(Some(member)) => {
            request.extensions_mut().insert(CurrentMember(member));
            next.run(request).await
        }
        Ok(None) => {
            tracing::debug!("Rejected unknown member id {}", member_id);
            AppError::Unauthorized("Session is no longer valid".to_string()).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Allow only members whose role flag is `admin`. Runs inside [`session_layer`].
pub async fn admin_layer(request: Request, next: Next) -> Response {
    match request.extensions().get::<CurrentMember>() {
        Some(CurrentMember(member)) if member.is_admin() => next.run(request).await,
        Some(CurrentMember(member)) => {
            tracing::warn!("Member {} attempted an organizer action", member.id);
            AppError::Forbidden("Organizer access required".to_string()).into_response()
        }
        None => AppError::Unauthorized("Login required".to_string()).into_response(),
    }
}

/// Perform constant-time string comparison.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
