//! Login and home screen payloads.

use serde::{Deserialize, Serialize};

use super::{Role, TimelineEntry};

/// Name + birthday login form.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub birthday: String,
}

/// Values the client keeps as its session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub member_id: String,
    pub role: Role,
    pub first_name: String,
}

/// Everything the home screen renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    pub first_name: String,
    pub role: Role,
    pub is_admin: bool,
    pub schedule: Vec<TimelineEntry>,
}
