//! Member model: attendees and organizers on the roster.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Role flag stored on each member.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Role::Member),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// A registered attendee or organizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    /// Full name, matched on login
    pub name: String,
    pub first_name: String,
    /// Doubles as the login secret, so it never leaves the server
    #[serde(skip_serializing, default)]
    pub birthday: String,
    pub role: Role,
    pub is_present: bool,
    pub created_at: String,
}

impl Member {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Roster row with the meal-survey badge.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberListItem {
    #[serde(flatten)]
    pub member: Member,
    pub has_meal_preference: bool,
}

/// Query parameters for the roster.
#[derive(Debug, Default, Deserialize)]
pub struct MemberQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Request body for registering a member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    pub name: String,
    pub first_name: String,
    pub birthday: String,
    #[serde(default)]
    pub role: Role,
}

impl CreateMemberRequest {
    /// Trim every field and reject blanks.
    pub fn validated(self) -> Result<Self, AppError> {
        let name = self.name.trim().to_string();
        let first_name = self.first_name.trim().to_string();
        let birthday = self.birthday.trim().to_string();

        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        if first_name.is_empty() {
            return Err(AppError::Validation("First name is required".to_string()));
        }
        if birthday.is_empty() {
            return Err(AppError::Validation("Birthday is required".to_string()));
        }

        Ok(Self {
            name,
            first_name,
            birthday,
            role: self.role,
        })
    }
}

/// Request body for the attendance toggle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePresenceRequest {
    pub is_present: bool,
}
