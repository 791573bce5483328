//! Music box requests.

use serde::{Deserialize, Serialize};

/// A song request on the shared playlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRequest {
    pub id: String,
    /// Cleared when the submitter is removed from the roster
    pub member_id: Option<String>,
    /// Full name captured at submission time
    pub member_name: Option<String>,
    /// Submitter's current first name, joined on read
    pub first_name: Option<String>,
    pub song_title: String,
    pub artist_name: Option<String>,
    pub message: Option<String>,
    pub created_at: String,
}

/// Request body for posting a song.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSongRequest {
    pub song_title: String,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
