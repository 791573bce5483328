//! Timeline of the day.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// A stored schedule row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: String,
    /// Normalized `HH:MM`
    pub time_start: String,
    pub title: String,
    pub description: Option<String>,
}

/// One row of the schedule editor. Rows without an id are new.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntryInput {
    #[serde(default)]
    pub id: Option<String>,
    pub time_start: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ScheduleEntryInput {
    pub fn validated(self) -> Result<Self, AppError> {
        Ok(Self {
            id: self.id.filter(|id| !id.trim().is_empty()),
            time_start: normalize_time_start(&self.time_start)?,
            title: self.title.trim().to_string(),
            description: super::clean_text(self.description),
        })
    }
}

/// Request body for saving the whole editor.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveScheduleRequest {
    pub items: Vec<ScheduleEntryInput>,
}

/// Parse `H:MM` or `HH:MM` and render it zero-padded so text order is time order.
pub fn normalize_time_start(raw: &str) -> Result<String, AppError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| AppError::Validation(format!("Invalid start time: {}", raw)))
}

/// Timeline entry shown on the home screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub time: String,
    pub title: String,
    pub description: Option<String>,
}

impl From<ScheduleItem> for TimelineEntry {
    fn from(item: ScheduleItem) -> Self {
        Self {
            time: item.time_start,
            title: item.title,
            description: item.description,
        }
    }
}

/// Program shown while organizers have not entered a schedule yet.
pub fn default_program() -> Vec<TimelineEntry> {
    [
        ("18:00", "開宴・乾杯", "追いコンスタート！"),
        ("18:30", "お食事タイム", "寿司とピザが届きます"),
        ("19:30", "思い出ムービー", "ハンカチを用意！"),
        ("20:00", "プレゼント贈呈", "感謝を込めて"),
    ]
    .into_iter()
    .map(|(time, title, description)| TimelineEntry {
        time: time.to_string(),
        title: title.to_string(),
        description: Some(description.to_string()),
    })
    .collect()
}
