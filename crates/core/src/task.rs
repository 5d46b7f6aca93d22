//! Task payload attached to a note.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::editor::FormFields;

/// Maximum length of a task summary.
pub const MAX_SUMMARY_LENGTH: usize = 255;

/// Maximum length of a task description.
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    ToDo,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// GraphQL enum value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToDo => "TO_DO",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable fields of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskFields {
    // Literal mirrors MAX_SUMMARY_LENGTH (validator requires a u64 literal here).
    #[validate(length(min = 1, max = 255, message = "Summary is required"))]
    pub summary: String,
    #[serde(default)]
    // Literal mirrors MAX_DESCRIPTION_LENGTH (validator requires a u64 literal here).
    #[validate(length(max = 10_000, message = "Description is too long"))]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// Outreach team the task is assigned to, if any.
    #[serde(default)]
    pub team: Option<String>,
}

impl FormFields for TaskFields {
    const KNOWN_FIELDS: &'static [&'static str] = &["summary", "description", "status", "team"];
}
