//! Record types persisted by the store

use serde::{Deserialize, Serialize};

/// Maximum characters kept in a task title
pub const TITLE_MAX_CHARS: usize = 255;

/// Maximum characters kept in a step's content
pub const CONTENT_MAX_CHARS: usize = 500;

/// Maximum characters kept in a step's tool or theme label
pub const LABEL_MAX_CHARS: usize = 100;

/// Maximum characters kept in a step's deliverable label
pub const DELIVERABLE_MAX_CHARS: usize = 255;

/// Current time in Unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a new record ID (hyphenated UUIDv7)
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Truncate to at most `max` characters, never splitting a character
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// A task created by the user and decomposed into steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// Sum of the estimates of this task's steps
    pub estimated_minutes: u32,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Completion timestamp (Unix milliseconds), absent while incomplete
    pub completed_at: Option<i64>,
}

impl Task {
    /// Create a new incomplete task with a generated ID
    pub fn new(title: impl AsRef<str>) -> Self {
        Self {
            id: new_id(),
            title: truncate_chars(title.as_ref(), TITLE_MAX_CHARS),
            estimated_minutes: 0,
            created_at: now_ms(),
            completed_at: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// One ordered step of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub task_id: String,
    pub content: String,
    pub tool: Option<String>,
    pub theme: Option<String>,
    pub deliverable: Option<String>,
    pub estimate_minutes: u32,
    pub done: bool,
    /// Zero-based position within the task
    pub order_idx: u32,
}

/// A step about to be inserted; position is assigned by the batch order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStep {
    pub content: String,
    pub tool: Option<String>,
    pub theme: Option<String>,
    pub deliverable: Option<String>,
    pub estimate_minutes: u32,
}

/// Partial update of a step; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPatch {
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub content: Option<String>,
}

impl StepPatch {
    pub fn is_empty(&self) -> bool {
        self.done.is_none() && self.content.is_none()
    }
}

/// A task together with its steps in `order_idx` order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWithSteps {
    #[serde(flatten)]
    pub task: Task,
    pub steps: Vec<Step>,
}

impl TaskWithSteps {
    /// Number of steps marked done
    pub fn completed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.done).count()
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }
}

/// Aggregate of one calendar day's completed tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,

    /// Calendar day, `YYYY-MM-DD`
    #[serde(rename = "date_key")]
    pub day_key: String,

    /// Tasks completed that day
    pub task_count: u32,

    /// Completed steps across those tasks
    pub step_count: u32,

    /// Sum of the completed tasks' estimated minutes
    pub consumed_minutes: u32,

    /// Rendered markdown report
    pub summary_md: String,
}

/// Freshly computed fields of an achievement, written by [`crate::Store::rollup_day`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AchievementDraft {
    pub task_count: u32,
    pub step_count: u32,
    pub consumed_minutes: u32,
    pub summary_md: String,
}
