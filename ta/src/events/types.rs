//! Progress events pushed to listeners

use serde::{Deserialize, Serialize};

/// A change listeners are told about
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    /// A step was checked or unchecked, or its content changed
    StepUpdate {
        task_id: String,
        step_id: String,
        done: bool,
        /// Unix milliseconds
        timestamp: i64,
    },
    /// A task was completed and rolled into its day
    TaskComplete {
        task_id: String,
        /// Markdown completion summary
        summary: String,
        /// Unix milliseconds
        timestamp: i64,
    },
}

impl TaskEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            TaskEvent::StepUpdate { .. } => "step_update",
            TaskEvent::TaskComplete { .. } => "task_complete",
        }
    }

    pub fn task_id(&self) -> &str {
        match self {
            TaskEvent::StepUpdate { task_id, .. } | TaskEvent::TaskComplete { task_id, .. } => task_id,
        }
    }
}
