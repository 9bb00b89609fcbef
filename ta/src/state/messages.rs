//! State manager messages
//!
//! Commands and responses for the actor pattern.

use taskstore::{Achievement, NewStep, Step, StepPatch, Task, TaskWithSteps};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::DayKey;

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Report rendering failed: {0}")]
    Report(String),

    #[error("Channel error")]
    ChannelError,
}

impl From<taskstore::StoreError> for StateError {
    fn from(e: taskstore::StoreError) -> Self {
        StateError::StoreError(e.to_string())
    }
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    // Task operations
    CreateTask {
        task: Task,
        steps: Vec<NewStep>,
        reply: oneshot::Sender<StateResponse<TaskWithSteps>>,
    },
    GetTask {
        id: String,
        reply: oneshot::Sender<StateResponse<Option<TaskWithSteps>>>,
    },
    ListIncompleteTasks {
        reply: oneshot::Sender<StateResponse<Vec<TaskWithSteps>>>,
    },
    UpdateTaskTitle {
        id: String,
        title: String,
        reply: oneshot::Sender<StateResponse<Option<TaskWithSteps>>>,
    },
    CompleteTask {
        id: String,
        completed_at: i64,
        reply: oneshot::Sender<StateResponse<Option<TaskWithSteps>>>,
    },

    // Step operations
    UpdateStep {
        id: String,
        patch: StepPatch,
        reply: oneshot::Sender<StateResponse<Option<Step>>>,
    },

    // Rollup operations
    DailyReport {
        day: DayKey,
        reply: oneshot::Sender<StateResponse<String>>,
    },
    UpsertAchievement {
        day: DayKey,
        reply: oneshot::Sender<StateResponse<Achievement>>,
    },

    // Achievement queries
    ListAchievements {
        limit: u32,
        offset: u32,
        reply: oneshot::Sender<StateResponse<Vec<Achievement>>>,
    },
    GetAchievement {
        id: String,
        reply: oneshot::Sender<StateResponse<Option<Achievement>>>,
    },

    // Shutdown
    Shutdown,
}
