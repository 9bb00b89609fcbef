//! TaskStore - SQLite persistence for TaskAgent
//!
//! Stores three record types in a single SQLite database:
//!
//! - [`Task`] - a unit of work with an estimated duration and optional completion time
//! - [`Step`] - an ordered, checkable piece of a task
//! - [`Achievement`] - one aggregate row per calendar day, unique by day key
//!
//! All timestamps are Unix milliseconds. Day-level aggregation is exposed through
//! [`Store::rollup_day`], which re-reads the day's completed tasks and upserts the
//! achievement row inside one immediate transaction.

mod error;
mod records;
mod store;

pub use error::{StoreError, StoreResult};
pub use records::{
    Achievement, AchievementDraft, CONTENT_MAX_CHARS, DELIVERABLE_MAX_CHARS, LABEL_MAX_CHARS, NewStep, Step,
    StepPatch, TITLE_MAX_CHARS, Task, TaskWithSteps, new_id, now_ms, truncate_chars,
};
pub use store::{DB_FILE_NAME, Store};
