//! Domain types for TaskAgent
//!
//! Records live in `taskstore`; this module adds the validated day key and ID
//! normalization used at the service boundary.

mod day;
mod id;

pub use day::{DAY_KEY_FORMAT, DayKey, DayKeyError};
pub use id::canonical_id;
pub use taskstore::{Achievement, NewStep, Step, StepPatch, Task, TaskWithSteps};
