//! TaskAgent - personal task tracker
//!
//! Tasks are broken into classified, time-estimated steps by a text-generation
//! service (with a fixed fallback plan when it is unreachable). Completed tasks
//! are summarized and rolled up into one achievement record per UTC day.

pub mod cli;
pub mod config;
pub mod domain;
pub mod events;
pub mod llm;
pub mod planning;
pub mod prompts;
pub mod rollup;
pub mod server;
pub mod service;
pub mod state;

pub use config::Config;
pub use domain::{DayKey, DayKeyError};
pub use events::{ListenerHub, NotificationSink, NullSink, TaskEvent};
pub use service::{TaskCompletion, TaskService};
