//! Daily rollup
//!
//! Aggregation is a pure function of the tasks completed within a day;
//! rendering is a pure function of the aggregate. The state actor combines both
//! with the store's transactional upsert.

mod aggregate;
mod report;

pub use aggregate::{DailyAggregate, TaskLine, aggregate};
pub use report::{NO_TASKS_MESSAGE, render_daily_report, render_task_summary};
