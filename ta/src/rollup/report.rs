//! Markdown rendering for daily reports and task completion summaries
//!
//! Always uses the embedded templates so stored text does not depend on local
//! overrides.

use chrono::DateTime;
use eyre::Result;
use serde::Serialize;
use taskstore::TaskWithSteps;

use super::DailyAggregate;
use crate::prompts::PromptLoader;

/// Line shown for a day without completed tasks
pub const NO_TASKS_MESSAGE: &str = "No tasks completed yet today.";

/// Format of the completion time in task summaries (UTC)
const COMPLETED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Serialize)]
struct TaskSummaryContext<'a> {
    title: &'a str,
    completed_at: String,
    total_steps: usize,
    completed_steps: usize,
    done_steps: Vec<&'a str>,
    estimated_minutes: u32,
}

/// Render the markdown report for an aggregated day
pub fn render_daily_report(prompts: &PromptLoader, aggregate: &DailyAggregate) -> Result<String> {
    let template = if aggregate.is_empty() { "daily-empty" } else { "daily-report" };
    prompts.render_embedded(template, aggregate)
}

/// Render the completion summary of one task
pub fn render_task_summary(prompts: &PromptLoader, task: &TaskWithSteps) -> Result<String> {
    let completed_at = task
        .task
        .completed_at
        .and_then(DateTime::from_timestamp_millis)
        .map(|at| at.format(COMPLETED_AT_FORMAT).to_string())
        .unwrap_or_else(|| "not completed".to_string());

    let context = TaskSummaryContext {
        title: &task.task.title,
        completed_at,
        total_steps: task.total_steps(),
        completed_steps: task.completed_steps(),
        done_steps: task.steps.iter().filter(|s| s.done).map(|s| s.content.as_str()).collect(),
        estimated_minutes: task.task.estimated_minutes,
    };
    prompts.render_embedded("task-summary", &context)
}
