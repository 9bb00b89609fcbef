//! TaskService - the operations exposed by the CLI and the HTTP server
//!
//! Creation runs the decomposer before anything is persisted. Completion runs
//! the whole chain: stamp the task, render its summary, roll up its day, then
//! notify listeners.

use std::sync::Arc;

use eyre::{Result, bail};
use serde::Serialize;
use taskstore::{Achievement, NewStep, Step, StepPatch, Task, TaskWithSteps, now_ms};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{DayKey, canonical_id};
use crate::events::{NotificationSink, TaskEvent};
use crate::llm::{LlmClient, ScriptedLlmClient, create_client};
use crate::planning::{Decomposer, total_minutes};
use crate::prompts::PromptLoader;
use crate::rollup::render_task_summary;
use crate::state::StateManager;

/// Largest page size for achievement listings
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Outcome of completing a task
#[derive(Debug, Clone, Serialize)]
pub struct TaskCompletion {
    pub task: TaskWithSteps,
    /// Markdown completion summary
    pub summary: String,
    /// The completion day's refreshed achievement
    pub achievement: Achievement,
}

pub struct TaskService {
    state: StateManager,
    decomposer: Decomposer,
    prompts: Arc<PromptLoader>,
    sink: Arc<dyn NotificationSink>,
}

impl TaskService {
    pub fn new(
        state: StateManager,
        decomposer: Decomposer,
        prompts: Arc<PromptLoader>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            state,
            decomposer,
            prompts,
            sink,
        }
    }

    /// Wire a service from configuration
    ///
    /// When no text-generation client can be built, every task gets the
    /// fallback plan.
    pub fn from_config(config: &Config, sink: Arc<dyn NotificationSink>) -> Result<Self> {
        debug!("from_config: called");
        let prompts = Arc::new(PromptLoader::new(config.planning.prompts_dir.as_ref()));
        let llm: Arc<dyn LlmClient> = match create_client(&config.llm) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "from_config: LLM unavailable, decomposition will use the fallback plan");
                Arc::new(ScriptedLlmClient::offline())
            }
        };
        let state = StateManager::spawn(config.storage.expanded_dir(), prompts.clone())?;
        let decomposer = Decomposer::new(llm, prompts.clone(), config.planning.clone());
        Ok(Self::new(state, decomposer, prompts, sink))
    }

    /// Create a task from a title and decompose it into steps
    pub async fn create_task(&self, title: &str) -> Result<TaskWithSteps> {
        let title = title.trim();
        debug!(%title, "create_task: called");
        if title.is_empty() {
            bail!("task title must not be empty");
        }

        let drafts = self.decomposer.decompose(title).await;
        let mut task = Task::new(title);
        task.estimated_minutes = total_minutes(&drafts);
        let steps: Vec<NewStep> = drafts.into_iter().map(NewStep::from).collect();

        let created = self.state.create_task(task, steps).await?;
        info!(
            task_id = %created.task.id,
            step_count = created.steps.len(),
            estimated_minutes = created.task.estimated_minutes,
            "create_task: created"
        );
        Ok(created)
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<TaskWithSteps>> {
        debug!(%id, "get_task: called");
        let Some(id) = canonical_id(id) else {
            return Ok(None);
        };
        Ok(self.state.get_task(&id).await?)
    }

    /// Incomplete tasks, newest first
    pub async fn list_incomplete(&self) -> Result<Vec<TaskWithSteps>> {
        debug!("list_incomplete: called");
        Ok(self.state.list_incomplete_tasks().await?)
    }

    pub async fn update_title(&self, id: &str, title: &str) -> Result<Option<TaskWithSteps>> {
        debug!(%id, %title, "update_title: called");
        let title = title.trim();
        if title.is_empty() {
            bail!("task title must not be empty");
        }
        let Some(id) = canonical_id(id) else {
            return Ok(None);
        };
        Ok(self.state.update_task_title(&id, title).await?)
    }

    /// Update a step and tell listeners about it
    pub async fn update_step(&self, id: &str, patch: StepPatch) -> Result<Option<Step>> {
        debug!(%id, ?patch, "update_step: called");
        let Some(id) = canonical_id(id) else {
            return Ok(None);
        };
        let unchanged = patch.is_empty();
        let Some(step) = self.state.update_step(&id, patch).await? else {
            return Ok(None);
        };
        if unchanged {
            debug!(%id, "update_step: empty patch, nothing to announce");
            return Ok(Some(step));
        }

        self.sink.notify(TaskEvent::StepUpdate {
            task_id: step.task_id.clone(),
            step_id: step.id.clone(),
            done: step.done,
            timestamp: now_ms(),
        });
        Ok(Some(step))
    }

    /// Complete a task, summarize it, roll up its day and notify listeners
    ///
    /// Completing an already completed task keeps its original completion time
    /// and refreshes the same day.
    pub async fn complete_task(&self, id: &str) -> Result<Option<TaskCompletion>> {
        debug!(%id, "complete_task: called");
        let Some(id) = canonical_id(id) else {
            return Ok(None);
        };
        let Some(task) = self.state.complete_task(&id, now_ms()).await? else {
            return Ok(None);
        };

        let summary = render_task_summary(&self.prompts, &task)?;
        let completed_at = task.task.completed_at.unwrap_or_else(now_ms);
        let day = DayKey::from_timestamp_ms(completed_at);
        let achievement = self.state.upsert_achievement(day).await?;

        self.sink.notify(TaskEvent::TaskComplete {
            task_id: task.task.id.clone(),
            summary: summary.clone(),
            timestamp: completed_at,
        });
        info!(task_id = %task.task.id, %day, "complete_task: completed and rolled up");

        Ok(Some(TaskCompletion {
            task,
            summary,
            achievement,
        }))
    }

    /// Markdown report for a day: the stored one if present, else computed
    pub async fn daily_summary(&self, day: DayKey) -> Result<String> {
        debug!(%day, "daily_summary: called");
        Ok(self.state.daily_report(day).await?)
    }

    /// Recompute and store a day's achievement
    pub async fn rollup_day(&self, day: DayKey) -> Result<Achievement> {
        debug!(%day, "rollup_day: called");
        Ok(self.state.upsert_achievement(day).await?)
    }

    /// Achievements newest first; `page` starts at 1, `limit` is clamped to 1..=100
    pub async fn list_achievements(&self, page: u32, limit: u32) -> Result<Vec<Achievement>> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        debug!(%page, %limit, "list_achievements: called");
        let offset = (page - 1).saturating_mul(limit);
        Ok(self.state.list_achievements(limit, offset).await?)
    }

    pub async fn get_achievement(&self, id: &str) -> Result<Option<Achievement>> {
        debug!(%id, "get_achievement: called");
        let Some(id) = canonical_id(id) else {
            return Ok(None);
        };
        Ok(self.state.get_achievement(&id).await?)
    }

    pub async fn shutdown(&self) -> Result<()> {
        Ok(self.state.shutdown().await?)
    }
}
