//! StateManager - actor that owns the task store
//!
//! Processes commands via channels for thread-safe access to persistent state.
//! Daily rollups run inside the actor, so two rollups for the same day never
//! interleave within a process; the store's immediate transaction covers other
//! processes sharing the database file.

use std::path::Path;
use std::sync::Arc;

use taskstore::{Achievement, NewStep, Step, StepPatch, Store, Task, TaskWithSteps};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::messages::{StateCommand, StateError, StateResponse};
use crate::domain::DayKey;
use crate::prompts::PromptLoader;
use crate::rollup::{aggregate, render_daily_report};

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
}

impl StateManager {
    /// Open the store in `store_dir` and spawn the actor
    pub fn spawn(store_dir: impl AsRef<Path>, prompts: Arc<PromptLoader>) -> eyre::Result<Self> {
        debug!(store_dir = %store_dir.as_ref().display(), "spawn: called");
        let store = Store::open(store_dir.as_ref())?;

        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(actor_loop(store, prompts, rx));

        info!("StateManager spawned");
        Ok(Self { tx })
    }

    /// Send a command and wait for its reply
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<StateResponse<T>>) -> StateCommand) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    // === Task operations ===

    /// Persist a task and its ordered steps in one transaction
    pub async fn create_task(&self, task: Task, steps: Vec<NewStep>) -> StateResponse<TaskWithSteps> {
        debug!(task_id = %task.id, step_count = steps.len(), "create_task: called");
        self.request(|reply| StateCommand::CreateTask { task, steps, reply })
            .await
    }

    /// Get a task with its steps
    pub async fn get_task(&self, id: &str) -> StateResponse<Option<TaskWithSteps>> {
        debug!(%id, "get_task: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::GetTask { id, reply }).await
    }

    /// Incomplete tasks, newest first
    pub async fn list_incomplete_tasks(&self) -> StateResponse<Vec<TaskWithSteps>> {
        debug!("list_incomplete_tasks: called");
        self.request(|reply| StateCommand::ListIncompleteTasks { reply })
            .await
    }

    /// Replace a task's title
    pub async fn update_task_title(&self, id: &str, title: &str) -> StateResponse<Option<TaskWithSteps>> {
        debug!(%id, %title, "update_task_title: called");
        let (id, title) = (id.to_string(), title.to_string());
        self.request(|reply| StateCommand::UpdateTaskTitle { id, title, reply })
            .await
    }

    /// Mark a task complete; an already completed task keeps its first timestamp
    pub async fn complete_task(&self, id: &str, completed_at: i64) -> StateResponse<Option<TaskWithSteps>> {
        debug!(%id, %completed_at, "complete_task: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::CompleteTask {
            id,
            completed_at,
            reply,
        })
        .await
    }

    // === Step operations ===

    /// Apply a partial update to a step
    pub async fn update_step(&self, id: &str, patch: StepPatch) -> StateResponse<Option<Step>> {
        debug!(%id, ?patch, "update_step: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::UpdateStep { id, patch, reply })
            .await
    }

    // === Rollup operations ===

    /// Cached report for the day if one is stored, otherwise computed on the fly
    ///
    /// Never writes.
    pub async fn daily_report(&self, day: DayKey) -> StateResponse<String> {
        debug!(%day, "daily_report: called");
        self.request(|reply| StateCommand::DailyReport { day, reply }).await
    }

    /// Recompute the day's figures and report and store them
    pub async fn upsert_achievement(&self, day: DayKey) -> StateResponse<Achievement> {
        debug!(%day, "upsert_achievement: called");
        self.request(|reply| StateCommand::UpsertAchievement { day, reply })
            .await
    }

    // === Achievement queries ===

    /// Achievements by day, newest first
    pub async fn list_achievements(&self, limit: u32, offset: u32) -> StateResponse<Vec<Achievement>> {
        debug!(%limit, %offset, "list_achievements: called");
        self.request(|reply| StateCommand::ListAchievements { limit, offset, reply })
            .await
    }

    pub async fn get_achievement(&self, id: &str) -> StateResponse<Option<Achievement>> {
        debug!(%id, "get_achievement: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::GetAchievement { id, reply })
            .await
    }

    /// Shutdown the StateManager
    pub async fn shutdown(&self) -> Result<(), StateError> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)
    }
}

/// Report for `day`: stored text when an achievement exists, else rendered fresh
fn daily_report(store: &Store, prompts: &PromptLoader, day: DayKey) -> StateResponse<String> {
    if let Some(achievement) = store.get_achievement_by_day(&day.as_string())? {
        debug!(%day, "daily_report: cache hit");
        return Ok(achievement.summary_md);
    }

    let (start, end) = day.bounds();
    let tasks = store.completed_between(start, end)?;
    debug!(%day, task_count = tasks.len(), "daily_report: computing");
    render_daily_report(prompts, &aggregate(day, &tasks)).map_err(|e| StateError::Report(e.to_string()))
}

/// Unconditional recompute and upsert of the day's achievement
fn upsert_achievement(store: &mut Store, prompts: &PromptLoader, day: DayKey) -> StateResponse<Achievement> {
    let (start, end) = day.bounds();
    let achievement = store.rollup_day(&day.as_string(), start, end, |tasks| {
        let daily = aggregate(day, tasks);
        let report = render_daily_report(prompts, &daily)?;
        Ok::<_, eyre::Report>(daily.into_draft(report))
    })?;
    info!(
        %day,
        task_count = achievement.task_count,
        step_count = achievement.step_count,
        consumed_minutes = achievement.consumed_minutes,
        "upsert_achievement: stored"
    );
    Ok(achievement)
}

/// Load the updated task with its steps after a task-level write
fn reload(store: &Store, task: Option<Task>) -> StateResponse<Option<TaskWithSteps>> {
    match task {
        Some(task) => Ok(store.get_task_with_steps(&task.id)?),
        None => Ok(None),
    }
}

async fn actor_loop(mut store: Store, prompts: Arc<PromptLoader>, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("actor_loop: called");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::CreateTask { task, steps, reply } => {
                debug!(task_id = %task.id, "actor_loop: CreateTask command");
                let result = store.create_task(&task, &steps).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::GetTask { id, reply } => {
                debug!(%id, "actor_loop: GetTask command");
                let result = store.get_task_with_steps(&id).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::ListIncompleteTasks { reply } => {
                debug!("actor_loop: ListIncompleteTasks command");
                let result = store.list_tasks(true).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::UpdateTaskTitle { id, title, reply } => {
                debug!(%id, "actor_loop: UpdateTaskTitle command");
                let result = store
                    .update_task_title(&id, &title)
                    .map_err(StateError::from)
                    .and_then(|task| reload(&store, task));
                let _ = reply.send(result);
            }

            StateCommand::CompleteTask {
                id,
                completed_at,
                reply,
            } => {
                debug!(%id, "actor_loop: CompleteTask command");
                let result = store
                    .complete_task(&id, completed_at)
                    .map_err(StateError::from)
                    .and_then(|task| reload(&store, task));
                let _ = reply.send(result);
            }

            StateCommand::UpdateStep { id, patch, reply } => {
                debug!(%id, "actor_loop: UpdateStep command");
                let result = store.update_step(&id, &patch).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::DailyReport { day, reply } => {
                debug!(%day, "actor_loop: DailyReport command");
                let _ = reply.send(daily_report(&store, &prompts, day));
            }

            StateCommand::UpsertAchievement { day, reply } => {
                debug!(%day, "actor_loop: UpsertAchievement command");
                let _ = reply.send(upsert_achievement(&mut store, &prompts, day));
            }

            StateCommand::ListAchievements { limit, offset, reply } => {
                debug!(%limit, %offset, "actor_loop: ListAchievements command");
                let result = store.list_achievements(limit, offset).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::GetAchievement { id, reply } => {
                debug!(%id, "actor_loop: GetAchievement command");
                let result = store.get_achievement(&id).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("StateManager shutting down");
                break;
            }
        }
    }

    debug!("StateManager actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollup::NO_TASKS_MESSAGE;
    use tempfile::tempdir;

    fn spawn(dir: &Path) -> StateManager {
        StateManager::spawn(dir, Arc::new(PromptLoader::embedded_only())).unwrap()
    }

    fn steps(minutes: &[u32]) -> Vec<NewStep> {
        minutes
            .iter()
            .enumerate()
            .map(|(i, m)| NewStep {
                content: format!("step {}", i + 1),
                tool: None,
                theme: None,
                deliverable: None,
                estimate_minutes: *m,
            })
            .collect()
    }

    async fn create(manager: &StateManager, title: &str, minutes: &[u32]) -> TaskWithSteps {
        let mut task = Task::new(title);
        task.estimated_minutes = minutes.iter().sum();
        manager.create_task(task, steps(minutes)).await.unwrap()
    }

    async fn mark_done(manager: &StateManager, task: &TaskWithSteps, count: usize) {
        for step in task.steps.iter().take(count) {
            let patch = StepPatch {
                done: Some(true),
                content: None,
            };
            manager.update_step(&step.id, patch).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_task_crud() {
        let temp = tempdir().unwrap();
        let manager = spawn(temp.path());

        let created = create(&manager, "Paint fence", &[10, 20]).await;
        assert_eq!(created.steps.len(), 2);

        let fetched = manager.get_task(&created.task.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let renamed = manager
            .update_task_title(&created.task.id, "Paint the fence")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.task.title, "Paint the fence");
        assert_eq!(renamed.steps.len(), 2);

        assert_eq!(manager.list_incomplete_tasks().await.unwrap().len(), 1);
        manager.complete_task(&created.task.id, 1_000).await.unwrap().unwrap();
        assert!(manager.list_incomplete_tasks().await.unwrap().is_empty());

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_records_are_none() {
        let temp = tempdir().unwrap();
        let manager = spawn(temp.path());

        assert!(manager.get_task("nope").await.unwrap().is_none());
        assert!(manager.update_task_title("nope", "x").await.unwrap().is_none());
        assert!(manager.complete_task("nope", 1).await.unwrap().is_none());
        assert!(manager.update_step("nope", StepPatch::default()).await.unwrap().is_none());
        assert!(manager.get_achievement("nope").await.unwrap().is_none());

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_report_read_creates_no_row() {
        let temp = tempdir().unwrap();
        let manager = spawn(temp.path());
        let day = DayKey::parse("2024-03-09").unwrap();

        let report = manager.daily_report(day).await.unwrap();
        assert!(report.contains(NO_TASKS_MESSAGE));
        assert!(manager.list_achievements(10, 0).await.unwrap().is_empty());

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_rollup_of_two_tasks() {
        let temp = tempdir().unwrap();
        let manager = spawn(temp.path());
        let day = DayKey::parse("2024-03-09").unwrap();
        let (start, end) = day.bounds();

        let first = create(&manager, "Three of five", &[6, 6, 6, 6, 6]).await;
        mark_done(&manager, &first, 3).await;
        manager.complete_task(&first.task.id, start + 60_000).await.unwrap();

        let second = create(&manager, "Two of two", &[10, 10]).await;
        mark_done(&manager, &second, 2).await;
        manager.complete_task(&second.task.id, end).await.unwrap();

        let achievement = manager.upsert_achievement(day).await.unwrap();
        assert_eq!(achievement.day_key, "2024-03-09");
        assert_eq!(achievement.task_count, 2);
        assert_eq!(achievement.step_count, 5);
        assert_eq!(achievement.consumed_minutes, 50);

        // cached text is served verbatim
        assert_eq!(manager.daily_report(day).await.unwrap(), achievement.summary_md);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_keeps_one_row() {
        let temp = tempdir().unwrap();
        let manager = spawn(temp.path());
        let day = DayKey::parse("2024-03-09").unwrap();
        let (start, _) = day.bounds();

        let task = create(&manager, "Once", &[15]).await;
        manager.complete_task(&task.task.id, start).await.unwrap();

        let first = manager.upsert_achievement(day).await.unwrap();
        let second = manager.upsert_achievement(day).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(manager.list_achievements(10, 0).await.unwrap().len(), 1);
        assert_eq!(manager.get_achievement(&first.id).await.unwrap(), Some(first));

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_recomputes_instead_of_accumulating() {
        let temp = tempdir().unwrap();
        let manager = spawn(temp.path());
        let day = DayKey::parse("2024-03-09").unwrap();
        let (start, _) = day.bounds();

        let a = create(&manager, "A", &[10]).await;
        manager.complete_task(&a.task.id, start).await.unwrap();
        let first = manager.upsert_achievement(day).await.unwrap();
        assert_eq!(first.task_count, 1);

        let b = create(&manager, "B", &[20]).await;
        manager.complete_task(&b.task.id, start + 1).await.unwrap();
        let second = manager.upsert_achievement(day).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.task_count, 2);
        assert_eq!(second.consumed_minutes, 30);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_rollups_for_one_day() {
        let temp = tempdir().unwrap();
        let manager = spawn(temp.path());
        let day = DayKey::parse("2024-03-09").unwrap();
        let (start, _) = day.bounds();

        for i in 0..5 {
            let task = create(&manager, &format!("task {}", i), &[10]).await;
            manager.complete_task(&task.task.id, start + i).await.unwrap();
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.upsert_achievement(day).await.unwrap() })
            })
            .collect();
        for handle in handles {
            let achievement = handle.await.unwrap();
            assert_eq!(achievement.task_count, 5);
            assert_eq!(achievement.consumed_minutes, 50);
        }
        assert_eq!(manager.list_achievements(10, 0).await.unwrap().len(), 1);

        manager.shutdown().await.unwrap();
    }
}
