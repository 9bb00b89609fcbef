//! SQLite-backed store for tasks, steps and achievements

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::records::{
    Achievement, AchievementDraft, CONTENT_MAX_CHARS, DELIVERABLE_MAX_CHARS, LABEL_MAX_CHARS, NewStep, Step,
    StepPatch, TITLE_MAX_CHARS, Task, TaskWithSteps, new_id, truncate_chars,
};

/// Database file name inside the store directory
pub const DB_FILE_NAME: &str = "taskagent.db";

const TASK_COLUMNS: &str = "id, title, estimated_minutes, created_at, completed_at";
const STEP_COLUMNS: &str = "id, task_id, content, tool, theme, deliverable, estimate_minutes, done, order_idx";
const ACHIEVEMENT_COLUMNS: &str = "id, day_key, task_count, step_count, consumed_minutes, summary_md";

/// Persistent store; one SQLite connection owned by the caller
pub struct Store {
    conn: Connection,
    db_path: PathBuf,
}

impl Store {
    /// Open (or create) the store inside `dir`
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        debug!(dir = %dir.display(), "Store::open: called");
        std::fs::create_dir_all(dir)?;
        let db_path = dir.join(DB_FILE_NAME);

        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            "#,
        )?;

        let store = Self { conn, db_path };
        store.initialize_schema()?;
        info!(db_path = %store.db_path.display(), "Store opened");
        Ok(store)
    }

    /// Path of the underlying database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn initialize_schema(&self) -> StoreResult<()> {
        debug!("initialize_schema: called");
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                estimated_minutes INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                completed_at INTEGER NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_completed_at ON tasks (completed_at);

            CREATE TABLE IF NOT EXISTS steps (
                id TEXT PRIMARY KEY,
                task_id TEXT NOT NULL,
                content TEXT NOT NULL,
                tool TEXT NULL,
                theme TEXT NULL,
                deliverable TEXT NULL,
                estimate_minutes INTEGER NOT NULL DEFAULT 0,
                done INTEGER NOT NULL DEFAULT 0,
                order_idx INTEGER NOT NULL,
                FOREIGN KEY(task_id) REFERENCES tasks(id),
                UNIQUE(task_id, order_idx)
            );

            CREATE TABLE IF NOT EXISTS achievements (
                id TEXT PRIMARY KEY,
                day_key TEXT NOT NULL UNIQUE,
                task_count INTEGER NOT NULL DEFAULT 0,
                step_count INTEGER NOT NULL DEFAULT 0,
                consumed_minutes INTEGER NOT NULL DEFAULT 0,
                summary_md TEXT NOT NULL DEFAULT ''
            );
            "#,
        )?;
        Ok(())
    }

    // === Tasks ===

    /// Insert a task and its ordered batch of steps in one transaction
    ///
    /// Steps receive `order_idx` 0..n in slice order. The task's
    /// `estimated_minutes` is stored as given.
    pub fn create_task(&mut self, task: &Task, steps: &[NewStep]) -> StoreResult<TaskWithSteps> {
        debug!(task_id = %task.id, step_count = steps.len(), "create_task: called");
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO tasks (id, title, estimated_minutes, created_at, completed_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                task.id,
                truncate_chars(&task.title, TITLE_MAX_CHARS),
                task.estimated_minutes,
                task.created_at,
                task.completed_at,
            ],
        )?;

        let mut created = Vec::with_capacity(steps.len());
        for (idx, new_step) in steps.iter().enumerate() {
            let step = Step {
                id: new_id(),
                task_id: task.id.clone(),
                content: truncate_chars(&new_step.content, CONTENT_MAX_CHARS),
                tool: new_step.tool.as_deref().map(|t| truncate_chars(t, LABEL_MAX_CHARS)),
                theme: new_step.theme.as_deref().map(|t| truncate_chars(t, LABEL_MAX_CHARS)),
                deliverable: new_step
                    .deliverable
                    .as_deref()
                    .map(|d| truncate_chars(d, DELIVERABLE_MAX_CHARS)),
                estimate_minutes: new_step.estimate_minutes,
                done: false,
                order_idx: idx as u32,
            };
            tx.execute(
                &format!("INSERT INTO steps ({STEP_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                params![
                    step.id,
                    step.task_id,
                    step.content,
                    step.tool,
                    step.theme,
                    step.deliverable,
                    step.estimate_minutes,
                    step.done,
                    step.order_idx,
                ],
            )?;
            created.push(step);
        }

        let stored = load_task(&tx, &task.id)?
            .ok_or_else(|| StoreError::Corrupt(format!("task {} missing after insert", task.id)))?;
        tx.commit()?;

        Ok(TaskWithSteps {
            task: stored,
            steps: created,
        })
    }

    /// Get a task by ID
    pub fn get_task(&self, id: &str) -> StoreResult<Option<Task>> {
        debug!(%id, "get_task: called");
        load_task(&self.conn, id)
    }

    /// Get a task with its ordered steps
    pub fn get_task_with_steps(&self, id: &str) -> StoreResult<Option<TaskWithSteps>> {
        debug!(%id, "get_task_with_steps: called");
        match load_task(&self.conn, id)? {
            Some(task) => {
                let steps = load_steps(&self.conn, &task.id)?;
                Ok(Some(TaskWithSteps { task, steps }))
            }
            None => Ok(None),
        }
    }

    /// List tasks newest first; `incomplete_only` hides completed tasks
    pub fn list_tasks(&self, incomplete_only: bool) -> StoreResult<Vec<TaskWithSteps>> {
        debug!(%incomplete_only, "list_tasks: called");
        let sql = if incomplete_only {
            format!("SELECT {TASK_COLUMNS} FROM tasks WHERE completed_at IS NULL ORDER BY created_at DESC, id DESC")
        } else {
            format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, id DESC")
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map([], task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        attach_steps(&self.conn, tasks)
    }

    /// Replace a task's title; `None` if the task does not exist
    pub fn update_task_title(&mut self, id: &str, title: &str) -> StoreResult<Option<Task>> {
        debug!(%id, "update_task_title: called");
        let changed = self.conn.execute(
            "UPDATE tasks SET title = ?1 WHERE id = ?2",
            params![truncate_chars(title, TITLE_MAX_CHARS), id],
        )?;
        if changed == 0 {
            debug!(%id, "update_task_title: no such task");
            return Ok(None);
        }
        load_task(&self.conn, id)
    }

    /// Stamp a task's completion time
    ///
    /// A task that is already complete keeps its original timestamp.
    pub fn complete_task(&mut self, id: &str, completed_at: i64) -> StoreResult<Option<Task>> {
        debug!(%id, %completed_at, "complete_task: called");
        let changed = self.conn.execute(
            "UPDATE tasks SET completed_at = ?1 WHERE id = ?2 AND completed_at IS NULL",
            params![completed_at, id],
        )?;
        if changed == 0 {
            debug!(%id, "complete_task: already complete or missing");
        }
        load_task(&self.conn, id)
    }

    // === Steps ===

    /// Get a step by ID
    pub fn get_step(&self, id: &str) -> StoreResult<Option<Step>> {
        debug!(%id, "get_step: called");
        load_step(&self.conn, id)
    }

    /// Apply a partial update to a step; `None` if the step does not exist
    pub fn update_step(&mut self, id: &str, patch: &StepPatch) -> StoreResult<Option<Step>> {
        debug!(%id, ?patch, "update_step: called");
        let tx = self.conn.transaction()?;
        if load_step(&tx, id)?.is_none() {
            debug!(%id, "update_step: no such step");
            return Ok(None);
        }
        if let Some(done) = patch.done {
            tx.execute("UPDATE steps SET done = ?1 WHERE id = ?2", params![done, id])?;
        }
        if let Some(content) = &patch.content {
            tx.execute(
                "UPDATE steps SET content = ?1 WHERE id = ?2",
                params![truncate_chars(content, CONTENT_MAX_CHARS), id],
            )?;
        }
        let step = load_step(&tx, id)?;
        tx.commit()?;
        Ok(step)
    }

    // === Achievements ===

    /// Tasks completed within `[start_ms, end_ms]` (inclusive both ends)
    ///
    /// Ordered by completion time, then ID.
    pub fn completed_between(&self, start_ms: i64, end_ms: i64) -> StoreResult<Vec<TaskWithSteps>> {
        debug!(%start_ms, %end_ms, "completed_between: called");
        load_completed_between(&self.conn, start_ms, end_ms)
    }

    /// Get the achievement for a day key
    pub fn get_achievement_by_day(&self, day_key: &str) -> StoreResult<Option<Achievement>> {
        debug!(%day_key, "get_achievement_by_day: called");
        load_achievement_by_day(&self.conn, day_key)
    }

    /// Get an achievement by ID
    pub fn get_achievement(&self, id: &str) -> StoreResult<Option<Achievement>> {
        debug!(%id, "get_achievement: called");
        let achievement = self
            .conn
            .query_row(
                &format!("SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE id = ?1"),
                params![id],
                achievement_from_row,
            )
            .optional()?;
        Ok(achievement)
    }

    /// Achievements ordered by day key, newest first
    pub fn list_achievements(&self, limit: u32, offset: u32) -> StoreResult<Vec<Achievement>> {
        debug!(%limit, %offset, "list_achievements: called");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements ORDER BY day_key DESC LIMIT ?1 OFFSET ?2"
        ))?;
        let achievements = stmt
            .query_map(params![limit, offset], achievement_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(achievements)
    }

    /// Recompute and upsert one day's achievement atomically
    ///
    /// Inside a single immediate transaction this re-reads every task completed
    /// within `[start_ms, end_ms]`, hands them to `compute`, and writes the result
    /// keyed by `day_key`: an existing row is overwritten in place (keeping its ID),
    /// otherwise a new row is inserted. A `compute` error rolls the transaction back.
    pub fn rollup_day<F, E>(&mut self, day_key: &str, start_ms: i64, end_ms: i64, compute: F) -> StoreResult<Achievement>
    where
        F: FnOnce(&[TaskWithSteps]) -> Result<AchievementDraft, E>,
        E: std::fmt::Display,
    {
        debug!(%day_key, %start_ms, %end_ms, "rollup_day: called");
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let tasks = load_completed_between(&tx, start_ms, end_ms)?;
        let draft = compute(&tasks).map_err(|e| StoreError::Rollup(e.to_string()))?;
        debug!(
            %day_key,
            task_count = draft.task_count,
            step_count = draft.step_count,
            consumed_minutes = draft.consumed_minutes,
            "rollup_day: computed"
        );

        tx.execute(
            r#"
            INSERT INTO achievements (id, day_key, task_count, step_count, consumed_minutes, summary_md)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(day_key) DO UPDATE SET
                task_count = excluded.task_count,
                step_count = excluded.step_count,
                consumed_minutes = excluded.consumed_minutes,
                summary_md = excluded.summary_md
            "#,
            params![
                new_id(),
                day_key,
                draft.task_count,
                draft.step_count,
                draft.consumed_minutes,
                draft.summary_md,
            ],
        )?;

        let achievement = load_achievement_by_day(&tx, day_key)?
            .ok_or_else(|| StoreError::Corrupt(format!("achievement {} missing after upsert", day_key)))?;
        tx.commit()?;
        Ok(achievement)
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        estimated_minutes: row.get(2)?,
        created_at: row.get(3)?,
        completed_at: row.get(4)?,
    })
}

fn step_from_row(row: &Row<'_>) -> rusqlite::Result<Step> {
    Ok(Step {
        id: row.get(0)?,
        task_id: row.get(1)?,
        content: row.get(2)?,
        tool: row.get(3)?,
        theme: row.get(4)?,
        deliverable: row.get(5)?,
        estimate_minutes: row.get(6)?,
        done: row.get(7)?,
        order_idx: row.get(8)?,
    })
}

fn achievement_from_row(row: &Row<'_>) -> rusqlite::Result<Achievement> {
    Ok(Achievement {
        id: row.get(0)?,
        day_key: row.get(1)?,
        task_count: row.get(2)?,
        step_count: row.get(3)?,
        consumed_minutes: row.get(4)?,
        summary_md: row.get(5)?,
    })
}

fn load_task(conn: &Connection, id: &str) -> StoreResult<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            params![id],
            task_from_row,
        )
        .optional()?;
    Ok(task)
}

fn load_step(conn: &Connection, id: &str) -> StoreResult<Option<Step>> {
    let step = conn
        .query_row(
            &format!("SELECT {STEP_COLUMNS} FROM steps WHERE id = ?1"),
            params![id],
            step_from_row,
        )
        .optional()?;
    Ok(step)
}

fn load_steps(conn: &Connection, task_id: &str) -> StoreResult<Vec<Step>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STEP_COLUMNS} FROM steps WHERE task_id = ?1 ORDER BY order_idx"
    ))?;
    let steps = stmt
        .query_map(params![task_id], step_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(steps)
}

fn attach_steps(conn: &Connection, tasks: Vec<Task>) -> StoreResult<Vec<TaskWithSteps>> {
    tasks
        .into_iter()
        .map(|task| {
            let steps = load_steps(conn, &task.id)?;
            Ok(TaskWithSteps { task, steps })
        })
        .collect()
}

fn load_completed_between(conn: &Connection, start_ms: i64, end_ms: i64) -> StoreResult<Vec<TaskWithSteps>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks \
         WHERE completed_at IS NOT NULL AND completed_at >= ?1 AND completed_at <= ?2 \
         ORDER BY completed_at, id"
    ))?;
    let tasks = stmt
        .query_map(params![start_ms, end_ms], task_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    attach_steps(conn, tasks)
}

fn load_achievement_by_day(conn: &Connection, day_key: &str) -> StoreResult<Option<Achievement>> {
    let achievement = conn
        .query_row(
            &format!("SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE day_key = ?1"),
            params![day_key],
            achievement_from_row,
        )
        .optional()?;
    Ok(achievement)
}
