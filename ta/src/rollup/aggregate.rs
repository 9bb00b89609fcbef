//! Pure aggregation of one day's completed tasks

use serde::Serialize;
use taskstore::{AchievementDraft, TaskWithSteps};

use crate::domain::DayKey;

/// One completed task as it appears in the daily report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskLine {
    pub task_id: String,
    pub title: String,
    pub completed_steps: u32,
    pub total_steps: u32,
    pub estimated_minutes: u32,
}

/// Derived figures for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyAggregate {
    pub day: DayKey,
    /// Ordered by completion time, then ID
    pub tasks: Vec<TaskLine>,
    pub task_count: u32,
    /// Completed steps across all tasks
    pub step_count: u32,
    /// Sum of the tasks' estimated minutes
    pub consumed_minutes: u32,
}

impl DailyAggregate {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Pair the figures with rendered report text for storage
    pub fn into_draft(self, summary_md: String) -> AchievementDraft {
        AchievementDraft {
            task_count: self.task_count,
            step_count: self.step_count,
            consumed_minutes: self.consumed_minutes,
            summary_md,
        }
    }
}

/// Aggregate the tasks completed within `day`
///
/// Tasks outside the day or not completed are ignored, so the result depends
/// only on the set of tasks completed that day.
pub fn aggregate(day: DayKey, tasks: &[TaskWithSteps]) -> DailyAggregate {
    let (start, end) = day.bounds();
    let mut completed: Vec<&TaskWithSteps> = tasks
        .iter()
        .filter(|t| t.task.completed_at.is_some_and(|at| (start..=end).contains(&at)))
        .collect();
    completed.sort_by(|a, b| {
        (a.task.completed_at, &a.task.id).cmp(&(b.task.completed_at, &b.task.id))
    });

    let lines: Vec<TaskLine> = completed
        .into_iter()
        .map(|t| TaskLine {
            task_id: t.task.id.clone(),
            title: t.task.title.clone(),
            completed_steps: t.completed_steps() as u32,
            total_steps: t.total_steps() as u32,
            estimated_minutes: t.task.estimated_minutes,
        })
        .collect();

    DailyAggregate {
        day,
        task_count: lines.len() as u32,
        step_count: lines.iter().map(|l| l.completed_steps).sum(),
        consumed_minutes: lines.iter().map(|l| l.estimated_minutes).sum(),
        tasks: lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskstore::{Step, Task};

    fn completed_task(title: &str, at: i64, done: usize, total: usize, minutes: u32) -> TaskWithSteps {
        let mut task = Task::new(title);
        task.estimated_minutes = minutes;
        task.completed_at = Some(at);
        let steps = (0..total)
            .map(|i| Step {
                id: taskstore::new_id(),
                task_id: task.id.clone(),
                content: format!("step {}", i + 1),
                tool: None,
                theme: None,
                deliverable: None,
                estimate_minutes: 10,
                done: i < done,
                order_idx: i as u32,
            })
            .collect();
        TaskWithSteps { task, steps }
    }

    #[test]
    fn test_two_tasks_on_one_day() {
        let day = DayKey::parse("2024-03-09").unwrap();
        let (start, _) = day.bounds();
        let tasks = vec![
            completed_task("Write report", start + 1_000, 3, 5, 30),
            completed_task("Call bank", start + 2_000, 2, 2, 20),
        ];

        let agg = aggregate(day, &tasks);
        assert_eq!(agg.task_count, 2);
        assert_eq!(agg.step_count, 5);
        assert_eq!(agg.consumed_minutes, 50);
        assert_eq!(agg.tasks[0].title, "Write report");
        assert_eq!(agg.tasks[0].completed_steps, 3);
        assert_eq!(agg.tasks[0].total_steps, 5);
    }

    #[test]
    fn test_window_is_inclusive_and_excludes_neighbors() {
        let day = DayKey::parse("2024-03-09").unwrap();
        let (start, end) = day.bounds();
        let tasks = vec![
            completed_task("last millisecond", end, 1, 1, 10),
            completed_task("first millisecond", start, 1, 1, 10),
            completed_task("next day", end + 1, 1, 1, 10),
            completed_task("previous day", start - 1, 1, 1, 10),
        ];

        let agg = aggregate(day, &tasks);
        let titles: Vec<&str> = agg.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first millisecond", "last millisecond"]);
    }

    #[test]
    fn test_incomplete_tasks_ignored() {
        let day = DayKey::parse("2024-03-09").unwrap();
        let mut open = completed_task("open", 0, 0, 1, 10);
        open.task.completed_at = None;

        let agg = aggregate(day, &[open]);
        assert!(agg.is_empty());
        assert_eq!(agg.consumed_minutes, 0);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let day = DayKey::parse("2024-03-09").unwrap();
        let (start, _) = day.bounds();
        let a = completed_task("a", start + 5, 1, 1, 10);
        let b = completed_task("b", start + 9, 1, 2, 15);

        let forward = aggregate(day, &[a.clone(), b.clone()]);
        let backward = aggregate(day, &[b, a]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_into_draft() {
        let day = DayKey::parse("2024-03-09").unwrap();
        let (start, _) = day.bounds();
        let draft = aggregate(day, &[completed_task("x", start, 1, 3, 25)]).into_draft("report".to_string());
        assert_eq!(draft.task_count, 1);
        assert_eq!(draft.step_count, 1);
        assert_eq!(draft.consumed_minutes, 25);
        assert_eq!(draft.summary_md, "report");
    }
}
