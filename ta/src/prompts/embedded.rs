//! Embedded templates
//!
//! Compiled into the binary. The decomposition prompts can be overridden from
//! `planning.prompts-dir`; the report templates cannot.

/// System instruction for task decomposition
pub const DECOMPOSE_SYSTEM: &str = r#"You are an expert in personal task management. Break the task the user gives you into concrete, actionable steps.

Rules:
- Write one step per line.
- Start every step line with "{{marker}} N{{separator}}" where N is the step number, for example "{{marker}} 1{{separator}} Collect the requirements".
- Keep each step short, specific and executable by one person.
- Use between 3 and 8 steps.
- Do not add any other text before or after the steps.
"#;

/// User message for task decomposition
pub const DECOMPOSE_USER: &str = r#"Please break down this task: {{title}}"#;

/// Daily report for a day with completed tasks
pub const DAILY_REPORT: &str = r#"# 📅 {{day}} Task Summary

**Tasks completed today:** {{task_count}}

{{#each tasks}}
## 🎯 {{title}}
- Steps completed: {{completed_steps}}/{{total_steps}}
- Estimated time: {{estimated_minutes}} minutes

{{/each}}
---

**Totals:**
- Tasks completed: {{task_count}}
- Steps completed: {{step_count}}
- Total time: {{consumed_minutes}} minutes

🎉 Great work today!"#;

/// Daily report for a day without completed tasks
pub const DAILY_EMPTY: &str = r#"# 📅 {{day}} Summary

No tasks completed yet today."#;

/// Completion summary of a single task
pub const TASK_SUMMARY: &str = r#"# 🎯 Task Completion Summary

**Task:** {{title}}

**Completed at:** {{completed_at}}

**Total steps:** {{total_steps}}
**Completed steps:** {{completed_steps}}

{{#if done_steps}}
## ✅ Completed Steps

{{#each done_steps}}
- {{this}}
{{/each}}
{{/if}}

**Total time:** {{estimated_minutes}} minutes

🎉 Congratulations on finishing the task!"#;

/// Get embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        "decompose-system" => Some(DECOMPOSE_SYSTEM),
        "decompose-user" => Some(DECOMPOSE_USER),
        "daily-report" => Some(DAILY_REPORT),
        "daily-empty" => Some(DAILY_EMPTY),
        "task-summary" => Some(TASK_SUMMARY),
        _ => None,
    }
}
