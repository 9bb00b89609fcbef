//! Task decomposition
//!
//! Turns a task title into an ordered list of classified, estimated steps:
//! one LLM call, the step parser, then the classifier on each parsed step.
//! Any failure along the way yields the fixed four-step fallback plan.

mod classifier;
mod decomposer;
mod duration;
mod parser;

use serde::Serialize;
use taskstore::NewStep;

pub use classifier::{
    Classification, DEFAULT_ESTIMATE_MINUTES, DELIVERABLE_RULES, Deliverable, ESTIMATE_RULES, Rule, THEME_RULES,
    TOOL_RULES, Theme, Tool, classify,
};
pub use decomposer::{Decomposer, fallback_plan};
pub use duration::total_minutes;
pub use parser::{StepMarker, parse_steps};

/// One planned step before it is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepDraft {
    pub content: String,
    pub tool: String,
    pub theme: String,
    pub deliverable: String,
    pub estimate_minutes: u32,
}

impl StepDraft {
    /// Build a draft from parsed content and its 1-based position
    pub fn classified(content: impl Into<String>, position: usize) -> Self {
        let content = content.into();
        let c = classify(&content, position);
        Self {
            content,
            tool: c.tool.to_string(),
            theme: c.theme.to_string(),
            deliverable: c.deliverable.to_string(),
            estimate_minutes: c.estimate_minutes,
        }
    }
}

impl From<StepDraft> for NewStep {
    fn from(draft: StepDraft) -> Self {
        NewStep {
            content: draft.content,
            tool: Some(draft.tool),
            theme: Some(draft.theme),
            deliverable: Some(draft.deliverable),
            estimate_minutes: draft.estimate_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classified_draft() {
        let draft = StepDraft::classified("Write a quick report", 2);
        assert_eq!(draft.tool, "text editor");
        assert_eq!(draft.theme, "execution");
        assert_eq!(draft.deliverable, "document");
        assert_eq!(draft.estimate_minutes, 15);
    }

    #[test]
    fn test_draft_into_new_step() {
        let step: NewStep = StepDraft::classified("Install the toolchain", 1).into();
        assert_eq!(step.content, "Install the toolchain");
        assert_eq!(step.tool.as_deref(), Some("system tool"));
        assert_eq!(step.theme.as_deref(), Some("planning"));
        assert_eq!(step.estimate_minutes, 30);
    }
}
