//! Duration aggregation

use super::StepDraft;

/// Total estimated minutes of a plan; 0 for an empty plan
pub fn total_minutes(steps: &[StepDraft]) -> u32 {
    steps.iter().fold(0u32, |acc, step| acc.saturating_add(step.estimate_minutes))
}
