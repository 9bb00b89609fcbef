//! Step parser
//!
//! Pulls step lines such as `Step 2: Draft the outline` out of a free-text LLM
//! reply. Anything that is not a step line is dropped.

use tracing::debug;

use crate::config::PlanningConfig;

/// How a step line is recognized: `{marker} ... {separator} content`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMarker {
    /// Prefix a step line starts with, compared case-insensitively
    pub marker: String,
    /// Token that ends the prefix; content is everything after its first occurrence
    pub separator: String,
}

impl Default for StepMarker {
    fn default() -> Self {
        Self {
            marker: "Step".to_string(),
            separator: ":".to_string(),
        }
    }
}

impl From<&PlanningConfig> for StepMarker {
    fn from(config: &PlanningConfig) -> Self {
        Self {
            marker: config.step_marker.clone(),
            separator: config.step_separator.clone(),
        }
    }
}

impl StepMarker {
    fn starts_line(&self, line: &str) -> bool {
        line.get(..self.marker.len())
            .is_some_and(|prefix| prefix.to_lowercase() == self.marker.to_lowercase())
    }

    /// Content of one trimmed line if it is a step line
    fn content_of<'a>(&self, line: &'a str) -> Option<&'a str> {
        if !self.starts_line(line) {
            return None;
        }
        let (_, rest) = line.split_once(self.separator.as_str())?;
        let content = rest.trim();
        (!content.is_empty()).then_some(content)
    }
}

/// Split an LLM reply into ordered step descriptions
///
/// Returns an empty list when no line qualifies; that is not an error.
pub fn parse_steps(raw: &str, marker: &StepMarker) -> Vec<String> {
    let steps: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter_map(|line| marker.content_of(line))
        .map(str::to_string)
        .collect();
    debug!(step_count = steps.len(), "parse_steps: done");
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_steps() {
        let raw = "Step 1: Gather requirements\nStep 2: Draft the outline\nStep 3: Review with the team";
        let steps = parse_steps(raw, &StepMarker::default());
        assert_eq!(
            steps,
            vec!["Gather requirements", "Draft the outline", "Review with the team"]
        );
    }

    #[test]
    fn test_non_step_lines_are_dropped_not_joined() {
        let raw = "Here is your plan:\n\n  Step 1: Pick a date  \n  which suits everyone\nStep 2: Book the venue\nGood luck!";
        let steps = parse_steps(raw, &StepMarker::default());
        assert_eq!(steps, vec!["Pick a date", "Book the venue"]);
    }

    #[test]
    fn test_no_marker_lines_yields_empty() {
        assert!(parse_steps("1. Do this\n2. Do that", &StepMarker::default()).is_empty());
        assert!(parse_steps("", &StepMarker::default()).is_empty());
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        let steps = parse_steps("STEP 1: shout\nstep 2: whisper", &StepMarker::default());
        assert_eq!(steps, vec!["shout", "whisper"]);
    }

    #[test]
    fn test_marker_without_separator_or_content_is_dropped() {
        let steps = parse_steps("Step 1 no separator\nStep 2:   \nStep 3: kept", &StepMarker::default());
        assert_eq!(steps, vec!["kept"]);
    }

    #[test]
    fn test_content_after_first_separator() {
        let steps = parse_steps("Step 1: Meet at 10:30 sharp", &StepMarker::default());
        assert_eq!(steps, vec!["Meet at 10:30 sharp"]);
    }

    #[test]
    fn test_custom_marker() {
        let marker = StepMarker {
            marker: "第".to_string(),
            separator: "步：".to_string(),
        };
        let steps = parse_steps("第1步：分析需求\n其他\n第2步：制定计划", &marker);
        assert_eq!(steps, vec!["分析需求", "制定计划"]);
    }

    #[test]
    fn test_marker_from_config() {
        let config = PlanningConfig::default();
        assert_eq!(StepMarker::from(&config), StepMarker::default());
    }

    #[test]
    fn test_n_lines_give_n_steps_in_order() {
        let raw: String = (1..=7).map(|i| format!("Step {i}: item {i}\n")).collect();
        let steps = parse_steps(&raw, &StepMarker::default());
        assert_eq!(steps.len(), 7);
        assert_eq!(steps[6], "item 7");
    }
}
