//! Decomposer - LLM-driven breakdown of a task title into steps
//!
//! Failures never escape: an LLM error, a timeout, a template problem or a reply
//! without step lines all produce the fallback plan.

use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{StepDraft, StepMarker, parse_steps};
use crate::config::PlanningConfig;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::prompts::PromptLoader;

/// Template context for the decomposition prompts
#[derive(Debug, Serialize)]
struct DecomposeContext<'a> {
    title: &'a str,
    marker: &'a str,
    separator: &'a str,
}

/// Breaks task titles into classified steps
pub struct Decomposer {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    config: PlanningConfig,
    marker: StepMarker,
}

impl Decomposer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, config: PlanningConfig) -> Self {
        debug!(?config, "Decomposer::new: called");
        let marker = StepMarker::from(&config);
        Self {
            llm,
            prompts,
            config,
            marker,
        }
    }

    /// Decompose a title into steps; never fails
    pub async fn decompose(&self, title: &str) -> Vec<StepDraft> {
        debug!(%title, "decompose: called");
        match self.request_steps(title).await {
            Ok(contents) if !contents.is_empty() => {
                info!(%title, step_count = contents.len(), "decompose: parsed steps from LLM reply");
                contents
                    .into_iter()
                    .enumerate()
                    .map(|(idx, content)| StepDraft::classified(content, idx + 1))
                    .collect()
            }
            Ok(_) => {
                warn!(%title, "decompose: LLM reply contained no step lines, using fallback plan");
                fallback_plan(title)
            }
            Err(e) => {
                warn!(%title, error = %e, "decompose: LLM request failed, using fallback plan");
                fallback_plan(title)
            }
        }
    }

    /// Render the prompts, call the LLM under the planning deadline, parse the reply
    async fn request_steps(&self, title: &str) -> Result<Vec<String>> {
        let context = DecomposeContext {
            title,
            marker: &self.marker.marker,
            separator: &self.marker.separator,
        };
        let request = CompletionRequest {
            system_prompt: self.prompts.render("decompose-system", &context)?,
            messages: vec![Message::user(self.prompts.render("decompose-user", &context)?)],
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
        };

        let deadline = Duration::from_millis(self.config.timeout_ms);
        let response = tokio::time::timeout(deadline, self.llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout(deadline))??;

        let text = response.content.unwrap_or_default();
        debug!(reply_len = text.len(), stop_reason = ?response.stop_reason, "request_steps: got reply");
        Ok(parse_steps(&text, &self.marker))
    }
}

/// The fixed four-step plan used whenever the LLM path yields nothing
pub fn fallback_plan(title: &str) -> Vec<StepDraft> {
    let step = |content: String, tool: &str, theme: &str, deliverable: &str, minutes: u32| StepDraft {
        content,
        tool: tool.to_string(),
        theme: theme.to_string(),
        deliverable: deliverable.to_string(),
        estimate_minutes: minutes,
    };

    vec![
        step(
            format!("Analyze the requirements for {}", title),
            "thinking/notes",
            "planning",
            "requirements analysis",
            20,
        ),
        step(
            format!("Draw up an execution plan for {}", title),
            "planning tool",
            "planning",
            "execution plan",
            15,
        ),
        step(
            format!("Carry out the core work of {}", title),
            "relevant tools",
            "execution",
            "core result",
            45,
        ),
        step(
            format!("Finish {} and review the result", title),
            "checklist",
            "verification",
            "final result",
            20,
        ),
    ]
}
