//! Scripted LLM client
//!
//! Answers every request with the same canned outcome. `ta` uses the offline
//! variant when no provider is configured, which routes every decomposition
//! to the fallback plan; integration tests use the other two.

use async_trait::async_trait;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError};

#[derive(Debug, Clone)]
enum Script {
    Reply(String),
    Fail(String),
    Offline,
}

/// An `LlmClient` that never touches the network
#[derive(Debug, Clone)]
pub struct ScriptedLlmClient {
    script: Script,
}

impl ScriptedLlmClient {
    /// Always reply with `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            script: Script::Reply(text.into()),
        }
    }

    /// Always fail with an API error carrying `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Script::Fail(message.into()),
        }
    }

    /// Always report that no provider is available
    pub fn offline() -> Self {
        Self { script: Script::Offline }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(script = ?self.script, "ScriptedLlmClient::complete: called");
        match &self.script {
            Script::Reply(text) => Ok(CompletionResponse::text(text.clone())),
            Script::Fail(message) => Err(LlmError::ApiError {
                status: 500,
                message: message.clone(),
            }),
            Script::Offline => Err(LlmError::Unavailable("no LLM provider configured".to_string())),
        }
    }
}
