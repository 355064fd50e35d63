use std::time::Duration;

use serde::Deserialize;

use crate::error::LLMError;

#[derive(Debug, Deserialize)]
pub(super) struct ClaudeErrorBody {
    pub(super) error: Option<ClaudeErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ClaudeErrorDetail {
    #[serde(default)]
    pub(super) message: Option<String>,
    #[serde(default, rename = "type")]
    pub(super) kind: Option<String>,
}

impl ClaudeErrorDetail {
    /// `message (type)` when both are present.
    pub(super) fn describe(self) -> Option<String> {
        let message = self.message?;
        Some(match self.kind {
            Some(kind) if !kind.is_empty() => format!("{message} ({kind})"),
            _ => message,
        })
    }
}

/// Parses error responses returned by the Anthropic Messages API.
pub(super) fn parse_claude_error(
    status: u16,
    body: &str,
    retry_after: Option<Duration>,
) -> LLMError {
    let message = serde_json::from_str::<ClaudeErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .and_then(ClaudeErrorDetail::describe)
        .unwrap_or_else(|| format!("Claude API error (status {status})"));
    LLMError::from_status("claude", status, message, retry_after)
}
