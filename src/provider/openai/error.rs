use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::LLMError;

#[derive(Debug, Deserialize)]
pub(super) struct OpenAiErrorBody {
    pub(super) error: Option<OpenAiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAiErrorDetail {
    #[serde(default)]
    pub(super) message: Option<String>,
    /// String on OpenAI itself, sometimes numeric on compatible servers.
    #[serde(default)]
    pub(super) code: Option<Value>,
}

impl OpenAiErrorDetail {
    pub(super) fn describe(self) -> Option<String> {
        let message = self.message?;
        Some(match self.code {
            Some(Value::String(code)) => format!("{message} ({code})"),
            Some(Value::Number(code)) => format!("{message} ({code})"),
            _ => message,
        })
    }
}

pub(super) fn parse_openai_error(
    status: u16,
    body: &str,
    retry_after: Option<Duration>,
) -> LLMError {
    let message = serde_json::from_str::<OpenAiErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .and_then(OpenAiErrorDetail::describe)
        .unwrap_or_else(|| format!("OpenAI API error (status {status})"));
    LLMError::from_status("openai", status, message, retry_after)
}
