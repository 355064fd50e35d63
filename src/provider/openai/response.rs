use serde::Deserialize;

use crate::provider::sum_tokens;
use crate::types::ChatResponse;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OpenAiChatResponse {
    #[serde(default)]
    pub(crate) model: Option<String>,
    #[serde(default)]
    pub(crate) choices: Vec<OpenAiResponseChoice>,
    #[serde(default)]
    pub(crate) usage: Option<OpenAiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OpenAiResponseChoice {
    #[serde(default)]
    pub(crate) message: Option<OpenAiResponseMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OpenAiResponseMessage {
    /// `null` for pure tool-call answers.
    #[serde(default)]
    pub(crate) content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OpenAiUsage {
    #[serde(default)]
    pub(crate) prompt_tokens: Option<u64>,
    #[serde(default)]
    pub(crate) completion_tokens: Option<u64>,
    #[serde(default)]
    pub(crate) total_tokens: Option<u64>,
}

pub(crate) fn map_response(resp: OpenAiChatResponse, requested_model: &str) -> ChatResponse {
    let content = resp
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_default();
    let token_count = resp.usage.and_then(|usage| {
        usage
            .total_tokens
            .or_else(|| sum_tokens(usage.prompt_tokens, usage.completion_tokens))
    });

    ChatResponse {
        content,
        model: resp.model.unwrap_or_else(|| requested_model.to_string()),
        token_count,
    }
}
