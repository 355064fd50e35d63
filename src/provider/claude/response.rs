use serde::Deserialize;

use crate::provider::sum_tokens;
use crate::types::ChatResponse;

/// Non-streaming response payload returned by Anthropic Messages.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ClaudeMessageResponse {
    /// Some compatibility layers omit the model, so keep it optional.
    #[serde(default)]
    pub(crate) model: Option<String>,
    #[serde(default)]
    pub(crate) content: Vec<ClaudeContentBlock>,
    #[serde(default)]
    pub(crate) usage: Option<ClaudeUsage>,
}

/// Content block; only `text` blocks carry output we surface.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ClaudeContentBlock {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ClaudeUsage {
    #[serde(default)]
    pub(crate) input_tokens: Option<u64>,
    #[serde(default)]
    pub(crate) output_tokens: Option<u64>,
}

pub(crate) fn map_response(resp: ClaudeMessageResponse, requested_model: &str) -> ChatResponse {
    let content = resp
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .unwrap_or_default();
    let token_count = resp
        .usage
        .and_then(|usage| sum_tokens(usage.input_tokens, usage.output_tokens));

    ChatResponse {
        content,
        model: resp.model.unwrap_or_else(|| requested_model.to_string()),
        token_count,
    }
}
