use serde::Serialize;

use crate::types::{ChatRequest, Role, split_system};

/// Messages API request body.
#[derive(Debug, Serialize)]
pub(crate) struct ClaudeRequestBody<'a> {
    pub(crate) model: &'a str,
    pub(crate) max_tokens: u32,
    pub(crate) temperature: f32,
    /// Top-level system prompt; Anthropic does not accept system turns inline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) system: Option<String>,
    pub(crate) messages: Vec<ClaudeMessage<'a>>,
    pub(crate) stream: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClaudeMessage<'a> {
    pub(crate) role: &'static str,
    pub(crate) content: &'a str,
}

/// 构建 Anthropic Messages 请求体
pub(crate) fn build_claude_body<'a>(
    request: &'a ChatRequest,
    model: &'a str,
    stream: bool,
) -> ClaudeRequestBody<'a> {
    let split = split_system(&request.messages);
    let messages = split
        .turns
        .into_iter()
        .map(|message| ClaudeMessage {
            role: match message.role {
                Role::Assistant => "assistant",
                _ => "user",
            },
            content: &message.content,
        })
        .collect();

    ClaudeRequestBody {
        model,
        max_tokens: request.effective_max_tokens(),
        temperature: request.effective_temperature(),
        system: split.system,
        messages,
        stream,
    }
}
