use serde::Serialize;

use crate::types::ChatRequest;

/// Chat Completions request body. System turns stay inline.
#[derive(Debug, Serialize)]
pub(crate) struct OpenAiRequestBody<'a> {
    pub(crate) model: &'a str,
    pub(crate) messages: Vec<OpenAiMessage<'a>>,
    pub(crate) temperature: f32,
    pub(crate) max_tokens: u32,
    pub(crate) stream: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiMessage<'a> {
    pub(crate) role: &'static str,
    pub(crate) content: &'a str,
}

pub(crate) fn build_openai_body<'a>(
    request: &'a ChatRequest,
    model: &'a str,
    stream: bool,
) -> OpenAiRequestBody<'a> {
    OpenAiRequestBody {
        model,
        messages: request
            .messages
            .iter()
            .map(|message| OpenAiMessage {
                role: message.role.as_str(),
                content: &message.content,
            })
            .collect(),
        temperature: request.effective_temperature(),
        max_tokens: request.effective_max_tokens(),
        stream,
    }
}
