use serde::Serialize;

use crate::types::{ChatRequest, Role, split_system};

/// 构建 Google Gemini GenerateContent 请求体
///
/// The model travels in the URL path, so it is not part of the body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiRequestBody<'a> {
    pub(crate) contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) system_instruction: Option<GeminiSystemInstruction>,
    pub(crate) generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeminiContent<'a> {
    pub(crate) role: &'static str,
    pub(crate) parts: Vec<GeminiTextPart<&'a str>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeminiSystemInstruction {
    pub(crate) parts: Vec<GeminiTextPart<String>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeminiTextPart<T> {
    pub(crate) text: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiGenerationConfig {
    pub(crate) temperature: f32,
    pub(crate) max_output_tokens: u32,
}

pub(crate) fn build_gemini_body(request: &ChatRequest) -> GeminiRequestBody<'_> {
    let split = split_system(&request.messages);
    let contents = split
        .turns
        .into_iter()
        .map(|message| GeminiContent {
            // Gemini 使用 model 表示助手
            role: match message.role {
                Role::Assistant => "model",
                _ => "user",
            },
            parts: vec![GeminiTextPart {
                text: message.content.as_str(),
            }],
        })
        .collect();

    GeminiRequestBody {
        contents,
        system_instruction: split.system.map(|text| GeminiSystemInstruction {
            parts: vec![GeminiTextPart { text }],
        }),
        generation_config: GeminiGenerationConfig {
            temperature: request.effective_temperature(),
            max_output_tokens: request.effective_max_tokens(),
        },
    }
}
