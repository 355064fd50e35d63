use serde::Deserialize;

use crate::error::LLMError;
use crate::stream::Frame;

use super::error::ClaudeErrorDetail;

/// Payload of one Anthropic SSE event.
#[derive(Debug, Deserialize)]
struct ClaudeStreamEvent {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    delta: Option<ClaudeDelta>,
    #[serde(default)]
    error: Option<ClaudeErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ClaudeDelta {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Keeps `text_delta` payloads, stops on `message_stop`, skips the rest.
///
/// Dispatches on the SSE `event:` name and falls back to the payload `type` when a proxy
/// strips event lines.
pub(super) fn parse_claude_frame(
    event: Option<&str>,
    data: &str,
    provider: &'static str,
) -> Result<Frame, LLMError> {
    if event == Some("ping") {
        return Ok(Frame::Skip);
    }

    let parsed: ClaudeStreamEvent = serde_json::from_str(data).map_err(|err| {
        LLMError::provider(provider, format!("failed to parse stream event: {err}"))
    })?;

    match event.or(parsed.kind.as_deref()) {
        Some("content_block_delta") => Ok(match parsed.delta {
            Some(ClaudeDelta {
                kind: Some(kind),
                text: Some(text),
            }) if kind == "text_delta" => Frame::Text(text),
            _ => Frame::Skip,
        }),
        Some("message_stop") => Ok(Frame::Stop),
        Some("error") => {
            let message = parsed
                .error
                .and_then(ClaudeErrorDetail::describe)
                .unwrap_or_else(|| "stream error".to_string());
            Err(LLMError::provider(provider, message))
        }
        _ => Ok(Frame::Skip),
    }
}
