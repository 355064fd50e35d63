use serde::Deserialize;

use crate::error::LLMError;
use crate::stream::Frame;

use super::error::OpenAiErrorDetail;

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
    /// Some gateways report failures in-band after a 200.
    #[serde(default)]
    error: Option<OpenAiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: Option<OpenAiStreamDelta>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Takes `choices[0].delta.content`; role-only and finish chunks carry no text.
pub(super) fn parse_openai_frame(
    _event: Option<&str>,
    data: &str,
    provider: &'static str,
) -> Result<Frame, LLMError> {
    let chunk: OpenAiStreamChunk = serde_json::from_str(data).map_err(|err| {
        LLMError::provider(provider, format!("failed to parse stream chunk: {err}"))
    })?;

    if let Some(error) = chunk.error {
        let message = error
            .describe()
            .unwrap_or_else(|| "stream error".to_string());
        return Err(LLMError::provider(provider, message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .map_or(Frame::Skip, Frame::Text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_content_becomes_text() {
        let frame = parse_openai_frame(
            None,
            r#"{"id":"c1","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":"Hel"},"finish_reason":null}]}"#,
            "openai",
        )
        .expect("parse");
        assert_eq!(frame, Frame::Text("Hel".to_string()));
    }

    #[test]
    fn role_and_finish_chunks_are_skipped() {
        for data in [
            r#"{"choices":[{"index":0,"delta":{"role":"assistant"},"finish_reason":null}]}"#,
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
            r#"{"choices":[],"usage":{"prompt_tokens":1,"completion_tokens":2,"total_tokens":3}}"#,
        ] {
            assert_eq!(parse_openai_frame(None, data, "openai").expect("parse"), Frame::Skip);
        }
    }

    #[test]
    fn in_band_error_is_reported() {
        let err = parse_openai_frame(
            None,
            r#"{"error":{"message":"upstream timeout","code":504}}"#,
            "openai",
        )
        .unwrap_err();
        assert!(err.to_string().contains("upstream timeout (504)"));
    }

    #[test]
    fn malformed_chunk_is_provider_error() {
        let err = parse_openai_frame(None, "{not json", "openai").unwrap_err();
        assert!(matches!(err, LLMError::Provider { provider: "openai", .. }));
    }
}
