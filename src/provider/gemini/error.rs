use std::time::Duration;

use serde::Deserialize;

use crate::error::LLMError;

/// Parses error responses returned by Google Gemini.
///
/// `error.message` is surfaced verbatim; anything else becomes `Gemini API error`.
pub(super) fn parse_gemini_error(
    status: u16,
    body: &str,
    retry_after: Option<Duration>,
) -> LLMError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }

    #[derive(Deserialize)]
    struct InnerError {
        message: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .and_then(|error| error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| "Gemini API error".to_string());
    LLMError::from_status("gemini", status, message, retry_after)
}
