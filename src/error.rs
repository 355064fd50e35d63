use std::time::Duration;

use thiserror::Error;

/// Every failure the registry or an adapter can report.
///
/// Nothing is retried or swallowed inside the crate; the hosting application decides how
/// to present a variant and whether to try again.
#[derive(Debug, Error)]
pub enum LLMError {
    /// The logical model identifier is not backed by any registered adapter.
    #[error("unknown model: {model}")]
    UnknownModel { model: String },
    /// The adapter exists but was built without a credential.
    #[error("{display_name} is not configured. Please add an API key.")]
    Unconfigured { display_name: &'static str },
    /// `stream_chat` was requested from a blocking-only adapter.
    #[error("streaming not implemented for provider {provider}")]
    StreamingUnsupported { provider: &'static str },
    /// Connection, TLS or body-read failures below the vendor protocol.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// The vendor rejected the credential (HTTP 401/403).
    #[error("auth failure: {message}")]
    Auth { message: String },
    /// The vendor throttled the request (HTTP 429).
    #[error("rate limited: {message}")]
    RateLimit {
        /// Raw message returned by the vendor.
        message: String,
        /// Wait suggested through `Retry-After`, if any.
        retry_after: Option<Duration>,
    },
    /// The vendor rejected the payload (HTTP 400) or it could not be serialized.
    #[error("invalid request: {message}")]
    Validation { message: String },
    /// Any other vendor failure, including unparseable bodies.
    #[error("provider {provider} error: {message}")]
    Provider {
        /// Adapter name such as `gemini`.
        provider: &'static str,
        message: String,
    },
}

impl LLMError {
    /// Creates an [`LLMError::Transport`] from a textual description.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_switchboard::error::LLMError;
    ///
    /// let err = LLMError::transport("connection reset");
    /// assert!(matches!(err, LLMError::Transport { .. }));
    /// ```
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an [`LLMError::Provider`] tagged with the adapter name.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_switchboard::error::LLMError;
    ///
    /// let err = LLMError::provider("openai", "bad JSON payload");
    /// assert!(matches!(err, LLMError::Provider { provider: "openai", .. }));
    /// ```
    pub fn provider<T: Into<String>>(provider: &'static str, message: T) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }

    /// Maps a non-success HTTP status and the extracted vendor message onto a variant.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_switchboard::error::LLMError;
    ///
    /// let err = LLMError::from_status("gemini", 401, "API key not valid".into(), None);
    /// assert!(matches!(err, LLMError::Auth { .. }));
    /// let err = LLMError::from_status("gemini", 503, "overloaded".into(), None);
    /// assert!(matches!(err, LLMError::Provider { provider: "gemini", .. }));
    /// ```
    pub fn from_status(
        provider: &'static str,
        status: u16,
        message: String,
        retry_after: Option<Duration>,
    ) -> Self {
        match status {
            401 | 403 => Self::Auth { message },
            429 => Self::RateLimit {
                message,
                retry_after,
            },
            400 => Self::Validation { message },
            _ => Self::Provider { provider, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_message_names_display_name() {
        let err = LLMError::Unconfigured {
            display_name: "Gemini (Google)",
        };
        assert_eq!(
            err.to_string(),
            "Gemini (Google) is not configured. Please add an API key."
        );
    }

    #[test]
    fn from_status_keeps_retry_after_for_throttling() {
        let err = LLMError::from_status(
            "claude",
            429,
            "slow down".to_string(),
            Some(Duration::from_secs(3)),
        );
        match err {
            LLMError::RateLimit {
                message,
                retry_after,
            } => {
                assert_eq!(message, "slow down");
                assert_eq!(retry_after, Some(Duration::from_secs(3)));
            }
            other => panic!("expected RateLimit, got {other:?}"),
        }
    }

    #[test]
    fn from_status_keeps_vendor_message_for_bad_request() {
        let err = LLMError::from_status("gemini", 400, "bad request".to_string(), None);
        assert!(matches!(err, LLMError::Validation { .. }));
        assert!(err.to_string().contains("bad request"));
    }
}
