use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::StreamExt;
use serde::Serialize;

use crate::error::LLMError;

/// JSON POST request handed to an [`HttpTransport`].
///
/// Every vendor call in this crate is a JSON POST, so the request carries no method.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Builds a request with a JSON body and the matching `Content-Type` header.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_switchboard::http::HttpRequest;
    ///
    /// let request = HttpRequest::post_json("https://example.com", br"{}".to_vec());
    /// assert_eq!(request.headers.get("Content-Type"), Some(&"application/json".to_string()));
    /// ```
    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::from([("Content-Type".to_string(), "application/json".to_string())]),
            body,
        }
    }

    /// Adds headers on top of the existing ones, replacing duplicates.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }
}

/// Fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Numeric `Retry-After` header, if the vendor sent one.
    pub fn retry_after(&self) -> Option<Duration> {
        retry_after_from_headers(&self.headers)
    }

    /// Converts the body into a UTF-8 string.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_switchboard::http::HttpResponse;
    ///
    /// let response = HttpResponse { status: 200, headers: Default::default(), body: b"ok".to_vec() };
    /// assert_eq!(response.into_string().unwrap(), "ok");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`LLMError::Transport`] when the body is not valid UTF-8.
    pub fn into_string(self) -> Result<String, LLMError> {
        String::from_utf8(self.body).map_err(|err| LLMError::transport(err.to_string()))
    }
}

/// HTTP response whose body is still arriving.
///
/// Dropping the response (or its `body`) releases the underlying connection.
pub struct HttpStreamResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: HttpBodyStream,
}

impl HttpStreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn retry_after(&self) -> Option<Duration> {
        retry_after_from_headers(&self.headers)
    }

    /// Drains the remaining body into a string, used to read error payloads.
    ///
    /// Invalid UTF-8 is replaced so the status is never lost to a decoding failure.
    pub async fn collect_text(mut self) -> Result<String, LLMError> {
        let mut bytes = Vec::new();
        while let Some(chunk) = self.body.next().await {
            bytes.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Body stream returned by [`HttpTransport::send_stream`].
pub type HttpBodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, LLMError>> + Send>>;

/// Seam between adapters and the concrete HTTP client.
///
/// Production code uses [`reqwest::ReqwestTransport`]; tests substitute an in-memory
/// implementation to script vendor replies and count network calls.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and resolves once the whole body has been read.
    ///
    /// # Examples
    ///
    /// ```
    /// # use async_trait::async_trait;
    /// # use llm_switchboard::http::{HttpTransport, HttpRequest, HttpResponse, HttpStreamResponse};
    /// # use llm_switchboard::error::LLMError;
    /// # use futures_util::stream;
    /// struct MemoryTransport;
    ///
    /// #[async_trait]
    /// impl HttpTransport for MemoryTransport {
    ///     async fn send(&self, request: HttpRequest) -> Result<HttpResponse, LLMError> {
    ///         Ok(HttpResponse { status: 200, headers: request.headers, body: b"ok".to_vec() })
    ///     }
    ///     async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, LLMError> {
    ///         Ok(HttpStreamResponse { status: 200, headers: request.headers, body: Box::pin(stream::empty()) })
    ///     }
    /// }
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let response = MemoryTransport
    ///     .send(HttpRequest::post_json("https://example.com", br"{}".to_vec()))
    ///     .await
    ///     .unwrap();
    /// assert!(response.is_success());
    /// # });
    /// ```
    ///
    /// # Errors
    ///
    /// Network failures map to [`LLMError::Transport`]. Non-success statuses are *not*
    /// errors at this layer; adapters interpret them.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, LLMError>;

    /// Sends a request and returns as soon as the status line and headers arrive.
    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, LLMError>;
}

/// Shared handle to a transport implementation.
pub type DynHttpTransport = Arc<dyn HttpTransport>;

/// Serializes `body`, attaches `headers` and sends a buffered POST.
///
/// # Errors
///
/// Returns [`LLMError::Validation`] if serialization fails, before any I/O happens.
pub async fn post_json<T: Serialize>(
    transport: &dyn HttpTransport,
    url: impl Into<String>,
    headers: HashMap<String, String>,
    body: &T,
) -> Result<HttpResponse, LLMError> {
    let request = encode_request(url, headers, body)?;
    transport.send(request).await
}

/// Streaming counterpart of [`post_json`].
pub async fn post_json_stream<T: Serialize>(
    transport: &dyn HttpTransport,
    url: impl Into<String>,
    headers: HashMap<String, String>,
    body: &T,
) -> Result<HttpStreamResponse, LLMError> {
    let request = encode_request(url, headers, body)?;
    transport.send_stream(request).await
}

fn encode_request<T: Serialize>(
    url: impl Into<String>,
    headers: HashMap<String, String>,
    body: &T,
) -> Result<HttpRequest, LLMError> {
    let payload = serde_json::to_vec(body).map_err(|err| LLMError::Validation {
        message: format!("failed to serialize request: {err}"),
    })?;
    Ok(HttpRequest::post_json(url, payload).with_headers(headers))
}

/// Vendors send `Retry-After` in seconds; HTTP-date values are ignored.
fn retry_after_from_headers(headers: &HashMap<String, String>) -> Option<Duration> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("retry-after"))
        .and_then(|(_, value)| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

pub mod reqwest;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser;

    /// Transport that panics if it is ever reached.
    struct PanicTransport;

    #[async_trait]
    impl HttpTransport for PanicTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, LLMError> {
            panic!("send should not be called");
        }

        async fn send_stream(&self, _request: HttpRequest) -> Result<HttpStreamResponse, LLMError> {
            panic!("send_stream should not be called");
        }
    }

    struct NonSerializableBody;

    impl Serialize for NonSerializableBody {
        fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            Err(ser::Error::custom(
                "intentional serialization failure for test",
            ))
        }
    }

    #[tokio::test]
    async fn post_json_returns_validation_on_serde_error() {
        let result = post_json(
            &PanicTransport,
            "http://example.com",
            HashMap::new(),
            &NonSerializableBody,
        )
        .await;

        match result {
            Err(LLMError::Validation { message }) => {
                assert!(
                    message.contains("failed to serialize request"),
                    "unexpected validation message: {message}"
                );
            }
            Ok(_) => panic!("expected validation error for non serializable body"),
            Err(other) => panic!("unexpected error type: {other:?}"),
        }
    }

    #[test]
    fn with_headers_keeps_content_type() {
        let request = HttpRequest::post_json("http://example.com", Vec::new()).with_headers(
            HashMap::from([("x-api-key".to_string(), "secret".to_string())]),
        );
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(
            request.headers.get("x-api-key").map(String::as_str),
            Some("secret")
        );
    }

    #[test]
    fn retry_after_is_case_insensitive_and_numeric_only() {
        let response = HttpResponse {
            status: 429,
            headers: HashMap::from([("retry-after".to_string(), " 7 ".to_string())]),
            body: Vec::new(),
        };
        assert_eq!(response.retry_after(), Some(Duration::from_secs(7)));

        let response = HttpResponse {
            status: 429,
            headers: HashMap::from([(
                "Retry-After".to_string(),
                "Wed, 21 Oct 2015 07:28:00 GMT".to_string(),
            )]),
            body: Vec::new(),
        };
        assert_eq!(response.retry_after(), None);
    }

    #[tokio::test]
    async fn stream_response_collects_error_body() {
        let chunks: Vec<Result<Vec<u8>, LLMError>> =
            vec![Ok(b"{\"error\":".to_vec()), Ok(b"{}}".to_vec())];
        let response = HttpStreamResponse {
            status: 500,
            headers: HashMap::new(),
            body: Box::pin(futures_util::stream::iter(chunks)),
        };
        assert!(!response.is_success());
        assert_eq!(
            response.collect_text().await.expect("text"),
            "{\"error\":{}}"
        );
    }

    #[tokio::test]
    async fn stream_response_replaces_invalid_utf8() {
        let chunks: Vec<Result<Vec<u8>, LLMError>> = vec![Ok(b"oops \xff".to_vec())];
        let response = HttpStreamResponse {
            status: 502,
            headers: HashMap::new(),
            body: Box::pin(futures_util::stream::iter(chunks)),
        };
        assert_eq!(
            response.collect_text().await.expect("text"),
            "oops \u{fffd}"
        );
    }
}
