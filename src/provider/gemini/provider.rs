use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, warn};

use crate::error::LLMError;
use crate::http::{DynHttpTransport, post_json};
use crate::provider::{LLMProvider, VendorClient};
use crate::types::{ChatRequest, ChatResponse};

use super::error::parse_gemini_error;
use super::request::build_gemini_body;
use super::response::{GeminiGenerateContentResponse, map_response};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DISPLAY_NAME: &str = "Gemini (Google)";

/// Model sent when the adapter is not given another one.
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Google Gemini GenerateContent adapter.
///
/// The credential travels as the `key` query parameter, so endpoint URLs are never logged.
pub struct GeminiProvider {
    client: Option<VendorClient>,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// 使用默认 base_url 与模型创建 Provider
    pub fn new(transport: DynHttpTransport, api_key: Option<String>) -> Self {
        Self {
            client: VendorClient::connect(transport, api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Overrides the base URL, e.g. for a proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 设置模型 例如 `gemini-1.5-flash`
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builds `{base}/v1beta/models/{model}:generateContent?key={api_key}`.
    pub(crate) fn endpoint(&self, api_key: &str) -> Result<String, LLMError> {
        let base = self.base_url.trim_end_matches('/');
        let model_path = normalize_model(&self.model);
        let raw = if base.ends_with("/v1beta") {
            format!("{base}/{model_path}:generateContent")
        } else {
            format!("{base}/v1beta/{model_path}:generateContent")
        };
        Url::parse_with_params(&raw, &[("key", api_key)])
            .map(String::from)
            .map_err(|err| LLMError::Validation {
                message: format!("invalid Gemini endpoint: {err}"),
            })
    }

    fn client(&self) -> Result<&VendorClient, LLMError> {
        self.client.as_ref().ok_or(LLMError::Unconfigured {
            display_name: DISPLAY_NAME,
        })
    }

    fn build_headers() -> HashMap<String, String> {
        HashMap::from([("Accept".to_string(), "application/json".to_string())])
    }
}

fn normalize_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    fn is_available(&self) -> bool {
        self.client.is_some()
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LLMError> {
        let client = self.client()?;
        let body = build_gemini_body(&request);
        debug!(
            provider = self.name(),
            model = %self.model,
            messages = request.messages.len(),
            "sending chat request"
        );
        let response = post_json(
            client.transport.as_ref(),
            self.endpoint(&client.api_key)?,
            Self::build_headers(),
            &body,
        )
        .await?;

        if !response.is_success() {
            let status = response.status;
            warn!(provider = self.name(), status, "vendor rejected chat request");
            return Err(parse_gemini_error(
                status,
                &String::from_utf8_lossy(&response.body),
                response.retry_after(),
            ));
        }
        let text = response.into_string()?;

        let parsed: GeminiGenerateContentResponse =
            serde_json::from_str(&text).map_err(|err| {
                LLMError::provider(self.name(), format!("failed to parse Gemini response: {err}"))
            })?;
        Ok(map_response(parsed, &self.model))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::provider::testing::{Reply, ScriptedTransport};
    use crate::types::Message;

    #[test]
    fn endpoint_carries_key_as_query_parameter() {
        let transport: DynHttpTransport = Arc::new(ScriptedTransport::default());
        let provider = GeminiProvider::new(transport.clone(), Some("g-key".to_string()));
        assert_eq!(
            provider.endpoint("g-key").expect("url"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent?key=g-key"
        );

        let proxied = GeminiProvider::new(transport, Some("g-key".to_string()))
            .with_base_url("http://proxy.local/v1beta/")
            .with_model("models/gemini-1.5-flash");
        assert_eq!(
            proxied.endpoint("a b&c").expect("url"),
            "http://proxy.local/v1beta/models/gemini-1.5-flash:generateContent?key=a+b%26c"
        );
    }

    #[tokio::test]
    async fn chat_posts_contents_and_maps_candidate() {
        let transport = Arc::new(ScriptedTransport::replying(vec![Reply::Json(
            200,
            json!({
                "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Hi there" }] } }],
                "usageMetadata": { "promptTokenCount": 3, "candidatesTokenCount": 2, "totalTokenCount": 5 }
            }),
        )]));
        let provider = GeminiProvider::new(transport.clone(), Some("g-key".to_string()));

        let response = provider
            .chat(ChatRequest::new(vec![
                Message::system("Be brief."),
                Message::user("Hello"),
            ]))
            .await
            .expect("chat");
        assert_eq!(response.content, "Hi there");
        assert_eq!(response.model, "gemini-pro");
        assert_eq!(response.token_count, Some(5));

        let request = transport.last_request();
        assert!(request.url.ends_with(":generateContent?key=g-key"));
        assert!(!request.headers.contains_key("Authorization"));

        let body = transport.last_body();
        assert_eq!(body["contents"][0]["role"], json!("user"));
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], json!("Be brief."));
        assert_eq!(body["generationConfig"]["temperature"], json!(0.7));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], json!(4096));
    }

    #[tokio::test]
    async fn bad_request_surfaces_vendor_message() {
        let transport = Arc::new(ScriptedTransport::replying(vec![Reply::Json(
            400,
            json!({ "error": { "message": "bad request" } }),
        )]));
        let provider = GeminiProvider::new(transport, Some("g-key".to_string()));
        let err = provider
            .chat(ChatRequest::new(vec![Message::user("Hello")]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bad request"));
    }

    #[tokio::test]
    async fn unconfigured_adapter_never_sends() {
        let transport = Arc::new(ScriptedTransport::default());
        let provider = GeminiProvider::new(transport.clone(), None);
        assert!(!provider.is_available());
        assert!(provider.streaming().is_none());

        let err = provider
            .chat(ChatRequest::new(vec![Message::user("Hello")]))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Gemini (Google) is not configured. Please add an API key."
        );
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn non_utf8_error_body_keeps_its_status() {
        let transport = Arc::new(ScriptedTransport::replying(vec![Reply::Raw(
            403,
            vec![0xff, 0xfe, 0xfd],
        )]));
        let provider = GeminiProvider::new(transport, Some("g-key".to_string()));
        let err = provider
            .chat(ChatRequest::new(vec![Message::user("Hello")]))
            .await
            .unwrap_err();
        match err {
            LLMError::Auth { message } => assert_eq!(message, "Gemini API error"),
            other => panic!("expected Auth, got {other:?}"),
        }
    }
}
