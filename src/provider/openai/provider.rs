use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::LLMError;
use crate::http::{DynHttpTransport, HttpResponse, post_json, post_json_stream};
use crate::provider::{ChatStream, LLMProvider, StreamingProvider, VendorClient};
use crate::stream::text_stream;
use crate::types::{ChatRequest, ChatResponse};

use super::error::parse_openai_error;
use super::request::build_openai_body;
use super::response::{OpenAiChatResponse, map_response};
use super::stream::parse_openai_frame;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DISPLAY_NAME: &str = "GPT-4 (OpenAI)";

pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

/// OpenAI Chat Completions Provider
pub struct OpenAiProvider {
    client: Option<VendorClient>,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    /// 创建带默认 base_url 的 Provider
    pub fn new(transport: DynHttpTransport, api_key: Option<String>) -> Self {
        Self {
            client: VendorClient::connect(transport, api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// 自定义 base_url
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 设置模型
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub(crate) fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{base}/chat/completions")
        } else {
            format!("{base}/v1/chat/completions")
        }
    }

    fn client(&self) -> Result<&VendorClient, LLMError> {
        self.client.as_ref().ok_or(LLMError::Unconfigured {
            display_name: DISPLAY_NAME,
        })
    }

    fn build_headers(client: &VendorClient) -> HashMap<String, String> {
        HashMap::from([
            (
                "Authorization".to_string(),
                format!("Bearer {}", client.api_key),
            ),
            ("Accept".to_string(), "application/json".to_string()),
        ])
    }

    fn ensure_success(&self, response: HttpResponse) -> Result<String, LLMError> {
        if response.is_success() {
            return response.into_string();
        }
        let status = response.status;
        let retry_after = response.retry_after();
        warn!(provider = self.name(), status, "vendor rejected chat request");
        Err(parse_openai_error(
            status,
            &String::from_utf8_lossy(&response.body),
            retry_after,
        ))
    }

    fn try_parse<T: DeserializeOwned>(&self, text: &str) -> Result<T, LLMError> {
        serde_json::from_str(text).map_err(|err| {
            LLMError::provider(self.name(), format!("failed to parse OpenAI response: {err}"))
        })
    }
}

#[async_trait]
impl LLMProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    fn is_available(&self) -> bool {
        self.client.is_some()
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LLMError> {
        let client = self.client()?;
        let body = build_openai_body(&request, &self.model, false);
        debug!(
            provider = self.name(),
            model = %self.model,
            messages = request.messages.len(),
            "sending chat request"
        );
        let response = post_json(
            client.transport.as_ref(),
            self.endpoint(),
            Self::build_headers(client),
            &body,
        )
        .await?;
        let text = self.ensure_success(response)?;
        let parsed: OpenAiChatResponse = self.try_parse(&text)?;
        Ok(map_response(parsed, &self.model))
    }

    fn streaming(&self) -> Option<&dyn StreamingProvider> {
        Some(self)
    }
}

#[async_trait]
impl StreamingProvider for OpenAiProvider {
    async fn stream_chat(&self, request: ChatRequest) -> Result<ChatStream, LLMError> {
        let client = self.client()?;
        let body = build_openai_body(&request, &self.model, true);
        debug!(
            provider = self.name(),
            model = %self.model,
            messages = request.messages.len(),
            "opening chat stream"
        );
        let response = post_json_stream(
            client.transport.as_ref(),
            self.endpoint(),
            Self::build_headers(client),
            &body,
        )
        .await?;
        if !response.is_success() {
            let status = response.status;
            let retry_after = response.retry_after();
            let text = response.collect_text().await?;
            warn!(provider = self.name(), status, "vendor rejected stream request");
            return Err(parse_openai_error(status, &text, retry_after));
        }
        Ok(text_stream(response.body, self.name(), parse_openai_frame))
    }
}
