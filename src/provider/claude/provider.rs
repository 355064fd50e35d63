use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::LLMError;
use crate::http::{DynHttpTransport, HttpResponse, post_json, post_json_stream};
use crate::provider::{ChatStream, LLMProvider, StreamingProvider, VendorClient};
use crate::stream::text_stream;
use crate::types::{ChatRequest, ChatResponse};

use super::error::parse_claude_error;
use super::request::build_claude_body;
use super::response::{ClaudeMessageResponse, map_response};
use super::stream::parse_claude_frame;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const DISPLAY_NAME: &str = "Claude (Anthropic)";

/// Model sent when the adapter is not given another one.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic Messages adapter with streaming support.
pub struct ClaudeProvider {
    client: Option<VendorClient>,
    base_url: String,
    model: String,
}

impl ClaudeProvider {
    /// 使用默认 base_url 与模型创建 Provider 空密钥视为未配置
    pub fn new(transport: DynHttpTransport, api_key: Option<String>) -> Self {
        Self {
            client: VendorClient::connect(transport, api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// 自定义 base_url，便于接入代理或兼容层
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 设置请求使用的模型名称
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub(crate) fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{base}/messages")
        } else {
            format!("{base}/v1/messages")
        }
    }

    fn client(&self) -> Result<&VendorClient, LLMError> {
        self.client.as_ref().ok_or(LLMError::Unconfigured {
            display_name: DISPLAY_NAME,
        })
    }

    fn build_headers(client: &VendorClient) -> HashMap<String, String> {
        HashMap::from([
            ("x-api-key".to_string(), client.api_key.clone()),
            ("anthropic-version".to_string(), API_VERSION.to_string()),
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
        Err(parse_claude_error(
            status,
            &String::from_utf8_lossy(&response.body),
            retry_after,
        ))
    }

    fn try_parse<T: DeserializeOwned>(&self, text: &str) -> Result<T, LLMError> {
        serde_json::from_str(text).map_err(|err| {
            LLMError::provider(self.name(), format!("failed to parse Anthropic response: {err}"))
        })
    }
}

#[async_trait]
impl LLMProvider for ClaudeProvider {
    fn name(&self) -> &'static str {
        "claude"
    }

    fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    fn is_available(&self) -> bool {
        self.client.is_some()
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LLMError> {
        let client = self.client()?;
        let body = build_claude_body(&request, &self.model, false);
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
        let parsed: ClaudeMessageResponse = self.try_parse(&text)?;
        let mapped = map_response(parsed, &self.model);
        debug!(
            provider = self.name(),
            model = %mapped.model,
            tokens = ?mapped.token_count,
            "chat response received"
        );
        Ok(mapped)
    }

    fn streaming(&self) -> Option<&dyn StreamingProvider> {
        Some(self)
    }
}

#[async_trait]
impl StreamingProvider for ClaudeProvider {
    async fn stream_chat(&self, request: ChatRequest) -> Result<ChatStream, LLMError> {
        let client = self.client()?;
        let body = build_claude_body(&request, &self.model, true);
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
            return Err(parse_claude_error(status, &text, retry_after));
        }
        Ok(text_stream(response.body, self.name(), parse_claude_frame))
    }
}
