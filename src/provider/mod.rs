use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::LLMError;
use crate::http::DynHttpTransport;
use crate::types::{ChatRequest, ChatResponse};

pub mod claude;
pub mod gemini;
pub mod openai;

/// 流式响应别名 按顺序产出文本片段
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<String, LLMError>> + Send>>;

/// 统一的 Provider Trait 所有供应商实现该接口即可接入
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// 供应商标识 例如 `claude`
    fn name(&self) -> &'static str;

    /// 面向用户的展示名称
    fn display_name(&self) -> &'static str;

    /// 构造时是否拿到了非空凭证
    fn is_available(&self) -> bool;

    /// Fails with [`LLMError::Unconfigured`] when the adapter has no credential.
    fn ensure_available(&self) -> Result<(), LLMError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(LLMError::Unconfigured {
                display_name: self.display_name(),
            })
        }
    }

    /// 提交完整请求并等待完整响应
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LLMError>;

    /// Streaming capability, `None` for blocking-only adapters.
    fn streaming(&self) -> Option<&dyn StreamingProvider> {
        None
    }
}

/// Adapters that can deliver a response as incremental text fragments.
#[async_trait]
pub trait StreamingProvider: LLMProvider {
    /// Starts a streamed completion.
    ///
    /// The returned stream yields text deltas in vendor order and ends when the vendor
    /// finishes. Dropping it early closes the underlying HTTP response.
    async fn stream_chat(&self, request: ChatRequest) -> Result<ChatStream, LLMError>;
}

/// 线程安全 Provider
pub type DynProvider = Arc<dyn LLMProvider>;

/// Transport plus credential, present only when the adapter is configured.
#[derive(Clone)]
pub(crate) struct VendorClient {
    pub(crate) transport: DynHttpTransport,
    pub(crate) api_key: String,
}

impl VendorClient {
    /// Returns a client only for a non-empty key.
    pub(crate) fn connect(transport: DynHttpTransport, api_key: Option<String>) -> Option<Self> {
        api_key
            .filter(|key| !key.is_empty())
            .map(|api_key| Self { transport, api_key })
    }
}

/// Adds separately reported token counters; `None` only when neither was reported.
pub(crate) fn sum_tokens(input: Option<u64>, output: Option<u64>) -> Option<u64> {
    match (input, output) {
        (None, None) => None,
        (input, output) => Some(input.unwrap_or(0) + output.unwrap_or(0)),
    }
}
