//! 多厂商 LLM 聊天接口的统一调用层
//!
//! A [`ProviderRegistry`] owns one adapter per vendor and resolves a logical model name
//! (`"claude"`, `"openai"`, `"gemini"`, ...) to an [`LLMProvider`] that speaks the shared
//! [`ChatRequest`]/[`ChatResponse`] contract.

pub mod config;
pub mod error;
pub mod http;
pub mod provider;
pub mod registry;
pub mod stream;
pub mod tokens;
pub mod types;

pub use config::{RegistryConfig, VendorConfig, VendorKind};
pub use error::LLMError;
pub use provider::{ChatStream, DynProvider, LLMProvider, StreamingProvider};
pub use registry::ProviderRegistry;
pub use types::*;
