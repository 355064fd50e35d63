use std::sync::Arc;

use tracing::debug;

use crate::config::{RegistryConfig, VendorConfig, VendorKind};
use crate::error::LLMError;
use crate::http::DynHttpTransport;
use crate::provider::claude::ClaudeProvider;
use crate::provider::gemini::GeminiProvider;
use crate::provider::openai::OpenAiProvider;
use crate::provider::{ChatStream, DynProvider, LLMProvider};
use crate::types::{ChatRequest, ChatResponse, ProviderDescriptor};

/// Catalog entries listed after the real vendors; they can never be resolved.
const PLACEHOLDERS: [(&str, &str); 3] = [
    ("grok", "Grok (xAI)"),
    ("ostaran-llm", "oStaran LLM"),
    ("ostaran-slm", "oStaran SLM"),
];

enum Slot {
    Adapter(DynProvider),
    Placeholder(String),
}

struct Entry {
    id: String,
    slot: Slot,
}

/// 模型注册表 持有全部 Provider 并按声明顺序维护目录
///
/// Built once at startup and read-only afterwards, so a shared reference can serve any
/// number of concurrent requests.
pub struct ProviderRegistry {
    entries: Vec<Entry>,
}

impl ProviderRegistry {
    /// 创建 Builder 便于注册 Provider
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder {
            entries: Vec::new(),
        }
    }

    /// Builds the standard catalog: `claude`, `openai`, `gemini`, then the placeholders.
    ///
    /// Every vendor adapter is registered; those without a credential in `config` report
    /// unavailable.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_switchboard::config::{RegistryConfig, VendorKind};
    /// use llm_switchboard::http::reqwest::default_dyn_transport;
    /// use llm_switchboard::ProviderRegistry;
    ///
    /// let config = RegistryConfig::default().with_credential(VendorKind::Claude, "sk-ant");
    /// let registry = ProviderRegistry::from_config(&config, default_dyn_transport().unwrap());
    /// let available: Vec<_> = registry
    ///     .list_available_models()
    ///     .into_iter()
    ///     .filter(|model| model.available)
    ///     .map(|model| model.id)
    ///     .collect();
    /// assert_eq!(available, vec!["claude"]);
    /// ```
    pub fn from_config(config: &RegistryConfig, transport: DynHttpTransport) -> Self {
        let mut builder = Self::builder();
        for kind in VendorKind::ALL {
            let vendor = config.vendor(kind).cloned().unwrap_or_default();
            let provider = build_vendor(kind, vendor, transport.clone());
            debug!(
                model = kind.id(),
                available = provider.is_available(),
                "registered vendor adapter"
            );
            builder = builder.register(kind.id(), provider);
        }
        for (id, display_name) in PLACEHOLDERS {
            builder = builder.announce(id, display_name);
        }
        builder.build()
    }

    /// Looks up the adapter behind `model_id`.
    ///
    /// # Errors
    ///
    /// [`LLMError::UnknownModel`] when no adapter is registered under `model_id` (placeholders
    /// included), [`LLMError::Unconfigured`] when the adapter has no credential.
    pub fn resolve(&self, model_id: &str) -> Result<&dyn LLMProvider, LLMError> {
        let provider = self
            .entries
            .iter()
            .find(|entry| entry.id == model_id)
            .and_then(|entry| match &entry.slot {
                Slot::Adapter(provider) => Some(&**provider),
                Slot::Placeholder(_) => None,
            })
            .ok_or_else(|| LLMError::UnknownModel {
                model: model_id.to_string(),
            })?;
        provider.ensure_available()?;
        Ok(provider)
    }

    /// 按声明顺序列出目录及其当前可用性
    pub fn list_available_models(&self) -> Vec<ProviderDescriptor> {
        self.entries
            .iter()
            .map(|entry| match &entry.slot {
                Slot::Adapter(provider) => ProviderDescriptor {
                    id: entry.id.clone(),
                    display_name: provider.display_name().to_string(),
                    available: provider.is_available(),
                },
                Slot::Placeholder(display_name) => ProviderDescriptor {
                    id: entry.id.clone(),
                    display_name: display_name.clone(),
                    available: false,
                },
            })
            .collect()
    }

    /// 解析模型并发送同步聊天请求
    pub async fn chat(&self, model_id: &str, request: ChatRequest) -> Result<ChatResponse, LLMError> {
        self.resolve(model_id)?.chat(request).await
    }

    /// 解析模型并发起流式聊天请求
    ///
    /// # Errors
    ///
    /// Besides the [`resolve`](Self::resolve) failures, [`LLMError::StreamingUnsupported`] for
    /// blocking-only adapters. No request is sent in either case.
    pub async fn stream_chat(
        &self,
        model_id: &str,
        request: ChatRequest,
    ) -> Result<ChatStream, LLMError> {
        let provider = self.resolve(model_id)?;
        let streaming = provider
            .streaming()
            .ok_or(LLMError::StreamingUnsupported {
                provider: provider.name(),
            })?;
        streaming.stream_chat(request).await
    }
}

fn build_vendor(kind: VendorKind, vendor: VendorConfig, transport: DynHttpTransport) -> DynProvider {
    let api_key = vendor.credential().map(str::to_string);
    let VendorConfig { base_url, model, .. } = vendor;

    match kind {
        VendorKind::Claude => {
            let mut provider = ClaudeProvider::new(transport, api_key);
            if let Some(base_url) = base_url {
                provider = provider.with_base_url(base_url);
            }
            if let Some(model) = model {
                provider = provider.with_model(model);
            }
            Arc::new(provider)
        }
        VendorKind::OpenAi => {
            let mut provider = OpenAiProvider::new(transport, api_key);
            if let Some(base_url) = base_url {
                provider = provider.with_base_url(base_url);
            }
            if let Some(model) = model {
                provider = provider.with_model(model);
            }
            Arc::new(provider)
        }
        VendorKind::Gemini => {
            let mut provider = GeminiProvider::new(transport, api_key);
            if let Some(base_url) = base_url {
                provider = provider.with_base_url(base_url);
            }
            if let Some(model) = model {
                provider = provider.with_model(model);
            }
            Arc::new(provider)
        }
    }
}

/// 负责注册 Provider 的 Builder
pub struct ProviderRegistryBuilder {
    entries: Vec<Entry>,
}

impl ProviderRegistryBuilder {
    /// 注册一个模型标识对应的 Provider 重复注册时原位替换
    pub fn register<S: Into<String>>(self, id: S, provider: DynProvider) -> Self {
        self.insert(id.into(), Slot::Adapter(provider))
    }

    /// Lists a catalog entry that has no adapter yet and is always unavailable.
    pub fn announce<S: Into<String>, D: Into<String>>(self, id: S, display_name: D) -> Self {
        self.insert(id.into(), Slot::Placeholder(display_name.into()))
    }

    /// 构建最终的注册表
    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            entries: self.entries,
        }
    }

    fn insert(mut self, id: String, slot: Slot) -> Self {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => entry.slot = slot,
            None => self.entries.push(Entry { id, slot }),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::provider::testing::ScriptedTransport;
    use crate::types::Message;

    /// 只关心可用性的测试 Provider
    struct DummyProvider {
        name: &'static str,
        available: bool,
    }

    #[async_trait]
    impl LLMProvider for DummyProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn display_name(&self) -> &'static str {
            "Dummy"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, LLMError> {
            Ok(ChatResponse {
                content: format!("from {}", self.name),
                model: self.name.to_string(),
                token_count: None,
            })
        }
    }

    fn dummy(name: &'static str, available: bool) -> DynProvider {
        Arc::new(DummyProvider { name, available })
    }

    #[test]
    fn builder_keeps_declaration_order_and_replaces_in_place() {
        let registry = ProviderRegistry::builder()
            .register("b", dummy("b", true))
            .announce("later", "Coming soon")
            .register("a", dummy("a", false))
            .register("b", dummy("b2", false))
            .build();

        let listed = registry.list_available_models();
        let ids: Vec<_> = listed.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "later", "a"]);
        assert!(!listed[0].available);
        assert_eq!(listed[1].display_name, "Coming soon");
        assert!(!listed[1].available);
    }

    #[test]
    fn resolve_distinguishes_unknown_and_unconfigured() {
        let registry = ProviderRegistry::builder()
            .register("on", dummy("on", true))
            .register("off", dummy("off", false))
            .announce("soon", "Soon")
            .build();

        assert_eq!(registry.resolve("on").expect("resolves").name(), "on");
        assert!(matches!(
            registry.resolve("off"),
            Err(LLMError::Unconfigured { display_name: "Dummy" })
        ));
        for id in ["soon", "missing", ""] {
            match registry.resolve(id) {
                Err(LLMError::UnknownModel { model }) => assert_eq!(model, id),
                Err(other) => panic!("expected UnknownModel, got {other:?}"),
                Ok(_) => panic!("{id} should not resolve"),
            }
        }
    }

    #[tokio::test]
    async fn stream_chat_rejects_blocking_only_adapter() {
        let registry = ProviderRegistry::builder()
            .register("plain", dummy("plain", true))
            .build();

        let response = registry
            .chat("plain", ChatRequest::new(vec![Message::user("hi")]))
            .await
            .expect("chat");
        assert_eq!(response.content, "from plain");

        let err = match registry
            .stream_chat("plain", ChatRequest::new(vec![Message::user("hi")]))
            .await
        {
            Ok(_) => panic!("blocking-only adapter must not stream"),
            Err(err) => err,
        };
        assert!(matches!(
            err,
            LLMError::StreamingUnsupported { provider: "plain" }
        ));
    }

    #[test]
    fn from_config_lists_standard_catalog() {
        let transport: DynHttpTransport = Arc::new(ScriptedTransport::default());
        let config = RegistryConfig::default()
            .with_credential(VendorKind::Gemini, "g-key")
            .with_credential(VendorKind::OpenAi, "");
        let registry = ProviderRegistry::from_config(&config, transport);

        let listed: Vec<_> = registry
            .list_available_models()
            .into_iter()
            .map(|d| (d.id, d.display_name, d.available))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("claude".to_string(), "Claude (Anthropic)".to_string(), false),
                ("openai".to_string(), "GPT-4 (OpenAI)".to_string(), false),
                ("gemini".to_string(), "Gemini (Google)".to_string(), true),
                ("grok".to_string(), "Grok (xAI)".to_string(), false),
                ("ostaran-llm".to_string(), "oStaran LLM".to_string(), false),
                ("ostaran-slm".to_string(), "oStaran SLM".to_string(), false),
            ]
        );
    }
}
