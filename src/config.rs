use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 可配置的供应商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorKind {
    Claude,
    #[serde(rename = "openai")]
    OpenAi,
    Gemini,
}

impl VendorKind {
    /// Catalog order used by the registry.
    pub const ALL: [VendorKind; 3] = [VendorKind::Claude, VendorKind::OpenAi, VendorKind::Gemini];

    /// 注册表中的模型标识
    pub fn id(self) -> &'static str {
        match self {
            VendorKind::Claude => "claude",
            VendorKind::OpenAi => "openai",
            VendorKind::Gemini => "gemini",
        }
    }

    /// 读取密钥的环境变量名
    pub fn env_var(self) -> &'static str {
        match self {
            VendorKind::Claude => "ANTHROPIC_API_KEY",
            VendorKind::OpenAi => "OPENAI_API_KEY",
            VendorKind::Gemini => "GOOGLE_API_KEY",
        }
    }
}

/// 单个供应商的设置 全部可选
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// 缺失或为空时该供应商不可用
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// 覆盖默认模型 例如 `gpt-4o`
    pub model: Option<String>,
}

impl VendorConfig {
    /// Returns the key only when it is non-empty.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }
}

/// Per-vendor settings handed to [`crate::ProviderRegistry::from_config`].
///
/// Deserializes from a map keyed by vendor, e.g. in TOML:
///
/// ```toml
/// [claude]
/// api_key = "sk-ant-..."
///
/// [gemini]
/// api_key = "AIza..."
/// model = "gemini-1.5-flash"
/// ```
///
/// Vendors that are absent are registered but unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryConfig {
    vendors: HashMap<VendorKind, VendorConfig>,
}

impl RegistryConfig {
    /// Reads `ANTHROPIC_API_KEY`, `OPENAI_API_KEY` and `GOOGLE_API_KEY` from the process
    /// environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the credential set from an arbitrary variable lookup.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_switchboard::config::{RegistryConfig, VendorKind};
    ///
    /// let config = RegistryConfig::from_lookup(|name| {
    ///     (name == "ANTHROPIC_API_KEY").then(|| "sk-ant".to_string())
    /// });
    /// assert_eq!(config.vendor(VendorKind::Claude).and_then(|v| v.credential()), Some("sk-ant"));
    /// assert!(config.vendor(VendorKind::Gemini).is_none());
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        VendorKind::ALL
            .into_iter()
            .fold(Self::default(), |config, kind| {
                match lookup(kind.env_var()).filter(|key| !key.is_empty()) {
                    Some(key) => config.with_credential(kind, key),
                    None => config,
                }
            })
    }

    /// 设置某个供应商的密钥 保留其余字段
    pub fn with_credential(mut self, kind: VendorKind, api_key: impl Into<String>) -> Self {
        self.vendors.entry(kind).or_default().api_key = Some(api_key.into());
        self
    }

    /// 整体替换某个供应商的配置
    pub fn with_vendor(mut self, kind: VendorKind, vendor: VendorConfig) -> Self {
        self.vendors.insert(kind, vendor);
        self
    }

    pub fn vendor(&self, kind: VendorKind) -> Option<&VendorConfig> {
        self.vendors.get(&kind)
    }
}
