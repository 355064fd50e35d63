//! Vendor-neutral chat data shared by every adapter.
//!
//! Adapters translate these shapes to and from their vendor's wire format, so the
//! hosting application never sees a vendor-specific payload.

use serde::{Deserialize, Serialize};

/// Sampling temperature used when a request leaves it unset.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Completion budget used when a request leaves it unset.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Speaker of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation transcript.
///
/// # Examples
///
/// ```
/// # use llm_switchboard::types::{Message, Role};
/// let msg = Message::user("Hello there");
/// assert_eq!(msg.role, Role::User);
/// assert_eq!(msg.content, "Hello there");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Vendor-neutral chat request.
///
/// `temperature` and `max_tokens` fall back to [`DEFAULT_TEMPERATURE`] and
/// [`DEFAULT_MAX_TOKENS`] per call. `stream` is a hint for the caller's own routing;
/// adapters never switch mode based on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stream: Option<bool>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Temperature to put on the wire for this call.
    pub fn effective_temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Completion budget to put on the wire for this call.
    pub fn effective_max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

/// Normalized result of a blocking chat call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Primary text payload; empty when the vendor returned none.
    pub content: String,
    /// Model identifier as reported by the vendor.
    pub model: String,
    /// Input plus output tokens, when the vendor reports usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u64>,
}

/// Listing entry for a logical model. A snapshot for menus, never used to invoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    pub id: String,
    pub display_name: String,
    pub available: bool,
}

/// Result of separating system instructions from conversational turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitMessages<'a> {
    /// System contents joined by a blank line, `None` when nothing remains.
    pub system: Option<String>,
    /// Non-system turns in their original order.
    pub turns: Vec<&'a Message>,
}

/// Splits `messages` into one system instruction and the remaining turns.
///
/// # Examples
///
/// ```
/// # use llm_switchboard::types::{split_system, Message, Role};
/// let messages = vec![
///     Message::system("Be brief."),
///     Message::user("Hi"),
///     Message::system("Answer in English."),
///     Message::assistant("Hello!"),
/// ];
/// let split = split_system(&messages);
/// assert_eq!(split.system.as_deref(), Some("Be brief.\n\nAnswer in English."));
/// let roles: Vec<Role> = split.turns.iter().map(|m| m.role).collect();
/// assert_eq!(roles, vec![Role::User, Role::Assistant]);
/// ```
pub fn split_system(messages: &[Message]) -> SplitMessages<'_> {
    let mut system_texts = Vec::new();
    let mut turns = Vec::new();
    for message in messages {
        match message.role {
            Role::System => system_texts.push(message.content.as_str()),
            Role::User | Role::Assistant => turns.push(message),
        }
    }
    let joined = system_texts.join("\n\n");
    SplitMessages {
        system: if joined.is_empty() { None } else { Some(joined) },
        turns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_without_system_messages_yields_no_instruction() {
        let messages = vec![Message::user("a"), Message::assistant("b")];
        let split = split_system(&messages);
        assert!(split.system.is_none());
        assert_eq!(split.turns.len(), 2);
    }

    #[test]
    fn split_of_empty_transcript_is_empty() {
        let split = split_system(&[]);
        assert!(split.system.is_none());
        assert!(split.turns.is_empty());
    }

    #[test]
    fn split_keeps_interleaved_turn_order() {
        let messages = vec![
            Message::user("1"),
            Message::system("s1"),
            Message::assistant("2"),
            Message::user("3"),
            Message::system("s2"),
        ];
        let split = split_system(&messages);
        assert_eq!(split.system.as_deref(), Some("s1\n\ns2"));
        let contents: Vec<&str> = split.turns.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["1", "2", "3"]);
    }

    #[test]
    fn split_compares_as_a_whole_value() {
        let messages = vec![Message::system("rules"), Message::user("q")];
        let split = split_system(&messages);
        assert_eq!(
            split,
            SplitMessages {
                system: Some("rules".to_string()),
                turns: vec![&messages[1]],
            }
        );
    }

    #[test]
    fn defaults_apply_only_when_unset() {
        let request = ChatRequest::new(vec![Message::user("hi")]);
        assert_eq!(request.effective_temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(request.effective_max_tokens(), DEFAULT_MAX_TOKENS);

        let request = request.with_temperature(0.0).with_max_tokens(16);
        assert_eq!(request.effective_temperature(), 0.0);
        assert_eq!(request.effective_max_tokens(), 16);
    }

    #[test]
    fn descriptor_serializes_camel_case() {
        let descriptor = ProviderDescriptor {
            id: "claude".to_string(),
            display_name: "Claude (Anthropic)".to_string(),
            available: true,
        };
        let value = serde_json::to_value(&descriptor).expect("serialize");
        assert_eq!(value["displayName"], "Claude (Anthropic)");
        assert_eq!(value["available"], true);
    }

    #[test]
    fn request_deserializes_with_optional_fields_missing() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"messages":[{"role":"user","content":"hi"}],"maxTokens":12}"#,
        )
        .expect("deserialize");
        assert_eq!(request.messages, vec![Message::user("hi")]);
        assert_eq!(request.max_tokens, Some(12));
        assert!(request.temperature.is_none());
        assert!(request.stream.is_none());
    }
}
