//! Anthropic Messages API adapter.

mod error;
mod provider;
mod request;
mod response;
mod stream;

pub use provider::{ClaudeProvider, DEFAULT_MODEL};
