//! OpenAI Chat Completions adapter.

mod error;
mod provider;
mod request;
mod response;
mod stream;

pub use provider::{DEFAULT_MODEL, OpenAiProvider};
