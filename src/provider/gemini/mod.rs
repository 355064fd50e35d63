//! Google Gemini `generateContent` adapter. Blocking only.

mod error;
mod provider;
mod request;
mod response;

pub use provider::{DEFAULT_MODEL, GeminiProvider};
