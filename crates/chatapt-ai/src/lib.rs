//! chatapt-ai: generation client for the Gemini REST API
//!
//! This crate turns a windowed conversation history into a `generateContent`
//! request and hands back the decoded completion, or a single error value
//! describing why no completion is available.

pub mod error;
pub mod providers;
pub mod types;

pub use error::{Error, Result};
pub use providers::GenerationClient;
pub use providers::gemini::GeminiClient;
pub use types::*;
