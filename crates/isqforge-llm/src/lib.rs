//! LLM backend abstraction for isqforge
//!
//! This module provides a trait-based system for invoking language models
//! over HTTP. All providers implement the `LlmBackend` trait, allowing the
//! wizard's AI client to work with any provider without knowing
//! implementation details.

mod gemini_backend;
pub mod parse;
mod types;

pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

pub use isqforge_utils::error::LlmError;

pub(crate) use gemini_backend::GeminiBackend;

use isqforge_config::Config;

/// Create an LLM backend from configuration.
///
/// Constructs the backend named by `[llm] provider`; defaults to `gemini`
/// when unset.
///
/// # Errors
///
/// Returns `LlmError::Unsupported` for an unknown provider name and
/// `LlmError::Misconfiguration` when provider-specific configuration is
/// invalid (missing API key or model).
pub fn from_config(config: &Config) -> Result<Box<dyn LlmBackend>, LlmError> {
    let provider = config.llm.provider.as_deref().unwrap_or("gemini");

    match provider {
        "gemini" => {
            let backend = GeminiBackend::new_from_config(config)?;
            Ok(Box::new(backend))
        }
        unknown => Err(LlmError::Unsupported(format!(
            "Unknown LLM provider '{unknown}'. Supported providers: gemini."
        ))),
    }
}
