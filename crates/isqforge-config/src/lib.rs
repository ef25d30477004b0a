//! Configuration management for isqforge
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. Supports TOML configuration files with `[llm]`,
//! `[llm.gemini]`, and `[export]` sections.

mod config;

pub use config::{Config, ExportConfig, GeminiConfig, LlmConfig};
