//! Shared infrastructure for isqforge: the library error taxonomy and the
//! tracing initialization used by the CLI.

pub mod error;
pub mod logging;

pub use error::{ConfigError, ExportError, IsqForgeError, LlmError};
