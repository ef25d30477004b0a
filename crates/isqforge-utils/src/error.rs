use thiserror::Error;

/// Library-level error type returned by isqforge operations.
///
/// Errors are organized into categories matching the crates that produce
/// them:
///
/// | Category | Description |
/// |----------|-------------|
/// | `Config` | Configuration file or CLI argument errors |
/// | `Llm` | Generative-AI backend failures |
/// | `Export` | Workbook generation failures |
///
/// Library code returns `IsqForgeError` and does NOT call
/// `std::process::exit()`; the CLI maps errors to its exit status.
#[derive(Error, Debug)]
pub enum IsqForgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

/// Errors from the generative-AI backend boundary.
///
/// The workflow controller converts these into the single human-readable
/// error slot shown to the user; nothing below this level surfaces as a
/// structured code.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Provider configuration is invalid (missing API key, missing model)
    #[error("Provider misconfiguration: {0}")]
    Misconfiguration(String),

    /// Network or protocol failure talking to the provider
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The request exceeded the configured deadline
    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The provider answered but the payload did not parse as the
    /// expected structure
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// Unknown provider name or capability
    #[error("Unsupported provider: {0}")]
    Unsupported(String),
}

/// Workbook export errors. These are NOT caught by the workflow
/// controller; they propagate to the host event loop.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_display_includes_reason() {
        let err = LlmError::Transport("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));

        let err = LlmError::Timeout { seconds: 120 };
        assert_eq!(err.to_string(), "Request timed out after 120s");
    }

    #[test]
    fn test_umbrella_error_wraps_categories() {
        let err: IsqForgeError = ConfigError::MissingRequired("model".to_string()).into();
        assert!(err.to_string().starts_with("Configuration error:"));

        let err: IsqForgeError = LlmError::Misconfiguration("no key".to_string()).into();
        assert!(err.to_string().starts_with("LLM backend error:"));

        let err: IsqForgeError = ExportError::Workbook("bad sheet name".to_string()).into();
        assert!(err.to_string().starts_with("Export error:"));
    }

    #[test]
    fn test_config_error_invalid_value_names_key() {
        let err = ConfigError::InvalidValue {
            key: "llm.provider".to_string(),
            value: "carrier-pigeon".to_string(),
        };
        assert!(err.to_string().contains("llm.provider"));
        assert!(err.to_string().contains("carrier-pigeon"));
    }
}
