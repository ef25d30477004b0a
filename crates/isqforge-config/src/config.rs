use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use isqforge_utils::error::ConfigError;

/// Default per-request deadline for model calls, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Top-level configuration model.
///
/// Loaded from `isqforge.toml`, then selectively overridden by CLI flags.
/// Every field is optional in the file; consumers resolve defaults at the
/// point of use.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// LLM provider selection and parameters
    #[serde(default)]
    pub llm: LlmConfig,
    /// Workbook export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// `[llm]` section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Provider name; defaults to "gemini" when unset
    pub provider: Option<String>,
    /// Per-request deadline in seconds for model calls
    pub request_timeout_secs: Option<u64>,
    /// Gemini provider settings
    pub gemini: Option<GeminiConfig>,
}

/// `[llm.gemini]` section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// Environment variable holding the API key (default: GEMINI_API_KEY)
    pub api_key_env: Option<String>,
    /// Override for the API base URL
    pub base_url: Option<String>,
    /// Model name, e.g. "gemini-2.0-flash"
    pub model: Option<String>,
    /// Generation cap on output tokens
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

/// `[export]` section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Directory workbooks are written to (default: current directory)
    pub output_dir: Option<PathBuf>,
    /// File name stem for exported workbooks (default: "isqforge")
    pub file_stem: Option<String>,
}

impl Config {
    /// Configuration file name searched for during discovery
    pub const FILE_NAME: &'static str = "isqforge.toml";

    /// Discover and load configuration.
    ///
    /// Precedence of sources:
    /// 1. An explicit path (from `--config`); it is an error if missing.
    /// 2. `isqforge.toml` found by searching upward from the current
    ///    directory.
    /// 3. The user configuration directory (`<config>/isqforge/config.toml`).
    /// 4. Built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` for a missing explicit path, or
    /// `ConfigError::InvalidFile` when a discovered file fails to parse.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                });
            }
            return Self::load_file(path);
        }

        if let Ok(cwd) = env::current_dir()
            && let Some(found) = Self::search_upward(&cwd)
        {
            return Self::load_file(&found);
        }

        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            return Self::load_file(&user_path);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFile` when the file cannot be read or
    /// parsed.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidFile(format!("{}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFile` on parse failure.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::InvalidFile(e.to_string()))
    }

    /// The per-request deadline applied to model calls.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.llm
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Search upward from `start` for `isqforge.toml`.
    fn search_upward(start: &Path) -> Option<PathBuf> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            let candidate = current.join(Self::FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = current.parent();
        }
        None
    }

    /// Path of the per-user configuration file, when a config dir exists.
    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("isqforge").join("config.toml"))
    }

    /// A minimal configuration for tests. Not wired to any file or
    /// environment lookup.
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Self {
            llm: LlmConfig {
                provider: Some("gemini".to_string()),
                request_timeout_secs: Some(5),
                gemini: None,
            },
            export: ExportConfig::default(),
        }
    }
}
