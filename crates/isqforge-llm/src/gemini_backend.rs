//! Gemini HTTP backend implementation
//!
//! This module provides an HTTP-based LLM backend for Google's Gemini
//! `generateContent` API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
use isqforge_utils::error::LlmError;

/// Default Gemini API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable consulted for the API key when none is configured
const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini backend configuration
#[derive(Clone)]
pub(crate) struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: GenerationParams,
}

/// Generation parameters
#[derive(Debug, Clone)]
pub(crate) struct GenerationParams {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_output_tokens: 2048,
            temperature: 0.2,
        }
    }
}

impl GeminiBackend {
    /// Create a new Gemini backend
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be
    /// constructed
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        default_params: GenerationParams,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_model,
            default_params,
        })
    }

    /// Create a new Gemini backend from configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if:
    /// - The API key environment variable is not set
    /// - No model is configured
    pub fn new_from_config(config: &isqforge_config::Config) -> Result<Self, LlmError> {
        let gemini = config.llm.gemini.as_ref();

        let api_key_env = gemini
            .and_then(|g| g.api_key_env.as_deref())
            .unwrap_or(DEFAULT_API_KEY_ENV);

        let api_key = std::env::var(api_key_env).map_err(|_| {
            LlmError::Misconfiguration(format!(
                "Gemini API key not found in environment variable '{api_key_env}'. \
                 Please set this variable or configure a different api_key_env in [llm.gemini]."
            ))
        })?;

        let base_url = gemini.and_then(|g| g.base_url.clone());

        let default_model = gemini.and_then(|g| g.model.clone()).ok_or_else(|| {
            LlmError::Misconfiguration(
                "Gemini model not specified in configuration. \
                 Please set [llm.gemini] model = \"model-name\"."
                    .to_string(),
            )
        })?;

        let default_params = GenerationParams {
            max_output_tokens: gemini.and_then(|g| g.max_output_tokens).unwrap_or(2048),
            temperature: gemini.and_then(|g| g.temperature).unwrap_or(0.2),
        };

        Self::new(api_key, base_url, default_model, default_params)
    }

    /// Resolve parameters for this invocation.
    ///
    /// `inv.model` overrides the backend default; `inv.metadata` keys
    /// `max_output_tokens` and `temperature` override the configured
    /// generation parameters.
    fn resolve_params(&self, inv: &LlmInvocation) -> (String, GenerationParams) {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };

        let max_output_tokens = inv
            .metadata
            .get("max_output_tokens")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(self.default_params.max_output_tokens);

        let temperature = inv
            .metadata
            .get("temperature")
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
            .unwrap_or(self.default_params.temperature);

        (
            model,
            GenerationParams {
                max_output_tokens,
                temperature,
            },
        )
    }

    /// Convert messages to the Gemini wire format.
    ///
    /// Gemini carries system prompts in a dedicated `systemInstruction`
    /// field and the conversation in a `contents` array whose assistant
    /// role is called `model`. Multiple system messages are concatenated.
    fn convert_messages(messages: &[Message]) -> (Option<GeminiContent>, Vec<GeminiContent>) {
        let mut system_text: Option<String> = None;
        let mut contents = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => {
                    if let Some(existing) = system_text.as_mut() {
                        existing.push_str("\n\n");
                        existing.push_str(&msg.content);
                    } else {
                        system_text = Some(msg.content.clone());
                    }
                }
                Role::User => contents.push(GeminiContent {
                    role: Some("user".to_string()),
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }),
                Role::Assistant => contents.push(GeminiContent {
                    role: Some("model".to_string()),
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }),
            }
        }

        let system_instruction = system_text.map(|text| GeminiContent {
            role: None,
            parts: vec![GeminiPart { text }],
        });

        (system_instruction, contents)
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = self.resolve_params(&inv);

        debug!(
            provider = "gemini",
            operation = %inv.operation,
            model = %model,
            max_output_tokens = params.max_output_tokens,
            temperature = params.temperature,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Gemini backend"
        );

        let (system_instruction, contents) = Self::convert_messages(&inv.messages);

        let request_body = GeminiRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
                // Both wizard operations expect structured JSON back
                response_mime_type: "application/json".to_string(),
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        // Single attempt per user action; the workflow does not retry.
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .timeout(inv.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        seconds: inv.timeout.as_secs(),
                    }
                } else {
                    LlmError::Transport(format!("Gemini request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(300).collect();
            return Err(match status.as_u16() {
                401 | 403 => LlmError::Misconfiguration(format!(
                    "Gemini API rejected the configured key ({status}): {snippet}"
                )),
                _ => LlmError::Transport(format!("Gemini API returned {status}: {snippet}")),
            });
        }

        let response_body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse Gemini response: {e}")))?;

        let mut content_parts = Vec::new();
        for candidate in &response_body.candidates {
            if let Some(content) = &candidate.content {
                for part in &content.parts {
                    if let Some(text) = &part.text {
                        content_parts.push(text.clone());
                    }
                }
            }
        }

        let content = content_parts.join("");

        if content.is_empty() {
            return Err(LlmError::Transport(
                "Gemini response missing text content".to_string(),
            ));
        }

        let mut result = LlmResult::new(content, "gemini", model);

        if let Some(usage) = response_body.usage_metadata {
            result.tokens_input = usage.prompt_token_count;
            result.tokens_output = usage.candidates_token_count;
        }

        debug!(
            provider = "gemini",
            operation = %inv.operation,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Gemini invocation completed"
        );

        Ok(result)
    }
}

/// One content block in a Gemini request or response
#[derive(Debug, Clone, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

/// One text part within a content block
#[derive(Debug, Clone, Serialize)]
struct GeminiPart {
    text: String,
}

/// Generation parameters in the request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: String,
}

/// Gemini request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

/// Gemini response body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

/// One candidate in a Gemini response
#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

/// Candidate content block
#[derive(Debug, Clone, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

/// One part of candidate content
#[derive(Debug, Clone, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_resolve_params_uses_defaults() {
        let backend = GeminiBackend::new(
            "test-key".to_string(),
            None,
            "default-model".to_string(),
            GenerationParams {
                max_output_tokens: 1024,
                temperature: 0.5,
            },
        )
        .unwrap();

        let inv = LlmInvocation::new("profile", "", Duration::from_secs(60), vec![]);

        let (model, params) = backend.resolve_params(&inv);

        assert_eq!(model, "default-model");
        assert_eq!(params.max_output_tokens, 1024);
        assert_eq!(params.temperature, 0.5);
    }

    #[test]
    fn test_resolve_params_overrides_model() {
        let backend = GeminiBackend::new(
            "test-key".to_string(),
            None,
            "default-model".to_string(),
            GenerationParams::default(),
        )
        .unwrap();

        let inv = LlmInvocation::new("profile", "custom-model", Duration::from_secs(60), vec![]);

        let (model, _) = backend.resolve_params(&inv);

        assert_eq!(model, "custom-model");
    }

    #[test]
    fn test_resolve_params_overrides_generation_settings() {
        let backend = GeminiBackend::new(
            "test-key".to_string(),
            None,
            "default-model".to_string(),
            GenerationParams {
                max_output_tokens: 1024,
                temperature: 0.5,
            },
        )
        .unwrap();

        let inv = LlmInvocation::new("profile", "", Duration::from_secs(60), vec![])
            .with_metadata("max_output_tokens", serde_json::json!(4096))
            .with_metadata("temperature", serde_json::json!(0.8));

        let (_, params) = backend.resolve_params(&inv);

        assert_eq!(params.max_output_tokens, 4096);
        assert_eq!(params.temperature, 0.8);
    }

    #[test]
    fn test_convert_messages_separates_system_instruction() {
        let messages = vec![
            Message::system("You are a listing assistant"),
            Message::user("Draft a profile"),
        ];

        let (system, contents) = GeminiBackend::convert_messages(&messages);

        let system = system.unwrap();
        assert_eq!(system.parts[0].text, "You are a listing assistant");
        assert!(system.role.is_none());

        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role.as_deref(), Some("user"));
        assert_eq!(contents[0].parts[0].text, "Draft a profile");
    }

    #[test]
    fn test_convert_messages_concatenates_multiple_system() {
        let messages = vec![
            Message::system("First instruction"),
            Message::system("Second instruction"),
            Message::user("Hello"),
        ];

        let (system, contents) = GeminiBackend::convert_messages(&messages);

        assert_eq!(
            system.unwrap().parts[0].text,
            "First instruction\n\nSecond instruction"
        );
        assert_eq!(contents.len(), 1);
    }

    #[test]
    fn test_convert_messages_maps_assistant_to_model_role() {
        let messages = vec![
            Message::user("Hello"),
            Message::new(Role::Assistant, "Hi there!"),
        ];

        let (system, contents) = GeminiBackend::convert_messages(&messages);

        assert!(system.is_none());
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1].role.as_deref(), Some("model"));
    }

    #[test]
    fn test_new_from_config_missing_api_key() {
        // Use a unique env var name to avoid conflicts with other tests
        let test_env_var = "GEMINI_API_KEY_TEST_MISSING";

        unsafe {
            std::env::remove_var(test_env_var);
        }

        let mut config = isqforge_config::Config::minimal_for_testing();
        config.llm.gemini = Some(isqforge_config::GeminiConfig {
            api_key_env: Some(test_env_var.to_string()),
            base_url: None,
            model: Some("test-model".to_string()),
            max_output_tokens: None,
            temperature: None,
        });

        match GeminiBackend::new_from_config(&config) {
            Err(LlmError::Misconfiguration(msg)) => {
                assert!(
                    msg.contains(test_env_var),
                    "Expected error to mention env var, got: {msg}"
                );
                assert!(
                    msg.contains("not found"),
                    "Expected error to mention 'not found', got: {msg}"
                );
            }
            _ => panic!("Expected Misconfiguration error for missing API key"),
        }
    }

    #[test]
    fn test_new_from_config_missing_model() {
        // Use a unique env var name to avoid conflicts with other tests
        let test_env_var = "GEMINI_API_KEY_TEST_MODEL";

        unsafe {
            std::env::set_var(test_env_var, "test-key");
        }

        let mut config = isqforge_config::Config::minimal_for_testing();
        config.llm.gemini = Some(isqforge_config::GeminiConfig {
            api_key_env: Some(test_env_var.to_string()),
            base_url: None,
            model: None,
            max_output_tokens: None,
            temperature: None,
        });

        match GeminiBackend::new_from_config(&config) {
            Err(LlmError::Misconfiguration(msg)) => {
                assert!(
                    msg.contains("model") || msg.contains("Model"),
                    "Expected error to mention model, got: {msg}"
                );
            }
            _ => panic!("Expected Misconfiguration error for missing model"),
        }

        unsafe {
            std::env::remove_var(test_env_var);
        }
    }
}
