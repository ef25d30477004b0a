//! AI client seam for the wizard.
//!
//! The controller talks to [`InquiryAi`]; the production implementation
//! bridges to an [`LlmBackend`], building the two prompts and parsing the
//! JSON payloads back into typed result sets. A canned [`DryRunAi`] serves
//! `--dry-run` sessions.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::types::{InquiryInput, Isq, IsqBundle, ProductProfile};
use isqforge_config::Config;
use isqforge_llm::{LlmBackend, LlmInvocation, Message, parse::parse_json_payload};
use isqforge_utils::error::LlmError;

/// The two operations the wizard needs from a generative-AI service.
#[async_trait]
pub trait InquiryAi: Send + Sync {
    /// Generate the structured product profile from the inquiry.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` on transport, timeout, or payload failures.
    async fn generate_profile(&self, input: &InquiryInput) -> Result<ProductProfile, LlmError>;

    /// Extract the ISQ bundle from the inquiry and its reference URLs.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` on transport, timeout, or payload failures.
    async fn extract_isqs(
        &self,
        input: &InquiryInput,
        urls: &[String],
    ) -> Result<IsqBundle, LlmError>;
}

const JSON_OUTPUT_RULES: &str = "

CRITICAL OUTPUT RULES - YOU MUST FOLLOW THESE:
1. Respond with a single JSON object and nothing else
2. Do NOT wrap the object in markdown code fences
3. Do NOT add prose, greetings, or explanations before or after the object
4. Do NOT describe what the object contains - BE the object
5. Every value must be valid JSON (strings, numbers, arrays, objects)";

const PROFILE_SYSTEM: &str =
    "You are a product listing assistant for a B2B marketplace. You turn a \
     seller's rough inquiry into a clean, structured product profile.";

const ISQ_SYSTEM: &str =
    "You are a product listing assistant for a B2B marketplace. You derive \
     ISQs (item-specific questions a buyer answers when enquiring about a \
     product) from a seller's inquiry and its reference pages.";

fn render_inquiry(input: &InquiryInput) -> String {
    let mut out = String::new();
    for (key, value) in &input.fields {
        let _ = writeln!(out, "{key}: {value}");
    }
    if out.is_empty() {
        out.push_str("(no fields provided)\n");
    }
    out
}

fn profile_prompt(input: &InquiryInput) -> String {
    format!(
        r#"# Inquiry

{}
# Your Task

Produce a product profile as a JSON object with this shape:

{{
  "summary": "one or two sentences describing the product",
  "specifications": ["notable specification", "..."],
  "applications": ["typical application", "..."]
}}

You may add further string or array fields when the inquiry supports them
(for example "material", "hsn_code", "packaging"). Omit fields you cannot
ground in the inquiry; never invent specifics.{}"#,
        render_inquiry(input),
        JSON_OUTPUT_RULES,
    )
}

fn isq_prompt(input: &InquiryInput, urls: &[String]) -> String {
    let mut url_list = String::new();
    for url in urls {
        let _ = writeln!(url_list, "- {url}");
    }
    if url_list.is_empty() {
        url_list.push_str("(none provided)\n");
    }

    format!(
        r#"# Inquiry

{}
# Reference URLs

{}
# Your Task

Derive the ISQs for this product as a JSON object with this shape:

{{
  "config": {{ "name": "...", "options": ["..."] }},
  "keys": [ {{ "name": "...", "options": ["..."] }} ],
  "buyers": [ {{ "name": "...", "options": ["..."] }} ]
}}

"config" is the single configuration question, "keys" the ordered key
questions, "buyers" the ordered buyer-side questions. Each record needs at
least a "name"; add "options", "unit", or other fields when applicable.
Keep both lists in order of importance.{}"#,
        render_inquiry(input),
        url_list,
        JSON_OUTPUT_RULES,
    )
}

/// Production [`InquiryAi`] over a generic LLM backend.
pub struct LlmInquiryAi {
    backend: Box<dyn LlmBackend>,
    timeout: Duration,
}

impl LlmInquiryAi {
    /// Wrap an existing backend.
    #[must_use]
    pub fn new(backend: Box<dyn LlmBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Construct the backend named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` when the backend cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let backend = isqforge_llm::from_config(config)?;
        Ok(Self::new(backend, config.request_timeout()))
    }

    async fn invoke_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        system: &str,
        prompt: String,
    ) -> Result<T, LlmError> {
        let messages = vec![Message::system(system), Message::user(prompt)];
        let inv = LlmInvocation::new(operation, "", self.timeout, messages);
        let result = self.backend.invoke(inv).await?;
        debug!(
            operation,
            provider = %result.provider,
            model = %result.model_used,
            "model call completed"
        );
        parse_json_payload(&result.raw_response)
    }
}

#[async_trait]
impl InquiryAi for LlmInquiryAi {
    async fn generate_profile(&self, input: &InquiryInput) -> Result<ProductProfile, LlmError> {
        self.invoke_json("profile", PROFILE_SYSTEM, profile_prompt(input))
            .await
    }

    async fn extract_isqs(
        &self,
        input: &InquiryInput,
        urls: &[String],
    ) -> Result<IsqBundle, LlmError> {
        self.invoke_json("isq-extraction", ISQ_SYSTEM, isq_prompt(input, urls))
            .await
    }
}

/// Canned client for `--dry-run` sessions: no network, deterministic
/// output shaped like real service responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunAi;

impl DryRunAi {
    fn product_name(input: &InquiryInput) -> String {
        input
            .fields
            .get("product")
            .cloned()
            .unwrap_or_else(|| "Sample product".to_string())
    }
}

#[async_trait]
impl InquiryAi for DryRunAi {
    async fn generate_profile(&self, input: &InquiryInput) -> Result<ProductProfile, LlmError> {
        // Brief pause so the loading indicator is visible in the wizard
        tokio::time::sleep(Duration::from_millis(300)).await;

        let name = Self::product_name(input);
        let mut details = std::collections::BTreeMap::new();
        details.insert(
            "specifications".to_string(),
            serde_json::json!(["Dry-run specification A", "Dry-run specification B"]),
        );
        details.insert(
            "applications".to_string(),
            serde_json::json!(["General industrial use"]),
        );

        Ok(ProductProfile {
            summary: format!("{name} (dry-run profile; no model was contacted)"),
            details,
        })
    }

    async fn extract_isqs(
        &self,
        _input: &InquiryInput,
        urls: &[String],
    ) -> Result<IsqBundle, LlmError> {
        tokio::time::sleep(Duration::from_millis(300)).await;

        let isq = |name: &str, options: &[&str]| {
            let mut record = Isq::default();
            record
                .fields
                .insert("name".to_string(), serde_json::json!(name));
            record
                .fields
                .insert("options".to_string(), serde_json::json!(options));
            record
        };

        Ok(IsqBundle {
            config: isq("Packaging Type", &["Box", "Crate", "Loose"]),
            keys: vec![
                isq("Size", &["Small", "Medium", "Large"]),
                isq("Material", &["Steel", "Brass"]),
            ],
            buyers: vec![isq(
                &format!("Quantity required ({} reference pages)", urls.len()),
                &["< 100", "100-1000", "> 1000"],
            )],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_prompt_carries_inquiry_fields() {
        let input = InquiryInput::new()
            .with_field("product", "Ball valve")
            .with_field("category", "Valves");

        let prompt = profile_prompt(&input);
        assert!(prompt.contains("product: Ball valve"));
        assert!(prompt.contains("category: Valves"));
        assert!(prompt.contains("CRITICAL OUTPUT RULES"));
    }

    #[test]
    fn test_isq_prompt_lists_urls() {
        let input = InquiryInput::new().with_field("product", "Ball valve");
        let urls = vec!["http://a".to_string(), "http://b".to_string()];

        let prompt = isq_prompt(&input, &urls);
        assert!(prompt.contains("- http://a"));
        assert!(prompt.contains("- http://b"));
        assert!(prompt.contains("\"config\""));
    }

    #[test]
    fn test_isq_prompt_without_urls() {
        let input = InquiryInput::new();
        let prompt = isq_prompt(&input, &[]);
        assert!(prompt.contains("(none provided)"));
        assert!(prompt.contains("(no fields provided)"));
    }

    #[tokio::test]
    async fn test_dry_run_profile_mentions_product() {
        let input = InquiryInput::new().with_field("product", "Ball valve");
        let profile = DryRunAi.generate_profile(&input).await.unwrap();
        assert!(profile.summary.contains("Ball valve"));
        assert!(profile.details.contains_key("specifications"));
    }

    #[tokio::test]
    async fn test_dry_run_bundle_shape() {
        let input = InquiryInput::new();
        let bundle = DryRunAi
            .extract_isqs(&input, &["http://a".to_string()])
            .await
            .unwrap();
        assert_eq!(bundle.config.label(), Some("Packaging Type"));
        assert_eq!(bundle.keys.len(), 2);
        assert_eq!(bundle.buyers.len(), 1);
    }
}
