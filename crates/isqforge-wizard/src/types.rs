//! Cross-stage data carried by the wizard.
//!
//! The profile and ISQ shapes are largely service-defined: beyond the
//! handful of fields the wizard itself reads, everything is kept as
//! flattened JSON maps so a provider can add fields without breaking the
//! parsers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User-submitted inquiry content.
///
/// Created once on the input screen submit and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryInput {
    /// Free-form labelled fields (product, category, description, ...)
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Reference URLs consulted during ISQ extraction
    #[serde(default)]
    pub urls: Vec<String>,
}

impl InquiryInput {
    /// Create an empty inquiry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a labelled field
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a reference URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.urls.push(url.into());
        self
    }
}

/// AI-generated structured product profile (the first result set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductProfile {
    /// Short prose summary of the product
    pub summary: String,
    /// Service-defined detail fields (specifications, applications, ...)
    #[serde(flatten)]
    pub details: BTreeMap<String, serde_json::Value>,
}

/// A single extracted ISQ record.
///
/// The field set is owned by the AI service; the wizard only peeks at a
/// few conventional keys for display purposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Isq {
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Isq {
    /// Best-effort display label: the first conventional name-like field.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        ["name", "question", "label"]
            .iter()
            .find_map(|key| self.get_str(key))
    }

    /// Fetch a field as a string slice, if present and a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}

/// The grouped ISQ result set (the second result set).
///
/// `keys` and `buyers` preserve the order the service returned them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsqBundle {
    /// The single configuration record
    pub config: Isq,
    /// Ordered key ISQs
    #[serde(default)]
    pub keys: Vec<Isq>,
    /// Ordered buyer ISQs
    #[serde(default)]
    pub buyers: Vec<Isq>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_keeps_unknown_fields() {
        let profile: ProductProfile = serde_json::from_value(json!({
            "summary": "Industrial ball valve",
            "specifications": ["DN50", "PN16"],
            "hsn_code": "8481"
        }))
        .unwrap();

        assert_eq!(profile.summary, "Industrial ball valve");
        assert_eq!(profile.details.len(), 2);
        assert!(profile.details.contains_key("hsn_code"));

        let round_trip = serde_json::to_value(&profile).unwrap();
        assert_eq!(round_trip["specifications"][0], "DN50");
    }

    #[test]
    fn test_isq_label_prefers_name() {
        let isq: Isq = serde_json::from_value(json!({
            "name": "Size",
            "question": "What size do you need?"
        }))
        .unwrap();
        assert_eq!(isq.label(), Some("Size"));

        let isq: Isq = serde_json::from_value(json!({"question": "Colour?"})).unwrap();
        assert_eq!(isq.label(), Some("Colour?"));

        let isq: Isq = serde_json::from_value(json!({"options": ["a", "b"]})).unwrap();
        assert_eq!(isq.label(), None);
    }

    #[test]
    fn test_bundle_preserves_order() {
        let bundle: IsqBundle = serde_json::from_value(json!({
            "config": {"name": "Packaging"},
            "keys": [{"name": "k1"}, {"name": "k2"}],
            "buyers": [{"name": "b1"}]
        }))
        .unwrap();

        assert_eq!(bundle.keys.len(), 2);
        assert_eq!(bundle.keys[0].label(), Some("k1"));
        assert_eq!(bundle.keys[1].label(), Some("k2"));
        assert_eq!(bundle.buyers[0].label(), Some("b1"));
    }

    #[test]
    fn test_bundle_missing_lists_default_empty() {
        let bundle: IsqBundle =
            serde_json::from_value(json!({"config": {"name": "Packaging"}})).unwrap();
        assert!(bundle.keys.is_empty());
        assert!(bundle.buyers.is_empty());
    }

    #[test]
    fn test_inquiry_builder() {
        let input = InquiryInput::new()
            .with_field("product", "Ball valve")
            .with_url("https://example.com/catalog");

        assert_eq!(input.fields.get("product").map(String::as_str), Some("Ball valve"));
        assert_eq!(input.urls.len(), 1);
    }
}
