//! Structured payload extraction from raw model output.
//!
//! Model responses are requested as JSON, but providers still occasionally
//! wrap the object in markdown code fences or surrounding whitespace. This
//! module normalizes the raw text and deserializes it into the caller's
//! expected type.

use serde::de::DeserializeOwned;

use isqforge_utils::error::LlmError;

/// Strip a surrounding markdown code fence, if present.
///
/// Handles both ``` and ```json openers. Text without a fence is returned
/// trimmed and otherwise untouched.
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string on the opening fence line
    let body = match rest.split_once('\n') {
        Some((_info, body)) => body,
        None => return trimmed,
    };

    match body.rfind("```") {
        Some(idx) => body[..idx].trim(),
        None => body.trim(),
    }
}

/// Parse a typed JSON payload out of raw model output.
///
/// # Errors
///
/// Returns `LlmError::MalformedResponse` with a short excerpt of the
/// offending text when deserialization fails.
pub fn parse_json_payload<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    let payload = strip_code_fences(raw);
    serde_json::from_str(payload).map_err(|e| {
        let excerpt: String = payload.chars().take(200).collect();
        LlmError::MalformedResponse(format!("{e} (response began: {excerpt:?})"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        summary: String,
    }

    #[test]
    fn test_plain_json_parses() {
        let parsed: Sample = parse_json_payload(r#"{"summary": "X"}"#).unwrap();
        assert_eq!(parsed.summary, "X");
    }

    #[test]
    fn test_fenced_json_parses() {
        let raw = "```json\n{\"summary\": \"fenced\"}\n```";
        let parsed: Sample = parse_json_payload(raw).unwrap();
        assert_eq!(parsed.summary, "fenced");
    }

    #[test]
    fn test_fence_without_language_tag() {
        let raw = "```\n{\"summary\": \"plain fence\"}\n```";
        let parsed: Sample = parse_json_payload(raw).unwrap();
        assert_eq!(parsed.summary, "plain fence");
    }

    #[test]
    fn test_surrounding_whitespace_tolerated() {
        let parsed: Sample = parse_json_payload("\n\n  {\"summary\": \"padded\"}  \n").unwrap();
        assert_eq!(parsed.summary, "padded");
    }

    #[test]
    fn test_garbage_is_malformed_response() {
        let err = parse_json_payload::<Sample>("I have created a profile for you!").unwrap_err();
        match err {
            LlmError::MalformedResponse(msg) => {
                assert!(msg.contains("response began"));
            }
            other => panic!("Expected MalformedResponse, got {other}"),
        }
    }

    #[test]
    fn test_strip_fences_is_noop_without_fence() {
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }
}
