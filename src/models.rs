// ============================================================================
// File: src/models.rs
// API request and response models
// ============================================================================

use serde::{Deserialize, Serialize};

/// Speaker of a chat message
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Request body for a new search
#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
}

/// Request body for a chat turn or follow-up
#[derive(Debug, Serialize)]
pub struct MessageRequest<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Response from the answer service proxies.
///
/// Search and follow-up put sources under `results`, chat under `sources`.
#[derive(Debug, Deserialize, Default)]
pub struct AnswerResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<RawSource>>,
    #[serde(default)]
    pub sources: Option<Vec<RawSource>>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Error body returned with a non-2xx status
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Source record as the service sends it; field names vary between endpoints
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawSource {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Canonical web source shown alongside an answer
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Source {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// Host without `www.`; empty when the URL does not parse
    pub domain: String,
    /// Favicon URL for `domain`; empty when the URL does not parse
    pub favicon: String,
}

/// Normalized outcome of a search, follow-up, or chat call
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<Source>,
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_request_omits_missing_session() {
        let body = serde_json::to_value(MessageRequest { message: "hi", session_id: None }).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "hi" }));

        let body =
            serde_json::to_value(MessageRequest { message: "hi", session_id: Some("s1") }).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "hi", "session_id": "s1" }));
    }

    #[test]
    fn response_tolerates_nulls_and_missing_fields() {
        let resp: AnswerResponse =
            serde_json::from_str(r#"{"answer": null, "results": [{"link": "http://x"}]}"#).unwrap();
        assert!(resp.answer.is_none());
        assert!(resp.session_id.is_none());
        let results = resp.results.unwrap();
        assert_eq!(results[0].link.as_deref(), Some("http://x"));
        assert!(results[0].title.is_none());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }
}
