// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serde types for the Gemini `generateContent` endpoint.
//!
//! Only the fields Herald actually reads and writes; the upstream schema
//! is much larger and everything else is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// A request to `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateRequest {
    /// A request with Herald's standard sampling parameters.
    pub fn new(contents: Vec<Content>, max_output_tokens: u32) -> Self {
        Self {
            contents,
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens,
            },
        }
    }
}

/// One conversation turn. `role` is `"user"` or `"model"`.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            parts: vec![Part::text(text)],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: "model".into(),
            parts: vec![Part::text(text)],
        }
    }

    /// A user turn carrying a caption and an inline binary payload.
    pub fn user_with_inline(text: impl Into<String>, inline: InlineData) -> Self {
        Self {
            role: "user".into(),
            parts: vec![Part::text(text), Part::inline(inline)],
        }
    }
}

/// One part of a turn: text or inline binary data, never both.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(data: InlineData) -> Self {
        Self {
            text: None,
            inline_data: Some(data),
        }
    }
}

/// Base64-encoded binary payload attached to a turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

/// Sampling configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

/// A successful `generateContent` response.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// The text of the first candidate's first part, if any.
    pub fn primary_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

/// The error envelope Gemini returns on non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_camel_case() {
        let request = GenerateRequest::new(vec![Content::user_text("hi")], 1024);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        // Text parts must not carry a null inlineData key.
        assert!(json["contents"][0]["parts"][0].get("inlineData").is_none());
    }

    #[test]
    fn inline_data_serializes_mime_type() {
        let content = Content::user_with_inline(
            "describe this",
            InlineData {
                mime_type: "image/jpeg".into(),
                data: "aGVsbG8=".into(),
            },
        );
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["parts"][1]["inlineData"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn primary_text_walks_the_candidate_tree() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"answer"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.primary_text(), Some("answer"));
    }

    #[test]
    fn primary_text_is_none_without_candidates() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(response.primary_text(), None);

        let response: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(response.primary_text(), None);
    }
}
