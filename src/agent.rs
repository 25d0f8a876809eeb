//! Gemini client for summarizing extracted race data.
//!
//! Talks to the Generative Language REST API directly over reqwest.

pub use crate::summary::Summary;

use crate::config::AgentConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("missing API key: set {}", crate::config::API_KEY_VAR)]
    MissingApiKey,
    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API key rejected ({0})")]
    Unauthorized(StatusCode),
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("Gemini API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
    #[error("failed to parse response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("model returned no text{}", reason_suffix(.reason))]
    EmptyResponse { reason: Option<String> },
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(" ({r})"))
        .unwrap_or_default()
}

/// The two model tiers the summarizer can use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Flash,
    Pro,
}

impl Model {
    /// Select a tier by name: anything containing "pro" is Pro, everything else Flash
    pub fn select(name: &str) -> Self {
        if name.contains("pro") {
            Model::Pro
        } else {
            Model::Flash
        }
    }

    /// Model identifier used in the endpoint path
    pub fn id(self) -> &'static str {
        match self {
            Model::Flash => "gemini-1.5-flash-latest",
            Model::Pro => "gemini-1.5-pro-latest",
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

/// One alternative response from the model
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One fragment of a candidate's content
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Part {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Prefix the instruction to the extracted text
pub fn build_prompt(instruction: &str, text: &str) -> String {
    format!("{} {}", instruction, text)
}

/// Join the text of every part of every candidate with newlines, in order
pub fn flatten_candidates(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .flat_map(|c| c.content.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Gemini summarization client.
pub struct Summarizer {
    client: Client,
    api_key: String,
    model: Model,
    instruction: String,
    base_url: String,
}

impl Summarizer {
    /// Build a client; fails without an API key before any request is made
    pub fn new(config: &AgentConfig, api_key: Option<&str>) -> Result<Self, AgentError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(AgentError::MissingApiKey)?;

        let client = Client::builder().build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: Model::select(&config.model),
            instruction: config.instruction.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> Model {
        self.model
    }

    /// Summarize `text` with the selected model
    pub async fn summarize(&self, text: &str) -> Result<Summary, AgentError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model.id());
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: build_prompt(&self.instruction, text),
                }],
            }],
        };

        tracing::info!(model = self.model.id(), "requesting summary");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Unauthorized(status),
                StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited,
                _ => AgentError::Api {
                    status,
                    message: error_message(&body),
                },
            });
        }

        let response: GenerateResponse = serde_json::from_str(&body)?;
        let text = flatten_candidates(&response.candidates);

        if text.trim().is_empty() {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .or_else(|| response.candidates.iter().find_map(|c| c.finish_reason.clone()));
            return Err(AgentError::EmptyResponse { reason });
        }

        let total_tokens = response.usage_metadata.and_then(|u| u.total_token_count);
        tracing::debug!(?total_tokens, candidates = response.candidates.len(), "received summary");

        Ok(Summary::new(text, self.model.id(), total_tokens))
    }
}

/// Pull the message out of a Google API error body, falling back to the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidate(parts: &[&str]) -> Candidate {
        Candidate {
            content: Content {
                parts: parts
                    .iter()
                    .map(|t| Part {
                        text: Some(t.to_string()),
                    })
                    .collect(),
            },
            finish_reason: None,
        }
    }

    #[test]
    fn pro_substring_selects_pro() {
        assert_eq!(Model::select("pro"), Model::Pro);
        assert_eq!(Model::select("gemini-1.5-pro-latest"), Model::Pro);
        assert_eq!(Model::select("prose"), Model::Pro);
    }

    #[test]
    fn everything_else_selects_flash() {
        assert_eq!(Model::select(""), Model::Flash);
        assert_eq!(Model::select("flash"), Model::Flash);
        assert_eq!(Model::select("PRO"), Model::Flash);
    }

    #[test]
    fn model_ids() {
        assert_eq!(Model::Flash.id(), "gemini-1.5-flash-latest");
        assert_eq!(Model::Pro.id(), "gemini-1.5-pro-latest");
    }

    #[test]
    fn prompt_is_instruction_space_text() {
        assert_eq!(
            build_prompt("次の文章を要約してください。", "Race Result Data"),
            "次の文章を要約してください。 Race Result Data"
        );
    }

    #[test]
    fn flatten_keeps_candidate_then_part_order() {
        let candidates = vec![candidate(&["p1", "p2"]), candidate(&["p3"])];
        assert_eq!(flatten_candidates(&candidates), "p1\np2\np3");
    }

    #[test]
    fn flatten_skips_parts_without_text() {
        let mut first = candidate(&["a"]);
        first.content.parts.push(Part { text: None });
        let candidates = vec![first, Candidate::default(), candidate(&["b"])];
        assert_eq!(flatten_candidates(&candidates), "a\nb");
    }

    #[test]
    fn flatten_of_nothing_is_empty() {
        assert_eq!(flatten_candidates(&[]), "");
    }

    #[test]
    fn parses_generate_response() {
        let body = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "one"}, {"text": "two"}]}, "finishReason": "STOP"},
                {"content": {"parts": [{"text": "three"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 10, "totalTokenCount": 25}
        }"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();

        assert_eq!(flatten_candidates(&response.candidates), "one\ntwo\nthree");
        assert_eq!(response.usage_metadata.unwrap().total_token_count, Some(25));
    }

    #[test]
    fn parses_blocked_response_without_candidates() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();

        assert!(response.candidates.is_empty());
        assert_eq!(response.prompt_feedback.unwrap().block_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn request_serializes_to_gemini_shape() {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: "hi".to_string(),
                }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn missing_or_blank_key_fails_construction() {
        let config = AgentConfig::default();
        assert!(matches!(Summarizer::new(&config, None), Err(AgentError::MissingApiKey)));
        assert!(matches!(Summarizer::new(&config, Some("  ")), Err(AgentError::MissingApiKey)));
    }

    #[test]
    fn constructor_selects_model_from_config() {
        let config = AgentConfig {
            model: "pro".to_string(),
            ..AgentConfig::default()
        };
        let summarizer = Summarizer::new(&config, Some("key")).unwrap();
        assert_eq!(summarizer.model(), Model::Pro);
    }

    #[test]
    fn error_message_prefers_api_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "API key not valid");
        assert_eq!(error_message(" upstream down \n"), "upstream down");
    }

    #[test]
    fn empty_response_error_names_reason() {
        let err = AgentError::EmptyResponse {
            reason: Some("SAFETY".to_string()),
        };
        assert_eq!(err.to_string(), "model returned no text (SAFETY)");
        assert_eq!(
            AgentError::EmptyResponse { reason: None }.to_string(),
            "model returned no text"
        );
    }
}
