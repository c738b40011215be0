//! Google Generative Language (Gemini) REST provider.
//!
//! Configuration:
//! - api_base_url: e.g. https://generativelanguage.googleapis.com/v1beta
//! - api key: GEMINI_API_KEY, falling back to API_KEY
//! - model: e.g. "gemini-2.5-flash"

use super::{GenerationRequest, GenerationResponse, ProviderError, TextGenerator};
use crate::model::RunSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("biovisio/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Build from settings, reading the credential from the environment.
    /// An absent key is not an error here; each request fails instead.
    pub fn from_env(settings: &RunSettings) -> Result<Self, ProviderError> {
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()));
        if api_key.is_none() {
            warn!("no generation API key in environment; reports will fail");
        }
        Self::new(
            settings.api_base_url.clone(),
            api_key,
            settings.request_timeout,
        )
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn build_body(request: &GenerationRequest) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part {
                text: &request.contents,
            }],
        }],
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: &request.system_instruction,
            }],
        },
        generation_config: GenerationConfig {
            temperature: request.temperature,
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: &str) -> Result<String, ProviderError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)?;
    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyResponse)?;
    Ok(candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default())
}

/// Pull a readable message out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential)?;

        let url = self.endpoint(&request.model);
        let start = Instant::now();
        debug!(model = %request.model, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&build_body(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Http(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;
        debug!(
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "generateContent response"
        );

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(GenerationResponse {
            text: extract_text(&body)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: "gemini-2.5-flash".into(),
            contents: "Generate a report".into(),
            system_instruction: "You are an expert".into(),
            temperature: 0.3,
        }
    }

    #[test]
    fn request_body_uses_rest_field_names() {
        let req = request();
        let v = serde_json::to_value(build_body(&req)).unwrap();
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["contents"][0]["parts"][0]["text"], "Generate a report");
        assert_eq!(v["systemInstruction"]["parts"][0]["text"], "You are an expert");
        assert!(v["systemInstruction"].get("role").is_none());
        let temp = v["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temp - 0.3).abs() < 1e-6);
    }

    #[test]
    fn text_parts_of_first_candidate_are_joined() {
        let body = r###"{
            "candidates": [
                {"content": {"parts": [{"text": "## Summary\n"}, {"text": "All good."}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }"###;
        assert_eq!(extract_text(body).unwrap(), "## Summary\nAll good.");
    }

    #[test]
    fn candidate_without_content_yields_empty_text() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        assert_eq!(extract_text(body).unwrap(), "");
    }

    #[test]
    fn no_candidates_is_an_error() {
        let err = extract_text(r#"{"promptFeedback": {}}"#).unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[test]
    fn api_error_message_is_extracted() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "API key not valid.");
        assert_eq!(error_message("  plain failure "), "plain failure");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_network_call() {
        let provider = GeminiProvider::new(
            "http://127.0.0.1:9/v1beta/",
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            provider.endpoint("m"),
            "http://127.0.0.1:9/v1beta/models/m:generateContent"
        );
        let err = provider.generate(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential));
        assert_eq!(err.to_string(), "API Key not found in environment variables");
    }
}
