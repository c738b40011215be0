//! Text-generation capability used by the report requester.
//!
//! The hosted service is reached through the [`TextGenerator`] trait so runs can be
//! driven by a test double instead of the network.

mod gemini;

pub use gemini::GeminiProvider;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Failures reaching or receiving from the generation service.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API Key not found in environment variables")]
    MissingCredential,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("service returned no candidates")]
    EmptyResponse,

    #[error("timed out waiting for the generation service")]
    Timeout,
}

/// A single generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    /// Short content instruction sent as the user turn.
    pub contents: String,
    pub system_instruction: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    /// Generated text; may be empty when the service produced nothing.
    pub text: String,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns a fixed text and records every request it receives.
    pub struct StaticGenerator {
        pub text: String,
        pub delay: Duration,
        pub requests: Mutex<Vec<GenerationRequest>>,
    }

    impl StaticGenerator {
        pub fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
                delay: Duration::ZERO,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().map(|r| r.len()).unwrap_or(0)
        }

        pub fn last_request(&self) -> Option<GenerationRequest> {
            self.requests.lock().ok().and_then(|r| r.last().cloned())
        }
    }

    #[async_trait]
    impl TextGenerator for StaticGenerator {
        fn name(&self) -> &str {
            "static"
        }

        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResponse, ProviderError> {
            if let Ok(mut r) = self.requests.lock() {
                r.push(request.clone());
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(GenerationResponse {
                text: self.text.clone(),
            })
        }
    }

    /// Behaves like a service whose credential is absent.
    pub struct MissingKeyGenerator;

    #[async_trait]
    impl TextGenerator for MissingKeyGenerator {
        fn name(&self) -> &str {
            "missing-key"
        }

        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<GenerationResponse, ProviderError> {
            Err(ProviderError::MissingCredential)
        }
    }
}
