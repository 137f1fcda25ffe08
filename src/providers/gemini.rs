//! Gemini provider implementation for XZchat
//!
//! This module implements the Provider trait for the Google Gemini API,
//! streaming replies over server-sent events. The opaque conversation
//! history is encoded in Gemini's native `contents` format: a JSON array
//! of role-tagged entries with `user` and `model` roles.

use crate::config::GeminiConfig;
use crate::error::{Result, XzchatError};
use crate::providers::{FragmentStream, Provider, ProviderHistory};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default public API endpoint
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key
///
/// An unset variable is not checked locally; the request goes out with an
/// empty key and the service's rejection surfaces as a provider error.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Google Gemini API provider
///
/// Streams replies from the `streamGenerateContent` endpoint over SSE.
///
/// # Examples
///
/// ```
/// use xzchat::config::GeminiConfig;
/// use xzchat::providers::GeminiProvider;
///
/// let config = GeminiConfig {
///     model: "gemini-pro".to_string(),
///     api_base: None,
/// };
/// let provider = GeminiProvider::new(config);
/// assert!(provider.is_ok());
/// ```
pub struct GeminiProvider {
    client: Client,
    api_base: String,
    model: String,
}

/// One conversation entry in Gemini's native format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }

    fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }

    fn text(&self) -> String {
        self.parts.iter().map(|part| part.text.as_str()).collect()
    }
}

/// Text part of a content entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    text: String,
}

/// Request body for the generateContent endpoints
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

/// One reply candidate in a streamed chunk
#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

/// One streamed chunk of the reply
///
/// Metadata-only chunks (safety ratings, usage) carry no candidates or an
/// empty content and decode to an empty fragment.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn fragment(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(Content::text)
            .unwrap_or_default()
    }
}

/// Extract reply fragments from the complete SSE lines in `buffer`
///
/// Consumes every complete line, leaving a trailing partial line in the
/// buffer for the next chunk. Non-`data:` lines are ignored; a `data:`
/// payload that fails to decode is logged and skipped, and the stream
/// carries on.
fn drain_sse_fragments(buffer: &mut String) -> Vec<String> {
    let mut fragments = Vec::new();

    while let Some(newline) = buffer.find('\n') {
        let line: String = buffer.drain(..=newline).collect();
        let line = line.trim_end();

        let payload = match line.strip_prefix("data: ") {
            Some(payload) => payload,
            None => continue,
        };

        match serde_json::from_str::<GenerateContentResponse>(payload) {
            Ok(response) => {
                let fragment = response.fragment();
                if !fragment.is_empty() {
                    fragments.push(fragment);
                }
            }
            Err(e) => {
                tracing::warn!("Skipping undecodable SSE payload: {}", e);
            }
        }
    }

    fragments
}

impl GeminiProvider {
    /// Create a new Gemini provider instance
    ///
    /// # Arguments
    ///
    /// * `config` - Gemini configuration containing model and optional API base
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("xzchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| XzchatError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        tracing::info!("Initialized Gemini provider: model={}", config.model);

        Ok(Self {
            client,
            api_base,
            model: config.model,
        })
    }

    fn api_key() -> String {
        std::env::var(API_KEY_ENV).unwrap_or_default()
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.api_base, self.model
        )
    }

    /// Decode the opaque history into Gemini contents
    fn contents_from(history: &ProviderHistory) -> Result<Vec<Content>> {
        if history.is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_value(history.raw().clone())
            .map_err(|e| XzchatError::Provider(format!("Undecodable Gemini history: {}", e)).into())
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn stream_message(
        &self,
        prompt: &str,
        history: &ProviderHistory,
    ) -> Result<FragmentStream> {
        let mut contents = Self::contents_from(history)?;
        contents.push(Content::user(prompt));
        let request = GenerateContentRequest { contents };

        let url = self.stream_url();
        tracing::debug!("Streaming reply for model {}", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", Self::api_key())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gemini request failed: {}", e);
                XzchatError::Provider(format!("Gemini request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini returned error {}: {}", status, error_text);
            return Err(XzchatError::Provider(format!(
                "Gemini returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let fragments = response
            .bytes_stream()
            .scan(String::new(), |buffer, chunk| {
                let items: Vec<Result<String>> = match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        drain_sse_fragments(buffer).into_iter().map(Ok).collect()
                    }
                    Err(e) => {
                        vec![Err(XzchatError::Provider(format!(
                            "Gemini stream failed: {}",
                            e
                        ))
                        .into())]
                    }
                };
                futures::future::ready(Some(items))
            })
            .flat_map(stream::iter);

        Ok(Box::pin(fragments))
    }

    fn history_after(
        &self,
        history: &ProviderHistory,
        prompt: &str,
        response: &str,
    ) -> Result<ProviderHistory> {
        let mut contents = Self::contents_from(history)?;
        contents.push(Content::user(prompt));
        contents.push(Content::model(response));
        Ok(ProviderHistory::from_raw(serde_json::to_value(contents)?))
    }
}
