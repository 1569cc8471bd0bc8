//! Gemini `generateContent` REST client.
//!
//! One explicitly constructed client serves both the text features (through
//! the [`LLM`] trait, using the configured text model) and the image cascade
//! (through [`CandidateInvoker`], using whichever candidate model is asked
//! for). Upstream failures keep the HTTP status and the provider's message so
//! that an overloaded model (`503`, `UNAVAILABLE`) is recognisable as
//! transient.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request};
use serde::{Deserialize, Serialize};
use tokio_util::bytes::Bytes;
use tracing::{debug, instrument};

use crate::llm::cascade::CandidateModel;
use crate::llm::core::{
    CandidateInvoker, GenerationResponse, LLM, LLMError, Prompt, ResponsePart,
};
use crate::utils::https::HyperClient;

/// Public Gemini API endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";
const IMAGE_MODALITIES: &[&str] = &["TEXT", "IMAGE"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    /// Base64 encoded bytes.
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_modalities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCandidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<ResponseCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GenerateContentRequest {
    /// A single user turn built from `prompt`.
    pub fn from_prompt(prompt: &Prompt, modalities: &[&str]) -> Self {
        let mut parts = vec![Part {
            text: Some(prompt.text.clone()),
            inline_data: None,
        }];
        if let Some(image) = &prompt.image {
            parts.push(Part {
                text: None,
                inline_data: Some(Blob {
                    mime_type: image.mime_type.clone(),
                    data: BASE64.encode(&image.data),
                }),
            });
        }
        let generation_config = (!modalities.is_empty()).then(|| GenerationConfig {
            response_modalities: modalities.iter().map(|m| m.to_string()).collect(),
        });
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config,
        }
    }
}

impl GenerateContentResponse {
    /// Flattens the first candidate into a [`GenerationResponse`].
    ///
    /// # Errors
    ///
    /// A blocked prompt or undecodable inline data is reported as
    /// `LLMError::PromptError`.
    pub fn into_generation(self) -> Result<GenerationResponse, LLMError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(LLMError::PromptError(format!("prompt blocked: {reason}")));
            }
            return Ok(GenerationResponse::default());
        };

        let mut parts = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(text) = part.text {
                parts.push(ResponsePart::Text(text));
            }
            if let Some(blob) = part.inline_data {
                let data = BASE64.decode(blob.data.as_bytes()).map_err(|e| {
                    LLMError::PromptError(format!("invalid inline data from model: {e}"))
                })?;
                parts.push(ResponsePart::InlineData {
                    mime_type: blob.mime_type,
                    data,
                });
            }
        }
        Ok(GenerationResponse { parts })
    }
}

/// A Gemini API client. Cloning is cheap and shares the connection pool.
#[derive(Clone)]
pub struct GeminiClient {
    http: HyperClient,
    api_key: String,
    base_url: String,
    text_model: String,
}

impl GeminiClient {
    pub fn new(http: HyperClient, api_key: impl Into<String>, text_model: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            text_model: text_model.into(),
        }
    }

    /// Points the client at another endpoint, e.g. a proxy or a local fake.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Calls `models/{model}:generateContent` once.
    #[instrument(skip(self, prompt), fields(has_image = prompt.image.is_some()))]
    pub async fn generate(
        &self,
        model: &str,
        prompt: &Prompt,
        modalities: &[&str],
    ) -> Result<GenerationResponse, LLMError> {
        let body = serde_json::to_vec(&GenerateContentRequest::from_prompt(prompt, modalities))
            .map_err(|e| LLMError::PromptError(format!("failed to encode request: {e}")))?;
        let uri = format!("{}/models/{}:generateContent", self.base_url, model);

        let request = Request::builder()
            .method(Method::POST)
            .uri(&uri)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, &self.api_key)
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| LLMError::PromptError(format!("invalid request for {uri}: {e}")))?;

        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| LLMError::PromptError(format!("transport error: {e}")))?;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| LLMError::PromptError(format!("failed to read response body: {e}")))?
            .to_bytes();
        debug!(%status, body_len = bytes.len(), "Gemini responded");

        if !status.is_success() {
            let message = match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
                Ok(envelope) => match envelope.error.status {
                    Some(code) => format!("{code}: {}", envelope.error.message),
                    None => envelope.error.message,
                },
                Err(_) => String::from_utf8_lossy(&bytes).trim().to_string(),
            };
            return Err(LLMError::PromptError(format!("[{status}] {message}")));
        }

        serde_json::from_slice::<GenerateContentResponse>(&bytes)
            .map_err(|e| LLMError::PromptError(format!("unexpected response from model: {e}")))?
            .into_generation()
    }
}

#[async_trait]
impl LLM for GeminiClient {
    async fn prompt(&self, prompt: Prompt) -> Result<String, LLMError> {
        let text = self.generate(&self.text_model, &prompt, &[]).await?.text();
        if text.trim().is_empty() {
            return Err(LLMError::PromptError("model returned no text".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl CandidateInvoker for GeminiClient {
    async fn invoke(
        &self,
        candidate: &CandidateModel,
        prompt: &Prompt,
    ) -> Result<GenerationResponse, LLMError> {
        self.generate(candidate.name(), prompt, IMAGE_MODALITIES).await
    }
}
