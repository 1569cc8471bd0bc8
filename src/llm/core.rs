use async_trait::async_trait;
use thiserror::Error;

use crate::llm::cascade::CandidateModel;

/// A custom error type for LLM operations.
///
/// The first variant carries raw failures reported by an upstream capability.
/// The remaining variants are produced by the orchestration layer itself and
/// are what callers of the gateway ultimately see.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LLMError {
    /// An error occurred while prompting the model.
    ///
    /// This wraps the message reported by the provider or its transport,
    /// for example `[503 Service Unavailable] The model is overloaded.`.
    #[error("Failed to prompt the model: {0}")]
    PromptError(String),

    /// The upstream kept signalling a transient overload until the retry
    /// budget ran out.
    #[error(
        "AI service is temporarily overloaded (gave up after {attempts} attempts). Please try again in a few minutes."
    )]
    Overloaded {
        /// Number of upstream invocations that were made.
        attempts: usize,
    },

    /// A non-transient upstream failure, surfaced without retrying.
    #[error("AI service error: {0}")]
    Service(String),

    /// Every cascade candidate was exhausted and the degraded fallback failed too.
    #[error("Fallback description failed: {0}")]
    DegradationFailed(Box<LLMError>),

    /// A cascade was configured without any candidate model.
    #[error("No candidate models configured")]
    NoCandidates,
}

impl LLMError {
    /// The innermost human readable message, without the variant prefix.
    pub fn detail(&self) -> String {
        match self {
            LLMError::PromptError(message) | LLMError::Service(message) => message.clone(),
            LLMError::DegradationFailed(inner) => inner.detail(),
            other => other.to_string(),
        }
    }
}

/// An image attached inline to a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Media type such as `image/png`.
    pub mime_type: String,
}

/// An opaque prompt payload: text, optionally paired with one inline image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub image: Option<InlineImage>,
}

impl Prompt {
    /// A text-only prompt.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    /// Attaches an inline image to the prompt.
    pub fn with_image(mut self, data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        self.image = Some(InlineImage {
            data,
            mime_type: mime_type.into(),
        });
        self
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Prompt::text(text)
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Prompt::text(text)
    }
}

/// One part of a multimodal model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

/// The structural response of a multimodal generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    pub parts: Vec<ResponsePart>,
}

impl GenerationResponse {
    /// Concatenates every text part, in order.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ResponsePart::Text(text) => Some(text.as_str()),
                ResponsePart::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A trait that defines the contract for any text generation capability the
/// gateway can use.
///
/// Implementations are shared between concurrent requests, so the method takes
/// `&self`; any per-call state belongs to the call itself.
///
/// # Examples
///
/// ```rust
/// use nanogate::llm::{LLM, LLMError, Prompt};
/// use async_trait::async_trait;
///
/// struct EchoLLM;
///
/// #[async_trait]
/// impl LLM for EchoLLM {
///     async fn prompt(&self, prompt: Prompt) -> Result<String, LLMError> {
///         Ok(format!("Echo: {}", prompt.text))
///     }
/// }
/// ```
#[async_trait]
pub trait LLM: Send + Sync {
    /// Sends a prompt to the language model and gets its text response.
    ///
    /// # Errors
    ///
    /// Implementations report provider and transport failures as
    /// `LLMError::PromptError`, keeping the provider's message intact so that
    /// transient conditions (`503`, `overloaded`) can be recognised.
    async fn prompt(&self, prompt: Prompt) -> Result<String, LLMError>;
}

#[async_trait]
impl<T: LLM + ?Sized> LLM for Box<T> {
    async fn prompt(&self, prompt: Prompt) -> Result<String, LLMError> {
        (**self).prompt(prompt).await
    }
}

#[async_trait]
impl<T: LLM + ?Sized> LLM for std::sync::Arc<T> {
    async fn prompt(&self, prompt: Prompt) -> Result<String, LLMError> {
        (**self).prompt(prompt).await
    }
}

/// Invokes one named upstream model and returns its raw multimodal response.
///
/// Used by the cascading selector, which decides per candidate whether the
/// response carries a usable artifact.
#[async_trait]
pub trait CandidateInvoker: Send + Sync {
    async fn invoke(
        &self,
        candidate: &CandidateModel,
        prompt: &Prompt,
    ) -> Result<GenerationResponse, LLMError>;
}

#[async_trait]
impl<T: CandidateInvoker + ?Sized> CandidateInvoker for std::sync::Arc<T> {
    async fn invoke(
        &self,
        candidate: &CandidateModel,
        prompt: &Prompt,
    ) -> Result<GenerationResponse, LLMError> {
        (**self).invoke(candidate, prompt).await
    }
}
