//! # Cascading selector
//!
//! Tries an ordered list of candidate models until one returns a usable
//! artifact, then falls back to a degraded text description.
//!
//! Unlike the retrying caller, which calls the *same* model again, the
//! cascade substitutes the *next* model: a failing or artifact-less candidate
//! is recorded and skipped. Only when every candidate has been exhausted is
//! the fallback capability invoked, exactly once.
//!
//! ```text
//! Trying(0) -> Trying(1) -> ... -> AllExhausted -> Degrading -> Done(TextDescription)
//!     |            |                                    \-> Failed
//!     \------------+--> Done(BinaryArtifact)
//! ```

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm::config::RetryPolicy;
use crate::llm::core::{CandidateInvoker, GenerationResponse, LLMError, Prompt, ResponsePart};
use crate::llm::decorators::retry::perform_with_retry;

/// One upstream model identifier to try. List order encodes preference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateModel(String);

impl CandidateModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateModel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A binary payload extracted from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// What the orchestration layer hands back on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// A candidate produced a usable artifact.
    BinaryArtifact {
        bytes: Vec<u8>,
        mime_type: String,
        source_model: String,
    },
    /// A text description in place of an artifact.
    TextDescription {
        text: String,
        /// Set when the text came from the degraded fallback.
        degraded: bool,
    },
}

/// How one candidate fared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateStatus {
    /// The invocation failed; the message is kept for diagnostics.
    Failed(String),
    /// The invocation succeeded without a usable artifact.
    Unusable,
    /// The candidate produced the returned artifact.
    Accepted,
}

/// One entry of the cascade trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAttempt {
    pub model: String,
    pub status: CandidateStatus,
}

/// The tagged result of a cascade and the candidates it went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub outcome: GenerationOutcome,
    pub attempts: Vec<CandidateAttempt>,
}

impl CascadeOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(
            self.outcome,
            GenerationOutcome::TextDescription { degraded: true, .. }
        )
    }
}

/// Accepts the first inline part with an `image/*` media type and data.
pub fn first_inline_image(response: &GenerationResponse) -> Option<Artifact> {
    response.parts.iter().find_map(|part| match part {
        ResponsePart::InlineData { mime_type, data }
            if mime_type.starts_with("image/") && !data.is_empty() =>
        {
            Some(Artifact {
                bytes: data.clone(),
                mime_type: mime_type.clone(),
            })
        }
        _ => None,
    })
}

/// An ordered list of candidates plus the per-candidate invocation policy.
#[derive(Debug, Clone)]
pub struct CascadingSelector {
    candidates: Vec<CandidateModel>,
    retry: Option<RetryPolicy>,
}

impl CascadingSelector {
    /// Creates a selector over `candidates`, most preferred first.
    ///
    /// # Errors
    ///
    /// Returns [`LLMError::NoCandidates`] for an empty list.
    pub fn new(candidates: Vec<CandidateModel>) -> Result<Self, LLMError> {
        if candidates.is_empty() {
            return Err(LLMError::NoCandidates);
        }
        Ok(Self {
            candidates,
            retry: None,
        })
    }

    /// Wraps every candidate invocation in the retrying caller.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn candidates(&self) -> &[CandidateModel] {
        &self.candidates
    }

    /// Runs the cascade.
    ///
    /// * `invoker` calls one candidate.
    /// * `usable` extracts an artifact from a response, or `None`.
    /// * `fallback` produces the degraded text description.
    ///
    /// # Errors
    ///
    /// Only a failing `fallback` is an error, reported as
    /// [`LLMError::DegradationFailed`].
    pub async fn run<I, U, F, Fut>(
        &self,
        invoker: &I,
        usable: U,
        fallback: F,
        prompt: Prompt,
    ) -> Result<CascadeOutcome, LLMError>
    where
        I: CandidateInvoker + ?Sized,
        U: Fn(&GenerationResponse) -> Option<Artifact>,
        F: FnOnce(Prompt) -> Fut,
        Fut: Future<Output = Result<String, LLMError>>,
    {
        let mut attempts = Vec::with_capacity(self.candidates.len());

        for (position, candidate) in self.candidates.iter().enumerate() {
            info!(
                model = %candidate,
                position = position + 1,
                total = self.candidates.len(),
                "Trying candidate model"
            );
            let response = match &self.retry {
                Some(policy) => {
                    perform_with_retry(
                        |prompt| async move { invoker.invoke(candidate, &prompt).await },
                        prompt.clone(),
                        policy,
                    )
                    .await
                }
                None => invoker.invoke(candidate, &prompt).await,
            };

            let status = match response {
                Ok(response) => match usable(&response) {
                    Some(artifact) => {
                        info!(model = %candidate, mime_type = %artifact.mime_type, "Candidate produced an artifact");
                        attempts.push(CandidateAttempt {
                            model: candidate.name().to_string(),
                            status: CandidateStatus::Accepted,
                        });
                        return Ok(CascadeOutcome {
                            outcome: GenerationOutcome::BinaryArtifact {
                                bytes: artifact.bytes,
                                mime_type: artifact.mime_type,
                                source_model: candidate.name().to_string(),
                            },
                            attempts,
                        });
                    }
                    None => {
                        warn!(model = %candidate, "Candidate returned no usable artifact");
                        CandidateStatus::Unusable
                    }
                },
                Err(error) => {
                    warn!(model = %candidate, error = %error, "Candidate failed");
                    CandidateStatus::Failed(error.detail())
                }
            };
            attempts.push(CandidateAttempt {
                model: candidate.name().to_string(),
                status,
            });
        }

        warn!(
            tried = attempts.len(),
            "All candidate models exhausted, degrading to a text description"
        );
        match fallback(prompt).await {
            Ok(text) => Ok(CascadeOutcome {
                outcome: GenerationOutcome::TextDescription {
                    text,
                    degraded: true,
                },
                attempts,
            }),
            Err(error) => {
                warn!(error = %error, "Degraded fallback failed");
                Err(LLMError::DegradationFailed(Box::new(error)))
            }
        }
    }
}

/// Builds a [`CascadingSelector`] over `candidates` and runs it once.
pub async fn perform_cascade<I, U, F, Fut>(
    candidates: Vec<CandidateModel>,
    invoker: &I,
    usable: U,
    fallback: F,
    prompt: Prompt,
) -> Result<CascadeOutcome, LLMError>
where
    I: CandidateInvoker + ?Sized,
    U: Fn(&GenerationResponse) -> Option<Artifact>,
    F: FnOnce(Prompt) -> Fut,
    Fut: Future<Output = Result<String, LLMError>>,
{
    CascadingSelector::new(candidates)?
        .run(invoker, usable, fallback, prompt)
        .await
}
