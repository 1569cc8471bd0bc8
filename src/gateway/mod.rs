// The `gateway` module turns feature requests into prompts, runs them through
// the orchestration layer and shapes the replies.

pub mod cleanup;
pub mod features;
pub mod prompts;
pub mod reply;

use std::sync::{Arc, OnceLock};

use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

use crate::llm::{
    CandidateInvoker, CascadingSelector, GenerationOutcome, InlineImage, LLM, LLMError,
    LLMFactory, Prompt, RetryPolicy, first_inline_image,
};
use crate::utils::TEngineError;

pub use cleanup::strip_markdown;
pub use features::{Feature, FeatureRequest, PhotoTransformRequest};
pub use prompts::{PromptBook, PromptKind};
pub use reply::FeatureReply;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Template(#[from] TEngineError),
    #[error(transparent)]
    Llm(#[from] LLMError),
}

/// Serves every feature through one text model and one image cascade.
///
/// The gateway holds no per-request state; it is shared behind an `Arc` and
/// only read.
pub struct Gateway {
    text: Box<dyn LLM>,
    images: Arc<dyn CandidateInvoker>,
    selector: CascadingSelector,
    prompts: PromptBook,
}

impl Gateway {
    /// `text` is wrapped in the retrying caller when `retry` allows more than
    /// one attempt.
    pub fn new(
        text: Box<dyn LLM>,
        retry: Option<RetryPolicy>,
        images: Arc<dyn CandidateInvoker>,
        selector: CascadingSelector,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            text: LLMFactory::create(text, retry),
            images,
            selector,
            prompts: PromptBook::new()?,
        })
    }

    pub async fn run(&self, request: FeatureRequest) -> Result<FeatureReply, GatewayError> {
        let feature = request.feature();
        info!(feature = feature.name(), "Handling feature request");

        match request {
            FeatureRequest::Chat { message } => {
                if message.trim().is_empty() {
                    return Err(GatewayError::BadRequest("message is required".to_string()));
                }
                let text = self
                    .converse(PromptKind::Chat, &json!({ "message": message }))
                    .await?;
                Ok(FeatureReply::chat(text))
            }
            FeatureRequest::ImageGeneration { prompt } => self.generate_image(prompt).await,
            FeatureRequest::Animation { prompt } => {
                let text = self
                    .converse(PromptKind::Animation, &json!({ "prompt": prompt }))
                    .await?;
                Ok(FeatureReply::text(feature, text))
            }
            FeatureRequest::CartoonStory { story } => {
                let text = self
                    .converse(PromptKind::CartoonStory, &json!({ "story": story }))
                    .await?;
                Ok(FeatureReply::text(feature, text))
            }
            FeatureRequest::Advertisement { brand, product } => {
                let text = self
                    .converse(
                        PromptKind::Advertisement,
                        &json!({ "brand": brand, "product": product }),
                    )
                    .await?;
                Ok(FeatureReply::text(feature, text))
            }
            FeatureRequest::PhotoTransform(mut request) => match request.image.take() {
                Some(image) => self.transform_photo(request, image).await,
                None => {
                    let text = self
                        .converse(PromptKind::PhotoText, &photo_fields(&request))
                        .await?;
                    Ok(FeatureReply::text(feature, text)
                        .with_note("Text-only transformation (no image uploaded)"))
                }
            },
        }
    }

    /// One retried text call, cleaned for display.
    async fn converse(&self, kind: PromptKind, data: &Value) -> Result<String, GatewayError> {
        let prompt = self.prompts.render(kind, data)?;
        let reply = self.text.prompt(Prompt::text(prompt)).await?;
        Ok(strip_markdown(&reply))
    }

    async fn generate_image(&self, user_prompt: String) -> Result<FeatureReply, GatewayError> {
        let fields = json!({ "prompt": user_prompt });
        let prompt = Prompt::text(self.prompts.render(PromptKind::Image, &fields)?);
        let description = self.prompts.render(PromptKind::ImageDescription, &fields)?;

        let text = &self.text;
        let cascade = self
            .selector
            .run(
                self.images.as_ref(),
                first_inline_image,
                |_| async move { text.prompt(Prompt::text(description)).await },
                prompt,
            )
            .await?;
        info!(
            tried = cascade.attempts.len(),
            degraded = cascade.is_degraded(),
            "Image cascade finished"
        );

        Ok(match cascade.outcome {
            GenerationOutcome::BinaryArtifact {
                bytes,
                mime_type,
                source_model,
            } => FeatureReply::image(Feature::ImageGeneration, &bytes, &mime_type, source_model)
                .with_message("Here's your generated image!")
                .with_prompt(user_prompt),
            GenerationOutcome::TextDescription { text, .. } => {
                FeatureReply::image_description(&strip_markdown(&text), user_prompt)
            }
        })
    }

    /// Cascades the uploaded photo through the image models. When none of
    /// them returns a picture, the photo is analysed and the analysis is
    /// turned into a written transformation guide.
    async fn transform_photo(
        &self,
        request: PhotoTransformRequest,
        image: InlineImage,
    ) -> Result<FeatureReply, GatewayError> {
        let fields = photo_fields(&request);
        let prompt = Prompt {
            text: self.prompts.render(PromptKind::PhotoTransform, &fields)?,
            image: Some(image),
        };
        let analysis_text = self.prompts.render(PromptKind::PhotoAnalysis, &fields)?;

        let analysis = OnceLock::new();
        let fallback = |prompt: Prompt| {
            let analysis = &analysis;
            let fields = &fields;
            async move {
                let reply = self
                    .text
                    .prompt(Prompt {
                        text: analysis_text,
                        image: prompt.image,
                    })
                    .await?;
                let cleaned = strip_markdown(&reply);

                let mut guide_fields = fields.clone();
                guide_fields["analysis"] = Value::String(cleaned.clone());
                let guide_prompt = self
                    .prompts
                    .render(PromptKind::PhotoGuide, &guide_fields)
                    .map_err(|e| LLMError::Service(e.to_string()))?;
                let _ = analysis.set(cleaned);
                self.text.prompt(Prompt::text(guide_prompt)).await
            }
        };

        let cascade = self
            .selector
            .run(self.images.as_ref(), first_inline_image, fallback, prompt)
            .await?;
        info!(
            tried = cascade.attempts.len(),
            degraded = cascade.is_degraded(),
            era = %request.era,
            "Photo cascade finished"
        );

        Ok(match cascade.outcome {
            GenerationOutcome::BinaryArtifact {
                bytes,
                mime_type,
                source_model,
            } => FeatureReply::image(Feature::PhotoTransform, &bytes, &mime_type, source_model)
                .with_message(format!(
                    "Here's your photo transformed to {} {} style!",
                    request.era, request.style
                ))
                .with_target(request.era, request.style),
            GenerationOutcome::TextDescription { text, .. } => FeatureReply::photo_guide(
                &request.era,
                &request.style,
                analysis.into_inner().unwrap_or_default(),
                strip_markdown(&text),
            ),
        })
    }
}

fn photo_fields(request: &PhotoTransformRequest) -> Value {
    json!({
        "description": request.description,
        "era": request.era,
        "style": request.style,
    })
}
