use crate::llm::InlineImage;

const DEFAULT_IMAGE_PROMPT: &str = "generate the image of dog riding on scooter with remote control";
const DEFAULT_ANIMATION_PROMPT: &str =
    "generate random animation of shavlean samurai with katana blead";
const DEFAULT_STORY: &str = "give the valid prompt";
const DEFAULT_PRODUCT: &str = "this product";
const DEFAULT_PHOTO_DESCRIPTION: &str = "Transform this photo";
const DEFAULT_ERA: &str = "Victorian era";
const DEFAULT_STYLE: &str = "vintage";

/// The user-facing features served by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Chat,
    ImageGeneration,
    Animation,
    CartoonStory,
    Advertisement,
    PhotoTransform,
}

impl Feature {
    /// Short name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Chat => "chat",
            Feature::ImageGeneration => "generate-image",
            Feature::Animation => "generate-animation",
            Feature::CartoonStory => "cartoon-story",
            Feature::Advertisement => "generate-ad",
            Feature::PhotoTransform => "transform-photo",
        }
    }

    /// The envelope `type` of a text reply.
    pub fn reply_type(self) -> Option<&'static str> {
        match self {
            Feature::Chat => None,
            Feature::ImageGeneration => Some("text"),
            Feature::Animation => Some("animation"),
            Feature::CartoonStory => Some("Cartoon-story"),
            Feature::Advertisement => Some("advertisement"),
            Feature::PhotoTransform => Some("photo-transform"),
        }
    }

    /// The envelope `feature` label.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Feature::CartoonStory => Some("Cartoon studio"),
            Feature::Advertisement => Some("Ad Maker AI"),
            Feature::PhotoTransform => Some("Time Travel Camera"),
            _ => None,
        }
    }

    /// The `details` text of a failed request.
    pub fn unavailable_details(self) -> &'static str {
        match self {
            Feature::Chat => {
                "The AI service is temporarily unavailable. Please try again in a moment."
            }
            Feature::ImageGeneration => "Image generation temporarily unavailable",
            Feature::Animation => "Animation generation temporarily unavailable",
            Feature::CartoonStory => "Cartoon generation temporarily unavailable",
            Feature::Advertisement => "Advertisement generation temporarily unavailable",
            Feature::PhotoTransform => "Error processing photo transformation",
        }
    }
}

/// Inputs of a photo transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoTransformRequest {
    pub description: String,
    pub era: String,
    pub style: String,
    pub image: Option<InlineImage>,
}

impl PhotoTransformRequest {
    pub fn new(
        description: Option<String>,
        era: Option<String>,
        style: Option<String>,
        image: Option<InlineImage>,
    ) -> Self {
        Self {
            description: or_default(description, DEFAULT_PHOTO_DESCRIPTION),
            era: or_default(era, DEFAULT_ERA),
            style: or_default(style, DEFAULT_STYLE),
            image,
        }
    }
}

/// A request for one feature, with defaults applied to missing fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureRequest {
    Chat { message: String },
    ImageGeneration { prompt: String },
    Animation { prompt: String },
    CartoonStory { story: String },
    Advertisement { brand: Option<String>, product: String },
    PhotoTransform(PhotoTransformRequest),
}

impl FeatureRequest {
    /// Chat keeps an empty message as is; the gateway rejects it.
    pub fn chat(message: Option<String>) -> Self {
        FeatureRequest::Chat {
            message: message.unwrap_or_default(),
        }
    }

    pub fn image(prompt: Option<String>) -> Self {
        FeatureRequest::ImageGeneration {
            prompt: or_default(prompt, DEFAULT_IMAGE_PROMPT),
        }
    }

    pub fn animation(prompt: Option<String>) -> Self {
        FeatureRequest::Animation {
            prompt: or_default(prompt, DEFAULT_ANIMATION_PROMPT),
        }
    }

    pub fn cartoon_story(story: Option<String>) -> Self {
        FeatureRequest::CartoonStory {
            story: or_default(story, DEFAULT_STORY),
        }
    }

    pub fn advertisement(brand: Option<String>, product: Option<String>) -> Self {
        FeatureRequest::Advertisement {
            brand: brand.filter(|b| !b.trim().is_empty()),
            product: or_default(product, DEFAULT_PRODUCT),
        }
    }

    pub fn photo_transform(request: PhotoTransformRequest) -> Self {
        FeatureRequest::PhotoTransform(request)
    }

    pub fn feature(&self) -> Feature {
        match self {
            FeatureRequest::Chat { .. } => Feature::Chat,
            FeatureRequest::ImageGeneration { .. } => Feature::ImageGeneration,
            FeatureRequest::Animation { .. } => Feature::Animation,
            FeatureRequest::CartoonStory { .. } => Feature::CartoonStory,
            FeatureRequest::Advertisement { .. } => Feature::Advertisement,
            FeatureRequest::PhotoTransform(_) => Feature::PhotoTransform,
        }
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
