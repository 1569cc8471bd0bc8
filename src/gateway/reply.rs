use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use super::features::Feature;

const IMAGE_DESCRIPTION_NOTE: &str =
    "None of the image models returned a picture, so this is a detailed description instead.";

const IMAGE_DESCRIPTION_FOOTER: &str = "💡 Note: I'm currently providing detailed creative descriptions. For actual image generation, you would need access to paid AI image services like DALL-E, Midjourney, or Stable Diffusion.";

const PHOTO_GUIDE_FOOTER: &str = "💡 Note: I can provide expert transformation analysis and detailed guides. For actual photo editing, you would need image editing software or paid AI transformation services.";

/// The JSON envelope returned for every feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation_guide: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_era: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_style: Option<String>,
}

/// Renders bytes as a `data:` URL the frontend can use as an `<img>` source.
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64.encode(bytes))
}

impl FeatureReply {
    /// Chat replies carry only the text.
    pub fn chat(text: String) -> Self {
        Self {
            data: text,
            ..Self::default()
        }
    }

    /// A successful text reply labelled with the feature's envelope fields.
    pub fn text(feature: Feature, text: String) -> Self {
        Self {
            success: Some(true),
            kind: feature.reply_type().map(str::to_string),
            feature: feature.label().map(str::to_string),
            data: text,
            ..Self::default()
        }
    }

    /// A generated picture.
    pub fn image(feature: Feature, bytes: &[u8], mime_type: &str, model: String) -> Self {
        Self {
            success: Some(true),
            kind: Some("image".to_string()),
            feature: feature.label().map(str::to_string),
            data: data_url(mime_type, bytes),
            model: Some(model),
            ..Self::default()
        }
    }

    /// The degraded image-generation reply.
    pub fn image_description(description: &str, prompt: String) -> Self {
        Self {
            data: format!(
                "🎨 Here's a creative visualization of your idea:\n\n{description}\n\n{IMAGE_DESCRIPTION_FOOTER}"
            ),
            message: Some("Creative image description generated!".to_string()),
            prompt: Some(prompt),
            note: Some(IMAGE_DESCRIPTION_NOTE.to_string()),
            ..Self::text(Feature::ImageGeneration, String::new())
        }
    }

    /// The degraded photo reply: the analysis of the upload and a guide built
    /// from it.
    pub fn photo_guide(era: &str, style: &str, analysis: String, guide: String) -> Self {
        Self {
            data: format!(
                "📸 Based on your uploaded photo, here's your detailed {era} {style} transformation guide:\n\n{guide}\n\n{PHOTO_GUIDE_FOOTER}"
            ),
            original_analysis: Some(analysis),
            transformation_guide: Some(guide),
            target_era: Some(era.to_string()),
            target_style: Some(style.to_string()),
            note: Some("Professional transformation analysis completed".to_string()),
            ..Self::text(Feature::PhotoTransform, String::new())
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_target(mut self, era: impl Into<String>, style: impl Into<String>) -> Self {
        self.target_era = Some(era.into());
        self.target_style = Some(style.into());
        self
    }
}
