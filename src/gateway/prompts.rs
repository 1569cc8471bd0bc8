// Prompt templates for every feature.
//
// The layout of each prompt is assembled once with `prompt-crafter`, then
// registered with the template engine so request fields are interpolated
// per call.

use prompt_crafter::{
    Checklist, Guidance, Instruction, NumberedSections, Persona, Prompt as CraftedPrompt,
    Section,
};
use serde::Serialize;

use crate::utils::{TEngine, TEngineError};

/// The prompts known to the [`PromptBook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Chat,
    Image,
    ImageDescription,
    Animation,
    CartoonStory,
    Advertisement,
    PhotoTransform,
    PhotoAnalysis,
    PhotoGuide,
    PhotoText,
}

impl PromptKind {
    const ALL: [PromptKind; 10] = [
        PromptKind::Chat,
        PromptKind::Image,
        PromptKind::ImageDescription,
        PromptKind::Animation,
        PromptKind::CartoonStory,
        PromptKind::Advertisement,
        PromptKind::PhotoTransform,
        PromptKind::PhotoAnalysis,
        PromptKind::PhotoGuide,
        PromptKind::PhotoText,
    ];

    fn template_name(self) -> &'static str {
        match self {
            PromptKind::Chat => "chat",
            PromptKind::Image => "image",
            PromptKind::ImageDescription => "image_description",
            PromptKind::Animation => "animation",
            PromptKind::CartoonStory => "cartoon_story",
            PromptKind::Advertisement => "advertisement",
            PromptKind::PhotoTransform => "photo_transform",
            PromptKind::PhotoAnalysis => "photo_analysis",
            PromptKind::PhotoGuide => "photo_guide",
            PromptKind::PhotoText => "photo_text",
        }
    }

    fn layout(self) -> CraftedPrompt {
        match self {
            PromptKind::Chat => CraftedPrompt::builder()
                .add(Persona::new(
                    "You are a helpful AI assistant. Respond naturally in a conversational way to: {{message}}",
                ))
                .add(Guidance::new(
                    "Provide a clear, helpful response without any asterisks, markdown formatting, or special symbols. Use simple conversational language like you're talking to a friend.",
                ))
                .build(),
            PromptKind::Image => CraftedPrompt::builder()
                .add(Instruction::new("Generate an image of: \"{{prompt}}\""))
                .add(Checklist::new(
                    "Make it a single high quality picture with:",
                    &[
                        "A clear subject and a balanced composition",
                        "Natural lighting and a coherent color palette",
                        "Fine detail in textures and materials",
                    ],
                ))
                .build(),
            PromptKind::ImageDescription => CraftedPrompt::builder()
                .add(Instruction::new(
                    "Create a vivid, detailed, and creative description of this image concept: \"{{prompt}}\"",
                ))
                .add(Checklist::new(
                    "Describe it as if you're painting a picture with words. Include:",
                    &[
                        "Visual details and composition",
                        "Colors, lighting, and atmosphere",
                        "Textures and materials",
                        "Emotions and mood",
                        "Artistic style suggestions",
                    ],
                ))
                .add(Guidance::new(
                    "Make it so descriptive that someone could almost see the image just from your words. Use engaging, conversational language without any formatting symbols.",
                ))
                .build(),
            PromptKind::Animation => CraftedPrompt::builder()
                .add(Instruction::new(
                    "Help me create an animation concept for: \"{{prompt}}\"",
                ))
                .add(Checklist::new(
                    "Describe this animation in a friendly, conversational way. Include:",
                    &[
                        "What the animation would look like",
                        "How characters would move and interact",
                        "The overall style and mood",
                        "Duration and key scenes",
                    ],
                ))
                .add(Guidance::new(
                    "Talk about it like you're explaining an exciting animation idea to a friend. Keep it simple and engaging without any special formatting.",
                ))
                .build(),
            PromptKind::CartoonStory => CraftedPrompt::builder()
                .add(Instruction::new(
                    "Help me create a fun cartoon story about: \"{{story}}\"",
                ))
                .add(Checklist::new(
                    "Tell me this story in a friendly, engaging way like you're sharing it with friends. Include:",
                    &[
                        "Interesting characters and what they're like",
                        "What happens in the story",
                        "Fun dialogue and interactions",
                        "A satisfying ending",
                    ],
                ))
                .add(Guidance::new(
                    "Make it entertaining and easy to follow. Just tell the story naturally without any special formatting or symbols.",
                ))
                .build(),
            PromptKind::Advertisement => CraftedPrompt::builder()
                .add(Instruction::new(
                    "Help me create a marketing campaign for: {{product}}{{#if brand}} from {{brand}}{{/if}}",
                ))
                .add(Checklist::new(
                    "Create an engaging advertisement that includes:",
                    &[
                        "A catchy headline that grabs attention",
                        "Key benefits and features",
                        "Who this product is perfect for",
                        "A strong call-to-action",
                    ],
                ))
                .add(Guidance::new(
                    "Write it in a conversational, persuasive style like you're explaining why someone should try this product. Keep it natural and engaging without any special formatting.",
                ))
                .build(),
            PromptKind::PhotoTransform => CraftedPrompt::builder()
                .add(Instruction::new(
                    "Transform the attached photo based on: \"{{description}}\" into {{era}} style with {{style}} characteristics.",
                ))
                .add(Checklist::new(
                    "Keep the people, their poses and the composition recognisable. Change:",
                    &[
                        "Clothing, accessories and hairstyles to fit {{era}}",
                        "The background and setting to match the period",
                        "Lighting, color grading and texture for a {{style}} look",
                    ],
                ))
                .add(Guidance::new("Return the transformed photo as an image."))
                .build(),
            PromptKind::PhotoAnalysis => CraftedPrompt::builder()
                .add(Persona::new(
                    "You are a photo analysis and transformation AI. Analyze this image and create a detailed description for transforming it based on: \"{{description}}\" in {{era}} style with {{style}} characteristics.",
                ))
                .add(Checklist::new(
                    "Provide a comprehensive analysis that includes:",
                    &[
                        "Detailed description of current image elements",
                        "How to transform clothing and appearance for the era",
                        "Background and setting modifications needed",
                        "Lighting and mood adjustments for authenticity",
                        "Color palette appropriate for the time period",
                        "Artistic style techniques for {{style}} appearance",
                    ],
                ))
                .add(Guidance::new(
                    "Focus specifically on photo transformation and historical accuracy. Format as a detailed transformation description.",
                ))
                .build(),
            PromptKind::PhotoGuide => CraftedPrompt::builder()
                .add(Instruction::new(
                    "Based on the uploaded image, create a comprehensive transformation guide for {{era}} {{style}} style:",
                ))
                .add(Instruction::new("{{analysis}}"))
                .add(Instruction::new(
                    "Now provide specific instructions for how this transformation would be achieved:",
                ))
                .add(NumberedSections::new(vec![
                    Section::new(
                        "CLOTHING & FASHION",
                        &[
                            "What period-appropriate clothing would replace current items",
                            "Specific garments, accessories, and styling for {{era}}",
                            "Color palette and fabric choices authentic to the era",
                        ],
                    ),
                    Section::new(
                        "HAIRSTYLE & MAKEUP",
                        &[
                            "Period-appropriate hairstyling for {{era}}",
                            "Makeup trends and techniques of that time",
                            "Facial hair styles if applicable",
                        ],
                    ),
                    Section::new(
                        "BACKGROUND & SETTING",
                        &[
                            "Environment that matches {{era}}",
                            "Architecture, furniture, and decorative elements",
                            "Lighting style typical of the period",
                        ],
                    ),
                    Section::new(
                        "ARTISTIC STYLE",
                        &[
                            "{{style}} characteristics and techniques",
                            "Color grading and visual effects",
                            "Overall aesthetic approach",
                        ],
                    ),
                ]))
                .add(Guidance::new(
                    "Make this transformation guide detailed and practical, as if someone could use it to recreate the look.",
                ))
                .build(),
            PromptKind::PhotoText => CraftedPrompt::builder()
                .add(Instruction::new(
                    "Help me transform a photo with this description: \"{{description}}\"",
                ))
                .add(Instruction::new(
                    "Transform it into {{era}} style with {{style}} characteristics.",
                ))
                .add(Checklist::new(
                    "Describe how this transformation would look in a friendly, conversational way. Talk about:",
                    &[
                        "How the clothing and appearance would change",
                        "What the background and setting would look like",
                        "The colors and lighting of that time period",
                        "The overall mood and feel",
                    ],
                ))
                .add(Guidance::new(
                    "Explain it like you're helping someone visualize their photo in a different time period. Keep it simple and engaging without any special formatting.",
                ))
                .build(),
        }
    }
}

/// Every feature prompt, compiled once and rendered per request.
pub struct PromptBook {
    engine: TEngine,
}

impl PromptBook {
    pub fn new() -> Result<Self, TEngineError> {
        let mut engine = TEngine::new();
        for kind in PromptKind::ALL {
            engine.register_template_string(kind.template_name(), &kind.layout().render())?;
        }
        Ok(Self { engine })
    }

    pub fn render<T: Serialize>(&self, kind: PromptKind, data: &T) -> Result<String, TEngineError> {
        self.engine.render(kind.template_name(), data)
    }
}
