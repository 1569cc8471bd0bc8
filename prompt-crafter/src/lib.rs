//! Small building blocks for plain-prose prompts.
//!
//! Components render to plain text (no markdown headings) and are joined with
//! blank lines, which keeps model replies conversational.

use std::fmt;

/// A component of a prompt.
pub trait PromptComponent: Send + Sync {
    fn render(&self) -> String;
}

/// A struct representing a prompt.
pub struct Prompt {
    components: Vec<Box<dyn PromptComponent>>,
}

impl Prompt {
    pub fn builder() -> PromptBuilder {
        PromptBuilder::new()
    }

    pub fn render(&self) -> String {
        self.components
            .iter()
            .map(|c| c.render())
            .filter(|block| !block.is_empty())
            .collect::<Vec<String>>()
            .join("\n\n")
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// A builder for creating prompts.
#[derive(Default)]
pub struct PromptBuilder {
    components: Vec<Box<dyn PromptComponent>>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, component: impl PromptComponent + 'static) -> Self {
        self.components.push(Box::new(component));
        self
    }

    pub fn build(self) -> Prompt {
        Prompt {
            components: self.components,
        }
    }
}

/// Who the model should be.
pub struct Persona {
    text: String,
}

impl Persona {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl PromptComponent for Persona {
    fn render(&self) -> String {
        self.text.clone()
    }
}

/// The task itself.
pub struct Instruction {
    text: String,
}

impl Instruction {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl PromptComponent for Instruction {
    fn render(&self) -> String {
        self.text.clone()
    }
}

/// A lead-in line followed by dashed bullet points.
pub struct Checklist {
    lead: String,
    items: Vec<String>,
}

impl Checklist {
    pub fn new(lead: &str, items: &[&str]) -> Self {
        Self {
            lead: lead.to_string(),
            items: items.iter().map(|item| item.to_string()).collect(),
        }
    }
}

impl PromptComponent for Checklist {
    fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.items.len() + 1);
        if !self.lead.is_empty() {
            lines.push(self.lead.clone());
        }
        lines.extend(self.items.iter().map(|item| format!("- {item}")));
        lines.join("\n")
    }
}

/// A numbered, titled group of bullet points, e.g. `1. CLOTHING & FASHION:`.
pub struct Section {
    title: String,
    items: Vec<String>,
}

impl Section {
    pub fn new(title: &str, items: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            items: items.iter().map(|item| item.to_string()).collect(),
        }
    }
}

/// Sections numbered from 1, separated by blank lines.
pub struct NumberedSections {
    sections: Vec<Section>,
}

impl NumberedSections {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }
}

impl PromptComponent for NumberedSections {
    fn render(&self) -> String {
        self.sections
            .iter()
            .enumerate()
            .map(|(index, section)| {
                let mut lines = vec![format!("{}. {}:", index + 1, section.title)];
                lines.extend(section.items.iter().map(|item| format!("- {item}")));
                lines.join("\n")
            })
            .collect::<Vec<String>>()
            .join("\n\n")
    }
}

/// Closing guidance on tone and formatting.
pub struct Guidance {
    text: String,
}

impl Guidance {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl PromptComponent for Guidance {
    fn render(&self) -> String {
        self.text.clone()
    }
}
