use handlebars::{Handlebars, no_escape};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TEngineError {
    #[error("Template error: {0}")]
    TemplateError(#[from] Box<handlebars::TemplateError>),
    #[error("Render error: {0}")]
    RenderError(#[from] handlebars::RenderError),
    #[error("Template not found: {0}")]
    TemplateNotFoundError(String),
}

impl From<handlebars::TemplateError> for TEngineError {
    fn from(e: handlebars::TemplateError) -> Self {
        TEngineError::TemplateError(Box::new(e))
    }
}

/// Handlebars wrapper used to interpolate user fields into prompt text.
///
/// Output is not HTML-escaped: prompts are plain text and quotes or
/// ampersands typed by the user must reach the model unchanged.
pub struct TEngine {
    handlebars: Handlebars<'static>,
}

impl Default for TEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TEngine {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(no_escape);
        TEngine { handlebars }
    }

    pub fn register_template_string(
        &mut self,
        name: &str,
        template: &str,
    ) -> Result<(), TEngineError> {
        self.handlebars.register_template_string(name, template)?;
        Ok(())
    }

    /// Renders a previously registered template.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, TEngineError> {
        if !self.handlebars.has_template(name) {
            return Err(TEngineError::TemplateNotFoundError(name.to_string()));
        }
        Ok(self.handlebars.render(name, data)?)
    }
}
