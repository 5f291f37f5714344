//! Template system for binding generation
//!
//! Contains the Handlebars templates for the bindings and hooks modules.

use handlebars::Handlebars;
use serde::Serialize;
use sol2js_core::{Error, Result};

/// Bindings module template name
pub const BINDINGS_TEMPLATE: &str = "bindings";

/// Hooks module template name
pub const HOOKS_TEMPLATE: &str = "hooks";

/// Template manager for binding generation
pub struct TemplateManager {
    handlebars: Handlebars<'static>,
}

impl TemplateManager {
    /// Create a new template manager and register all templates
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        // Output is JavaScript, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        Self::register_templates(&mut handlebars)?;

        Ok(Self { handlebars })
    }

    /// Register all built-in templates
    fn register_templates(handlebars: &mut Handlebars) -> Result<()> {
        handlebars.register_template_string(BINDINGS_TEMPLATE, include_str!("bindings.js.hbs"))
            .map_err(|e| Error::template(format!("Failed to register {} template: {}", BINDINGS_TEMPLATE, e)))?;

        handlebars.register_template_string(HOOKS_TEMPLATE, include_str!("hooks.js.hbs"))
            .map_err(|e| Error::template(format!("Failed to register {} template: {}", HOOKS_TEMPLATE, e)))?;

        Ok(())
    }

    /// Render a template with the given data
    pub fn render<T: Serialize>(&self, template_name: &str, data: &T) -> Result<String> {
        self.handlebars.render(template_name, data)
            .map_err(|e| Error::template(format!("Failed to render template {}: {}", template_name, e)))
    }
}
