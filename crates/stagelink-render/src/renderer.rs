//! Handlebars rendering with the helpers chain templates rely on:
//! - status_marker: ✓ / ● / ○ for complete, active, pending
//! - eq: equality for `{{#if (eq a b)}}`, used to show titles that differ
//!   from the registered name

use handlebars::{handlebars_helper, Handlebars};
use serde_json::Value;

use crate::templates::TemplatesFile;

handlebars_helper!(status_marker: |status: str| match status {
    "complete" => "✓",
    "active" => "●",
    _ => "○",
});

handlebars_helper!(eq: |left: Json, right: Json| left == right);

/// Compiled renderer with registered helpers
pub struct TemplateRenderer<'a> {
    handlebars: Handlebars<'a>,
}

impl<'a> TemplateRenderer<'a> {
    /// Renderer whose `{{value}}` expressions are HTML-escaped
    pub fn html(templates: TemplatesFile) -> Result<Self, String> {
        Self::build(templates, true)
    }

    /// Renderer that writes values verbatim, for text and Markdown
    pub fn plain(templates: TemplatesFile) -> Result<Self, String> {
        Self::build(templates, false)
    }

    fn build(templates: TemplatesFile, escape_html: bool) -> Result<Self, String> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        if !escape_html {
            handlebars.register_escape_fn(handlebars::no_escape);
        }

        handlebars.register_helper("status_marker", Box::new(status_marker));
        handlebars.register_helper("eq", Box::new(eq));

        for (name, template) in &templates.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| format!("Template '{}' is invalid: {}", name, e))?;
        }

        Ok(TemplateRenderer { handlebars })
    }

    /// Render a named template with data
    pub fn render(&self, template_name: &str, data: &Value) -> Result<String, String> {
        self.handlebars
            .render(template_name, data)
            .map_err(|e| format!("Render error: {}", e))
    }
}
