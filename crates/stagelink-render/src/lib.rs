//! Stagelink Render: chain views to text, Markdown or HTML
//!
//! The core only produces a structural [`ChainView`]. This crate flattens
//! the active stage's node tree into the requested format and wraps it in a
//! Handlebars scaffold (stage indicator + navigation controls).
//!
//! # Example
//!
//! ```ignore
//! use stagelink_render::{render_view, Format};
//!
//! let view = chain.render()?;
//! println!("{}", render_view(&view, Format::Text)?);
//! ```

pub mod nodes;
pub mod renderer;
pub mod templates;

use renderer::TemplateRenderer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stagelink_core::ChainView;
use std::str::FromStr;
use templates::TemplatesFile;
use thiserror::Error;

/// Output encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Text,
    Markdown,
    Html,
}

impl Format {
    pub fn template_name(&self) -> &'static str {
        match self {
            Format::Text => "chain.text",
            Format::Markdown => "chain.markdown",
            Format::Html => "chain.html",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Format::Text => "text/plain",
            Format::Markdown => "text/markdown",
            Format::Html => "text/html",
        }
    }
}

impl FromStr for Format {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Format::Text),
            "markdown" | "md" => Ok(Format::Markdown),
            "html" => Ok(Format::Html),
            other => Err(RenderError::UnknownFormat(other.to_string())),
        }
    }
}

/// Errors that can occur during rendering
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template load failed: {0}")]
    Template(String),
    #[error("Render failed: {0}")]
    Render(String),
    #[error("Unknown format: {0}")]
    UnknownFormat(String),
}

/// Renders chain views with one escaping renderer for HTML and one verbatim
/// renderer for text and Markdown.
pub struct ViewRenderer {
    plain: TemplateRenderer<'static>,
    html: TemplateRenderer<'static>,
}

impl ViewRenderer {
    pub fn new(templates: TemplatesFile) -> Result<Self, RenderError> {
        for format in [Format::Text, Format::Markdown, Format::Html] {
            if templates.get(format.template_name()).is_none() {
                return Err(RenderError::Template(format!(
                    "missing template '{}'",
                    format.template_name()
                )));
            }
        }

        Ok(Self {
            plain: TemplateRenderer::plain(templates.clone()).map_err(RenderError::Template)?,
            html: TemplateRenderer::html(templates).map_err(RenderError::Template)?,
        })
    }

    /// Renderer over the templates shipped with the crate
    pub fn builtin() -> Result<Self, RenderError> {
        Self::new(TemplatesFile::builtin().map_err(RenderError::Template)?)
    }

    /// Built-in templates overridden by those found in `path`
    pub fn load(path: &str) -> Result<Self, RenderError> {
        let base = TemplatesFile::builtin().map_err(RenderError::Template)?;
        let custom = TemplatesFile::load(path).map_err(RenderError::Template)?;
        Self::new(base.merge(custom))
    }

    pub fn render(&self, view: &ChainView, format: Format) -> Result<String, RenderError> {
        let data = view_data(view, format)?;
        let renderer = match format {
            Format::Html => &self.html,
            Format::Text | Format::Markdown => &self.plain,
        };
        let output = renderer
            .render(format.template_name(), &data)
            .map_err(RenderError::Render)?;
        tracing::debug!(format = ?format, bytes = output.len(), "rendered chain view");
        Ok(output)
    }
}

/// Template data: the serialized view plus the active stage pre-rendered as `body`
fn view_data(view: &ChainView, format: Format) -> Result<Value, RenderError> {
    let mut data = serde_json::to_value(view).map_err(|e| RenderError::Render(e.to_string()))?;
    if let Value::Object(map) = &mut data {
        map.insert(
            "body".to_string(),
            Value::String(nodes::render_node(&view.active, format)),
        );
    }
    Ok(data)
}

/// Render with the built-in templates
pub fn render_view(view: &ChainView, format: Format) -> Result<String, RenderError> {
    ViewRenderer::builtin()?.render(view, format)
}
