//! Flattening `RenderNode` trees into text, Markdown or HTML fragments.

use handlebars::html_escape;
use serde_json::Value;
use stagelink_core::{Bounds, RenderNode};

use crate::Format;

pub fn render_node(node: &RenderNode, format: Format) -> String {
    match format {
        Format::Text => text(node),
        Format::Markdown => markdown(node),
        Format::Html => html(node),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Single-line children sit side by side, anything taller stacks.
fn join_row(parts: Vec<String>, separator: &str) -> String {
    if parts.iter().any(|p| p.contains('\n')) {
        parts.join("\n")
    } else {
        parts.join(separator)
    }
}

fn text(node: &RenderNode) -> String {
    match node {
        RenderNode::Text { text } => text.clone(),
        RenderNode::Markdown { source } => source.clone(),
        RenderNode::Latex { source } => format!("${}$", source),
        RenderNode::Widget {
            name,
            value,
            bounds,
            ..
        } => match bounds {
            Some(bounds) => format!("{} = {} {}", name, display_value(value), bounds),
            None => format!("{} = {}", name, display_value(value)),
        },
        RenderNode::Button { label, enabled, .. } => {
            if *enabled {
                format!("[{}]", label)
            } else {
                format!("({})", label)
            }
        }
        RenderNode::Row { children } => join_row(children.iter().map(text).collect(), "  "),
        RenderNode::Column { children } => {
            children.iter().map(text).collect::<Vec<_>>().join("\n")
        }
        RenderNode::Titled { title, body } => format!("{}\n{}", title, text(body)),
    }
}

fn markdown(node: &RenderNode) -> String {
    match node {
        RenderNode::Text { text } => text.clone(),
        RenderNode::Markdown { source } => source.clone(),
        RenderNode::Latex { source } => format!("${}$", source),
        RenderNode::Widget { name, value, .. } => {
            format!("- **{}**: `{}`", name, display_value(value))
        }
        RenderNode::Button {
            label,
            action,
            enabled,
        } => {
            if *enabled {
                format!("[{}](#{})", label, action)
            } else {
                format!("~~{}~~", label)
            }
        }
        RenderNode::Row { children } => join_row(children.iter().map(markdown).collect(), " "),
        RenderNode::Column { children } => children
            .iter()
            .map(markdown)
            .collect::<Vec<_>>()
            .join("\n"),
        RenderNode::Titled { title, body } => format!("### {}\n\n{}", title, markdown(body)),
    }
}

fn bound_attrs(bounds: &Option<Bounds>) -> String {
    let mut attrs = String::new();
    if let Some(bounds) = bounds {
        if let Some(lower) = bounds.lower {
            attrs.push_str(&format!(" min=\"{}\"", lower));
        }
        if let Some(upper) = bounds.upper {
            attrs.push_str(&format!(" max=\"{}\"", upper));
        }
    }
    attrs
}

fn html(node: &RenderNode) -> String {
    match node {
        RenderNode::Text { text } => format!("<p>{}</p>", html_escape(text)),
        RenderNode::Markdown { source } => {
            format!("<div class=\"markdown\">{}</div>", html_escape(source))
        }
        RenderNode::Latex { source } => {
            format!("<span class=\"math\">\\({}\\)</span>", html_escape(source))
        }
        RenderNode::Widget {
            name,
            value,
            kind,
            bounds,
        } => format!(
            "<label>{name}<input name=\"{name}\" value=\"{value}\" data-kind=\"{kind}\"{attrs}></label>",
            name = html_escape(name),
            value = html_escape(&display_value(value)),
            kind = html_escape(&kind.to_string()),
            attrs = bound_attrs(bounds),
        ),
        RenderNode::Button {
            label,
            action,
            enabled,
        } => format!(
            "<button data-action=\"{}\"{}>{}</button>",
            html_escape(action),
            if *enabled { "" } else { " disabled" },
            html_escape(label)
        ),
        RenderNode::Row { children } => format!(
            "<div class=\"row\">{}</div>",
            children.iter().map(html).collect::<String>()
        ),
        RenderNode::Column { children } => format!(
            "<div class=\"column\">{}</div>",
            children.iter().map(html).collect::<String>()
        ),
        RenderNode::Titled { title, body } => format!(
            "<section><h3>{}</h3>{}</section>",
            html_escape(title),
            html(body)
        ),
    }
}
