//! Template loading for chain views.
//!
//! Templates files are YAML with named Handlebars templates:
//!
//! ```yaml
//! version: "1.0"
//! templates:
//!   chain.text:
//!     description: Plain-text scaffold
//!     template: "{{#each stages}}{{name}} {{/each}}"
//! ```

use serde::Deserialize;
use std::collections::HashMap;

/// Templates shipped with the crate
pub const DEFAULT_TEMPLATES: &str = include_str!("../templates/chain-views.yaml");

/// Top-level templates file structure
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesFile {
    pub version: String,
    pub templates: HashMap<String, Template>,
}

/// A single template definition
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub description: String,
    pub template: String,
}

impl TemplatesFile {
    /// Load templates from a YAML file
    pub fn load(path: &str) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read templates file: {}", e))?;
        Self::from_yaml(&content)
    }

    /// Parse templates from YAML content
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        serde_yaml::from_str(yaml).map_err(|e| format!("Failed to parse templates YAML: {}", e))
    }

    pub fn builtin() -> Result<Self, String> {
        Self::from_yaml(DEFAULT_TEMPLATES)
    }

    /// Get a template by name
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Replace or add templates from `other`
    pub fn merge(mut self, other: TemplatesFile) -> Self {
        self.templates.extend(other.templates);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_parse() {
        let file = TemplatesFile::builtin().unwrap();
        for name in ["chain.text", "chain.markdown", "chain.html"] {
            assert!(file.get(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_merge_overrides() {
        let base = TemplatesFile::builtin().unwrap();
        let custom = TemplatesFile::from_yaml(
            r#"
version: "1.0"
templates:
  chain.text:
    description: Names only
    template: "{{#each stages}}{{name}};{{/each}}"
"#,
        )
        .unwrap();

        let merged = base.merge(custom);
        assert_eq!(
            merged.get("chain.text").unwrap().template,
            "{{#each stages}}{{name}};{{/each}}"
        );
        assert!(merged.get("chain.html").is_some());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(TemplatesFile::from_yaml("templates: [").is_err());
    }
}
