//! Chain configuration, loadable from YAML
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ChainError;

/// Per-stage navigation options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageOptions {
    /// Boolean parameter that must be `true` before the chain may advance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_parameter: Option<String>,
    /// Advance as soon as the ready parameter is set to `true`
    #[serde(default)]
    pub auto_advance: bool,
}

impl StageOptions {
    pub fn ready_when(parameter: impl Into<String>) -> Self {
        Self {
            ready_parameter: Some(parameter.into()),
            auto_advance: false,
        }
    }

    pub fn auto_advance(mut self) -> Self {
        self.auto_advance = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Also carry same-named parameters forward, not only declared outputs
    #[serde(default)]
    pub inherit_params: bool,
    /// Options applied to stages registered under these names
    #[serde(default)]
    pub stages: HashMap<String, StageOptions>,
}

impl ChainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Load configuration from a YAML file
    pub fn load(path: &str) -> Result<Self, ChainError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChainError::Config(format!("failed to read {}: {}", path, e)))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ChainError> {
        serde_yaml::from_str(yaml).map_err(|e| ChainError::Config(e.to_string()))
    }

    pub fn options_for(&self, stage: &str) -> StageOptions {
        self.stages.get(stage).cloned().unwrap_or_default()
    }
}
