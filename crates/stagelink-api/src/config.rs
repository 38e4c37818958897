//! Server settings, read from the environment
use std::env;

use crate::sessions::DEFAULT_MAX_SESSIONS;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8787";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Listen address (`STAGELINK_ADDR`)
    pub addr: String,
    /// Chain configuration YAML (`STAGELINK_CHAIN_CONFIG`)
    pub chain_config: Option<String>,
    /// Template overrides YAML (`STAGELINK_TEMPLATES`)
    pub templates: Option<String>,
    /// Live sessions before new ones are refused (`STAGELINK_MAX_SESSIONS`)
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            chain_config: None,
            templates: None,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            addr: non_empty("STAGELINK_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            chain_config: non_empty("STAGELINK_CHAIN_CONFIG"),
            templates: non_empty("STAGELINK_TEMPLATES"),
            max_sessions: non_empty("STAGELINK_MAX_SESSIONS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_MAX_SESSIONS),
        }
    }
}
