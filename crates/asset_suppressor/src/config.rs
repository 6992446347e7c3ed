use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::plugin::HookEvent;

/// How misuse of the plugin (applying twice, unsupported host) is reported.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Strictness {
    /// log the error and keep going as a no-op
    #[serde(rename = "tolerant")]
    #[default]
    Tolerant,
    /// fail with the error
    #[serde(rename = "strict")]
    Strict,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    #[serde(default)]
    pub strictness: Strictness,
    #[serde(default)]
    pub hook: HookEvent,
}

impl PluginConfig {
    pub fn strict() -> Self {
        Self {
            strictness: Strictness::Strict,
            ..Default::default()
        }
    }

    pub fn from_literal_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(s).with_context(|| format!("invalid plugin config: {}", s))
    }
}
