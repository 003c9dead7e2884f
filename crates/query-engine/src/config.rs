use std::env;

use serde::{Deserialize, Serialize};

use crate::registry::OperatorTokens;

pub const SHORT_CIRCUIT_ENV: &str = "QUERY_ENGINE_SHORT_CIRCUIT";

/// Engine settings a host may load from its own configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub short_circuit: bool,
    pub operators: OperatorTokens,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            short_circuit: true,
            operators: OperatorTokens::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `QUERY_ENGINE_SHORT_CIRCUIT`.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(short_circuit) = read_flag(SHORT_CIRCUIT_ENV) {
            self.short_circuit = short_circuit;
        }
        self
    }
}

fn read_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|value| parse_flag(&value))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
