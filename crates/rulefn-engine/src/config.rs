// Engine Configuration
//
// Settings for FunctionExecutor, optionally loaded from environment variables.

use std::env;

use serde::{Deserialize, Serialize};

/// Configuration for [`FunctionExecutor`](crate::FunctionExecutor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Keep resolved operation tables per rule function type
    #[serde(default = "default_cache_resolutions")]
    pub cache_resolutions: bool,
}

fn default_cache_resolutions() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_resolutions: default_cache_resolutions(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `RULEFN_CACHE_RESOLUTIONS`: Cache resolved operation tables (default: true)
    pub fn from_env() -> Self {
        let cache_resolutions = env::var("RULEFN_CACHE_RESOLUTIONS")
            .map(|v| parse_flag(&v))
            .unwrap_or_else(|_| default_cache_resolutions());

        Self { cache_resolutions }
    }

    pub fn with_cache_resolutions(mut self, enabled: bool) -> Self {
        self.cache_resolutions = enabled;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
