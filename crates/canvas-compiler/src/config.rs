//! Pipeline configuration, read from JSON by hosts.

use canvas_sanitizer::SanitizerConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::resolver::ResolverConfig;

/// Settings of the execution scope a render runs in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Evaluation steps allowed per render. `None` imposes no limit.
    pub step_limit: Option<u64>,
    /// Seed of every scope's `Math.random`.
    pub random_seed: u64,
    /// What `Date.now()` reports, in milliseconds since the epoch.
    pub clock_ms: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            step_limit: None,
            random_seed: 0x5EED,
            clock_ms: 1_700_000_000_000.0,
        }
    }
}

/// Configuration of the whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    pub sanitizer: SanitizerConfig,
    pub resolver: ResolverConfig,
    pub runtime: RuntimeConfig,
}

impl CanvasConfig {
    /// Parse a (possibly partial) JSON configuration; absent keys keep
    /// their defaults, unknown keys are rejected.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(CanvasConfig::from_json("{}").unwrap(), CanvasConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = CanvasConfig::from_json(
            r##"{ "resolver": { "alias_prefixes": ["#/"] }, "runtime": { "step_limit": 5000 } }"##,
        )
        .unwrap();
        assert_eq!(config.resolver.alias_prefixes, vec!["#/".to_string()]);
        assert_eq!(config.runtime.step_limit, Some(5000));
        assert!(config.sanitizer.nest_helpers);
    }

    #[test]
    fn test_no_timeout_by_default() {
        assert_eq!(RuntimeConfig::default().step_limit, None);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = CanvasConfig::from_json(r#"{ "bundler": {} }"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}
