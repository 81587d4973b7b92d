//! Partial linkage configuration.

use crate::logger::Severity;
use std::str::FromStr;
use thiserror::Error;

/// Whether the linker patches partially linked code or refuses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PartialLinkageMode {
    /// Rewrite unlinked code into runtime linkage errors.
    #[default]
    Enabled,
    /// Leave the tree untouched; unlinked symbols are link-time errors.
    Disabled,
}

/// Severity at which rewrites are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PartialLinkageLogLevel {
    Info,
    #[default]
    Warning,
    Error,
}

impl PartialLinkageLogLevel {
    pub fn severity(self) -> Severity {
        match self {
            PartialLinkageLogLevel::Info => Severity::Info,
            PartialLinkageLogLevel::Warning => Severity::Warning,
            PartialLinkageLogLevel::Error => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown partial linkage mode `{0}` (expected `enable` or `disable`)")]
    UnknownMode(String),

    #[error("unknown partial linkage log level `{0}` (expected `info`, `warning` or `error`)")]
    UnknownLogLevel(String),
}

impl FromStr for PartialLinkageMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "enable" | "enabled" | "on" | "true" | "1" => Ok(PartialLinkageMode::Enabled),
            "disable" | "disabled" | "off" | "false" | "0" => Ok(PartialLinkageMode::Disabled),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl FromStr for PartialLinkageLogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(PartialLinkageLogLevel::Info),
            "warning" | "warn" => Ok(PartialLinkageLogLevel::Warning),
            "error" => Ok(PartialLinkageLogLevel::Error),
            _ => Err(ConfigError::UnknownLogLevel(s.to_string())),
        }
    }
}

/// Configuration for the partial linkage pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartialLinkageConfig {
    pub mode: PartialLinkageMode,
    /// Severity of the diagnostic emitted for each rewrite
    pub log_level: PartialLinkageLogLevel,
}

impl PartialLinkageConfig {
    /// Create config from environment variables.
    ///
    /// Unset or unrecognized values fall back to the defaults.
    pub fn from_env() -> Self {
        let mode = std::env::var("TETHER_PARTIAL_LINKAGE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        let log_level = std::env::var("TETHER_PARTIAL_LINKAGE_LOG_LEVEL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self { mode, log_level }
    }

    pub fn is_enabled(&self) -> bool {
        self.mode == PartialLinkageMode::Enabled
    }

    /// Create a builder for configuration.
    pub fn builder() -> PartialLinkageConfigBuilder {
        PartialLinkageConfigBuilder::default()
    }
}

/// Builder for partial linkage configuration.
#[derive(Debug, Default)]
pub struct PartialLinkageConfigBuilder {
    config: PartialLinkageConfig,
}

impl PartialLinkageConfigBuilder {
    pub fn mode(mut self, mode: PartialLinkageMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn log_level(mut self, log_level: PartialLinkageLogLevel) -> Self {
        self.config.log_level = log_level;
        self
    }

    pub fn build(self) -> PartialLinkageConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PartialLinkageConfig::default();
        assert!(config.is_enabled());
        assert_eq!(config.log_level.severity(), Severity::Warning);
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(
            "disable".parse::<PartialLinkageMode>(),
            Ok(PartialLinkageMode::Disabled)
        );
        assert_eq!(
            " Error ".parse::<PartialLinkageLogLevel>(),
            Ok(PartialLinkageLogLevel::Error)
        );
        assert!(matches!(
            "sometimes".parse::<PartialLinkageMode>(),
            Err(ConfigError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_builder() {
        let config = PartialLinkageConfig::builder()
            .mode(PartialLinkageMode::Disabled)
            .log_level(PartialLinkageLogLevel::Info)
            .build();
        assert!(!config.is_enabled());
        assert_eq!(config.log_level, PartialLinkageLogLevel::Info);
    }
}
