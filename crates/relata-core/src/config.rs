//! Database configuration.
//!
//! Loaded from TOML, for example:
//!
//! ```toml
//! name = ":memory:"
//! debug = true
//! metrics = true
//! max_populate_depth = 4
//! ```

use crate::DEFAULT_MAX_POPULATE_DEPTH;
use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error as ThisError;

/// Name of the only supported storage target.
pub const MEMORY_DB_NAME: &str = ":memory:";

///
/// ConfigError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {reason}")]
    Parse { reason: String },

    #[error("unsupported database name '{name}', only ':memory:' is available")]
    UnsupportedName { name: String },

    #[error("max_populate_depth must be at least 1")]
    ZeroPopulateDepth,
}

///
/// DbConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DbConfig {
    /// Storage target; only the in-memory store exists.
    pub name: String,
    /// Emit `tracing` debug events for every session operation.
    pub debug: bool,
    /// Record counters through the metrics sink.
    pub metrics: bool,
    /// Maximum number of segments in a populate path.
    pub max_populate_depth: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            name: MEMORY_DB_NAME.to_string(),
            debug: false,
            metrics: true,
            max_populate_depth: DEFAULT_MAX_POPULATE_DEPTH,
        }
    }
}

impl DbConfig {
    /// In-memory configuration with debug logging switched on.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            debug: true,
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|err| ConfigError::Parse {
            reason: err.to_string(),
        })?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;

        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name != MEMORY_DB_NAME {
            return Err(ConfigError::UnsupportedName {
                name: self.name.clone(),
            });
        }
        if self.max_populate_depth == 0 {
            return Err(ConfigError::ZeroPopulateDepth);
        }

        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = DbConfig::from_toml_str("").expect("empty config should parse");

        assert_eq!(config, DbConfig::default());
        assert_eq!(config.name, ":memory:");
        assert!(config.metrics);
        assert_eq!(config.max_populate_depth, 4);
    }

    #[test]
    fn fields_override_defaults() {
        let config = DbConfig::from_toml_str("debug = true\nmax_populate_depth = 2\n")
            .expect("config should parse");

        assert!(config.debug);
        assert_eq!(config.max_populate_depth, 2);
    }

    #[test]
    fn invalid_documents_are_rejected() {
        assert!(matches!(
            DbConfig::from_toml_str("debug = \"yes\""),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            DbConfig::from_toml_str("pool_size = 4"),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(
            DbConfig::from_toml_str("name = \"library.db\""),
            Err(ConfigError::UnsupportedName {
                name: "library.db".to_string()
            })
        );
        assert_eq!(
            DbConfig::from_toml_str("max_populate_depth = 0"),
            Err(ConfigError::ZeroPopulateDepth)
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            DbConfig::load("/nonexistent/relata.toml"),
            Err(ConfigError::Read { .. })
        ));
    }
}
