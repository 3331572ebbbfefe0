//! Configuration for the brainz simulation.
//!
//! Maps directly to `brainz.toml`. Every field has a serde default so a
//! partial (or empty) file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrainzConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Friendship and interaction settings.
    #[serde(default)]
    pub social: SocialConfig,
    /// SQLite storage settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl BrainzConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `BrainzError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::BrainzError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Friendship and interaction scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    /// Points awarded per shared feature when two brains interact.
    #[serde(default = "default_compatibility_weight")]
    pub compatibility_weight: u32,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            compatibility_weight: default_compatibility_weight(),
        }
    }
}

/// SQLite connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Use WAL journaling for file-backed databases.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// How long a statement waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
    /// Enforce the `brain_id` foreign keys.
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            wal_mode: true,
            busy_timeout_ms: default_busy_timeout(),
            foreign_keys: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_compatibility_weight() -> u32 { crate::social::DEFAULT_COMPATIBILITY_WEIGHT }
fn default_busy_timeout() -> u64 { 5000 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = BrainzConfig::from_toml("").expect("parse");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.social.compatibility_weight, 10);
        assert!(config.persistence.wal_mode);
        assert_eq!(config.persistence.busy_timeout_ms, 5000);
    }

    #[test]
    fn partial_sections_override() {
        let config = BrainzConfig::from_toml(
            "[social]\ncompatibility_weight = 3\n\n[persistence]\nwal_mode = false\n",
        )
        .expect("parse");
        assert_eq!(config.social.compatibility_weight, 3);
        assert!(!config.persistence.wal_mode);
        assert!(config.persistence.foreign_keys);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = BrainzConfig::from_toml("[social\n").expect_err("should fail");
        assert!(matches!(err, crate::BrainzError::Config(_)));
    }
}
