//! Runtime configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Queue drains a rejected future may go without a handler before it is
/// reported as unhandled.
pub const DEFAULT_REJECTION_GRACE_PASSES: u32 = 1;

/// Tunables for a [`Runtime`](crate::Runtime).
///
/// Missing fields take their defaults, so `{}` is a valid config.
///
/// # Examples
///
/// ```
/// use eventual::RuntimeConfig;
///
/// let config = RuntimeConfig::from_json_str(r#"{ "rejection_grace_passes": 2 }"#).unwrap();
/// assert_eq!(config.rejection_grace_passes, 2);
/// assert!(config.track_rejections);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Queue drains a rejection may stay unobserved before the
    /// unhandled-rejection signal fires. Must be at least 1.
    ///
    /// The first check runs when the drain that saw the rejection empties
    /// the queue; each further pass waits for the next host drain, so the
    /// host can attach handlers between drains.
    pub rejection_grace_passes: u32,
    /// Whether the rejection tracker observes settlements at all.
    pub track_rejections: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            rejection_grace_passes: DEFAULT_REJECTION_GRACE_PASSES,
            track_rejections: true,
        }
    }
}

impl RuntimeConfig {
    /// Parses and validates a config from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Checks that every field holds a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rejection_grace_passes == 0 {
            return Err(ConfigError::Invalid(
                "rejection_grace_passes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Serializes this config as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
