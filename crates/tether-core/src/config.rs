//! Runtime configuration.
//!
//! Every field has a default, so `{}` is a valid configuration and callers
//! only spell out what they change:
//!
//! ```
//! use tether_core::{Config, Placement};
//!
//! let config = Config::from_json(r#"{ "anchor": { "default_placement": "top" } }"#).unwrap();
//! assert_eq!(config.anchor.default_placement, Placement::Top);
//! assert_eq!(config.persist.key, "tether");
//! ```

use crate::engine::EngineOptions;
use crate::error::ConfigError;
use crate::persist::StorageType;
use crate::placement::Placement;
use crate::units::Length;
use serde::{Deserialize, Serialize};

/// Settings for the anchor plugin and its positioners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Placement used when the attribute names none or an unknown one
    pub default_placement: Placement,
    /// Offset used when the attribute names none or a malformed one
    pub default_offset: Length,
    /// Distance kept from the viewport edges when deciding to flip
    pub viewport_padding: f64,
    /// Flip to a fallback placement on overflow
    pub flip: bool,
    /// Use native CSS anchor positioning when the browser supports it
    pub prefer_native: bool,
    /// After native positioning, check the result once and switch to the
    /// geometry fallback when the element ended up off screen
    pub probe_native: bool,
    /// Dashed-ident prefix for generated anchor names
    pub anchor_prefix: String,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            default_placement: Placement::Bottom,
            default_offset: Length::DEFAULT_OFFSET,
            viewport_padding: 8.0,
            flip: true,
            prefer_native: true,
            probe_native: false,
            anchor_prefix: "--anchor-".to_string(),
        }
    }
}

impl AnchorConfig {
    /// Engine options derived from this configuration.
    #[must_use]
    pub const fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            padding: self.viewport_padding,
            flip: self.flip,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.viewport_padding.is_finite() || self.viewport_padding < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "viewport_padding",
                reason: format!("{} is not a non-negative number", self.viewport_padding),
            });
        }
        if !self.anchor_prefix.starts_with("--") {
            return Err(ConfigError::InvalidValue {
                field: "anchor_prefix",
                reason: format!("`{}` must start with `--`", self.anchor_prefix),
            });
        }
        Ok(())
    }
}

/// Settings for the persist plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Storage key used when the attribute has no key suffix
    pub key: String,
    /// Quiet period before a burst of signal changes is written
    pub debounce_ms: u32,
    /// Storage used when the attribute has no `session` modifier
    pub storage: StorageType,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            key: "tether".to_string(),
            debounce_ms: 100,
            storage: StorageType::Local,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Anchor plugin settings
    pub anchor: AnchorConfig,
    /// Persist plugin settings
    pub persist: PersistConfig,
}

impl Config {
    /// Decode and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.anchor.validate()?;
        if config.persist.key.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "key",
                reason: "storage key is empty".to_string(),
            });
        }
        Ok(config)
    }
}
