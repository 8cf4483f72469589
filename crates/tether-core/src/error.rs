//! Error types shared across the crate.

use thiserror::Error;

/// Failure to parse a placement keyword such as `bottom-start`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown placement `{0}`")]
pub struct PlacementParseError(pub String);

/// Failure to parse a CSS length literal such as `1.5rem`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LengthParseError {
    /// Input was empty or whitespace only
    #[error("empty length")]
    Empty,
    /// The numeric part could not be parsed
    #[error("invalid number in length `{0}`")]
    InvalidNumber(String),
    /// The number parsed but is NaN or infinite
    #[error("length `{0}` is not finite")]
    NotFinite(String),
    /// The unit suffix is not one of px, rem, em, %, vw, vh
    #[error("unknown unit `{0}`")]
    UnknownUnit(String),
}

/// Failure to load configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON could not be decoded into the configuration type
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// A field decoded but holds an unusable value
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Failure while registering or running an attribute plugin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    /// A plugin with this name is already registered
    #[error("plugin `{0}` is already registered")]
    Duplicate(String),
    /// The attribute value resolved to no target selector
    #[error("`data-{plugin}` has no target")]
    MissingTarget {
        /// Plugin reporting the problem
        plugin: &'static str,
    },
    /// The target selector matched nothing
    #[error("`data-{plugin}` target `{selector}` not found")]
    TargetNotFound {
        /// Plugin reporting the problem
        plugin: &'static str,
        /// Selector that failed to resolve
        selector: String,
    },
    /// The attribute carried a key where none is allowed, or lacked a required one
    #[error("`data-{plugin}` key requirement violated")]
    KeyRequirement {
        /// Plugin reporting the problem
        plugin: &'static str,
    },
}
