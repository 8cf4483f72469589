//! Turns anchor attribute values into a [`PlacementSpec`].
//!
//! Two surface syntaxes are accepted and may be mixed:
//!
//! - `data-anchor="#target, top-start, 0.5rem"`
//! - `data-anchor="#target"` with `data-anchor-placement="top-start"` and
//!   `data-anchor-offset="0.5rem"`
//!
//! Each field comes from the comma form first, then the separate attribute,
//! then the configured default. Unknown placements and malformed offsets
//! fall through to the next source instead of failing.

use crate::config::AnchorConfig;
use crate::placement::Placement;
use crate::units::Length;
use serde::{Deserialize, Serialize};

/// Resolved positioning request for one floating element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementSpec {
    /// Selector of the reference element
    pub target: String,
    /// Requested placement
    pub placement: Placement,
    /// Distance between reference and floating element
    pub offset: Length,
}

impl PlacementSpec {
    /// Create a spec.
    #[must_use]
    pub fn new(target: impl Into<String>, placement: Placement, offset: Length) -> Self {
        Self {
            target: target.into(),
            placement,
            offset,
        }
    }
}

/// The separate `data-anchor-placement` / `data-anchor-offset` attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorAttributes {
    /// Raw `data-anchor-placement` value
    pub placement: Option<String>,
    /// Raw `data-anchor-offset` value
    pub offset: Option<String>,
}

impl AnchorAttributes {
    /// Attributes with both values set.
    #[must_use]
    pub fn new(placement: impl Into<String>, offset: impl Into<String>) -> Self {
        Self {
            placement: Some(placement.into()),
            offset: Some(offset.into()),
        }
    }
}

/// Resolve with built-in defaults (`bottom`, `8px`).
///
/// Returns `None` when no target selector is present.
#[must_use]
pub fn parse_spec(raw: &str, attrs: &AnchorAttributes) -> Option<PlacementSpec> {
    parse_spec_with(raw, attrs, &AnchorConfig::default())
}

/// Resolve with defaults taken from `config`.
#[must_use]
pub fn parse_spec_with(
    raw: &str,
    attrs: &AnchorAttributes,
    config: &AnchorConfig,
) -> Option<PlacementSpec> {
    let mut parts = raw.splitn(3, ',').map(str::trim);
    let target = parts.next().unwrap_or_default();
    if target.is_empty() {
        return None;
    }
    let inline_placement = parts.next().filter(|s| !s.is_empty());
    let inline_offset = parts.next().filter(|s| !s.is_empty());

    let placement = [inline_placement, attrs.placement.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|s| s.parse::<Placement>().ok())
        .unwrap_or(config.default_placement);

    let offset = [inline_offset, attrs.offset.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|s| Length::parse(s).ok())
        .unwrap_or(config.default_offset);

    Some(PlacementSpec::new(target, placement, offset))
}
