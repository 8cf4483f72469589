//! Anchor positioning and attribute plugins for hypermedia front-ends.
//!
//! This crate holds everything that does not need a browser:
//! - Geometry: [`Point`], [`Size`], [`Rect`]
//! - Placement engine: [`Placement`], [`compute_position`] with viewport flip
//! - Units: [`Length`] and conversion to pixels
//! - Resolver: [`parse_spec`] for `data-anchor` values
//! - Positioners over a [`LayoutHost`]: native CSS anchors or the geometry
//!   fallback, chosen by [`attach`]
//! - Attribute plugins: [`AnchorPlugin`], [`PersistPlugin`]
//! - Timing: [`Debounce`], [`Throttle`]
//!
//! The `tether` crate implements [`LayoutHost`] and friends over `web-sys`.
//! Scripted doubles for tests live in `testing`, behind the `testing` feature.
//!
//! ```
//! use tether_core::{compute_position, EngineOptions, Placement, Rect, Size};
//!
//! let reference = Rect::from_edges(100.0, 100.0, 200.0, 130.0);
//! let pos = compute_position(
//!     &reference,
//!     Size::new(50.0, 20.0),
//!     Placement::Top,
//!     10.0,
//!     Size::new(1024.0, 768.0),
//!     &EngineOptions::default(),
//! );
//! assert_eq!((pos.x, pos.y), (125.0, 70.0));
//! ```

mod config;
pub mod css;
mod engine;
mod error;
mod geometry;
pub mod host;
pub mod persist;
mod placement;
pub mod plugin;
pub mod positioner;
mod registry;
mod resolve;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod timing;
mod units;

pub use config::{AnchorConfig, Config, PersistConfig};
pub use engine::{compute_position, fits, place, EngineOptions, FinalPosition};
pub use error::{ConfigError, LengthParseError, PlacementParseError, PluginError};
pub use geometry::{Point, Rect, Size};
pub use host::{ElementKey, LayoutHost, ListenerId, Trigger};
pub use persist::{KeyValueStore, PersistSpec, SignalStore, StorageError, StorageType};
pub use placement::{Align, Placement, Side};
pub use plugin::{
    run_plugin, AnchorPlugin, AttributePlugin, Cleanup, EffectScope, KeyRequirement,
    PersistPlugin, PluginContext, PluginRegistry,
};
pub use positioner::{attach, Attachment, FallbackHandle, LayoutSnapshot, Mode};
pub use registry::{AttachmentRegistry, Generation};
pub use resolve::{parse_spec, parse_spec_with, AnchorAttributes, PlacementSpec};
pub use timing::{Debounce, Scheduler, Throttle, TimerId};
pub use units::{to_pixels, Length, Unit, UnitContext};
