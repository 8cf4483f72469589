//! Placement engine: where a floating element goes for a given placement,
//! and which placement to use when the requested one overflows the viewport.
//!
//! Everything here is pure. Inputs are rectangles in viewport coordinates;
//! scroll adjustment happens in the positioner that writes the result.

use crate::geometry::{Point, Rect, Size};
use crate::placement::{Align, Placement, Side};
use serde::{Deserialize, Serialize};

/// Result of a positioning pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalPosition {
    /// Left edge of the floating element, viewport coordinates
    pub x: f64,
    /// Top edge of the floating element, viewport coordinates
    pub y: f64,
    /// Placement actually used; differs from the request after a flip
    pub placement_used: Placement,
}

impl FinalPosition {
    /// Top-left corner as a point.
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether the engine substituted a fallback placement.
    #[must_use]
    pub fn flipped(&self, requested: Placement) -> bool {
        self.placement_used != requested
    }
}

/// Knobs for [`compute_position`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Minimum distance kept from each viewport edge when testing fit
    pub padding: f64,
    /// Try fallback placements when the requested one overflows
    pub flip: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            padding: 8.0,
            flip: true,
        }
    }
}

/// Top-left corner of a floating element of `floating` size placed at
/// `placement` around `reference`, `offset` pixels away from it.
#[must_use]
pub fn place(reference: &Rect, floating: Size, placement: Placement, offset: f64) -> Point {
    let r = reference;
    let (w, h) = (floating.width, floating.height);

    let cross_x = |align: Align| match align {
        Align::Center => r.left() + (r.width - w) / 2.0,
        Align::Start => r.left(),
        Align::End => r.right() - w,
    };
    let cross_y = |align: Align| match align {
        Align::Center => r.top() + (r.height - h) / 2.0,
        Align::Start => r.top(),
        Align::End => r.bottom() - h,
    };

    match placement.side() {
        Side::Top => Point::new(cross_x(placement.align()), r.top() - h - offset),
        Side::Bottom => Point::new(cross_x(placement.align()), r.bottom() + offset),
        Side::Left => Point::new(r.left() - w - offset, cross_y(placement.align())),
        Side::Right => Point::new(r.right() + offset, cross_y(placement.align())),
    }
}

/// Whether a floating element at `origin` stays inside the viewport minus
/// `padding` on both axes.
#[must_use]
pub fn fits(origin: Point, floating: Size, viewport: Size, padding: f64) -> bool {
    origin.x >= padding
        && origin.y >= padding
        && origin.x + floating.width <= viewport.width - padding
        && origin.y + floating.height <= viewport.height - padding
}

/// Compute the final position of a floating element.
///
/// The requested placement is used when it fits. Otherwise its
/// [`Placement::fallbacks`] are tried in order and the first that fits wins.
/// When nothing fits the requested placement is kept, overflow included.
#[must_use]
pub fn compute_position(
    reference: &Rect,
    floating: Size,
    placement: Placement,
    offset: f64,
    viewport: Size,
    options: &EngineOptions,
) -> FinalPosition {
    let primary = place(reference, floating, placement, offset);
    let at = |origin: Point, used: Placement| FinalPosition {
        x: origin.x,
        y: origin.y,
        placement_used: used,
    };

    if !options.flip || fits(primary, floating, viewport, options.padding) {
        return at(primary, placement);
    }

    for candidate in placement.fallbacks() {
        let origin = place(reference, floating, candidate, offset);
        if fits(origin, floating, viewport, options.padding) {
            log::debug!("placement {placement} overflows, flipped to {candidate}");
            return at(origin, candidate);
        }
    }

    log::trace!("placement {placement} overflows and no fallback fits");
    at(primary, placement)
}
