//! Native CSS anchor positioning declarations.
//!
//! The builder here is pure; [`crate::positioner`] writes its output onto
//! elements. Fallbacks are expressed as `position-try-fallbacks` tactics
//! derived from [`Placement::fallbacks`], so the browser tries the same
//! candidates in the same order as [`crate::engine::compute_position`].

use crate::placement::{Align, Placement, Side};
use crate::units::{Length, Unit};

/// One `property: value` pair.
pub type Declaration = (&'static str, String);

/// Properties written to the floating element by [`native_declarations`].
pub const FLOATING_PROPERTIES: [&str; 10] = [
    "position",
    "position-anchor",
    "top",
    "bottom",
    "left",
    "right",
    "justify-self",
    "align-self",
    "margin",
    "position-try-fallbacks",
];

/// Property written to the reference element.
pub const ANCHOR_NAME_PROPERTY: &str = "anchor-name";

/// Make an element id usable inside a dashed ident.
///
/// ASCII alphanumerics, `-`, `_` and non-ASCII characters are kept. Other
/// characters are CSS-escaped, so distinct ids give distinct idents.
#[must_use]
pub fn sanitize_ident(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            out.push(c);
        } else if c.is_ascii_graphic() {
            out.push('\\');
            out.push(c);
        } else {
            // Whitespace and control characters only survive as hex escapes
            out.push_str(&format!("\\{:x} ", u32::from(c)));
        }
    }
    out
}

/// Anchor name for the element with DOM id `element_id`.
#[must_use]
pub fn anchor_name(prefix: &str, element_id: &str) -> String {
    format!("{prefix}{}", sanitize_ident(element_id))
}

/// CSS literal for an offset inside `calc()`.
///
/// Percentages are written as pixels so both positioners agree: the
/// geometry fallback treats `%` as a raw number too.
fn offset_literal(offset: Length) -> String {
    match offset.unit {
        Unit::Percent => Length::px(offset.value).to_string(),
        _ => offset.to_string(),
    }
}

/// Try-tactic keywords turning `from` into `to`, or `None` when the change
/// cannot be expressed by flips (centered <-> edge-aligned).
#[must_use]
pub fn try_tactic(from: Placement, to: Placement) -> Option<String> {
    if from == to || (from.align() == Align::Center) != (to.align() == Align::Center) {
        return None;
    }
    let mut tactics = Vec::with_capacity(3);
    let mut side = from.side();
    let mut align = from.align();

    if side.is_vertical() != to.side().is_vertical() {
        tactics.push("flip-start");
        side = side.transpose();
    }
    if side != to.side() {
        tactics.push(if side.is_vertical() { "flip-block" } else { "flip-inline" });
        side = side.opposite();
    }
    if align != to.align() {
        tactics.push(if side.is_vertical() { "flip-inline" } else { "flip-block" });
        align = align.opposite();
    }
    debug_assert_eq!(Placement::from_parts(side, align), to);
    Some(tactics.join(" "))
}

/// `position-try-fallbacks` value mirroring the engine's fallback order.
#[must_use]
pub fn try_fallbacks(placement: Placement) -> String {
    placement
        .fallbacks()
        .into_iter()
        .filter_map(|candidate| try_tactic(placement, candidate))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Declarations positioning a floating element against anchor `anchor`.
#[must_use]
pub fn native_declarations(
    placement: Placement,
    offset: Length,
    anchor: &str,
    flip: bool,
) -> Vec<Declaration> {
    let gap = offset_literal(offset);
    let mut decls: Vec<Declaration> = vec![
        ("position", "absolute".to_string()),
        ("position-anchor", anchor.to_string()),
        ("margin", "0".to_string()),
    ];

    let main = match placement.side() {
        Side::Top => ("bottom", "top"),
        Side::Bottom => ("top", "bottom"),
        Side::Left => ("right", "left"),
        Side::Right => ("left", "right"),
    };
    decls.push((main.0, format!("calc(anchor({}) + {gap})", main.1)));

    let vertical = placement.side().is_vertical();
    let cross: Declaration = match (vertical, placement.align()) {
        (true, Align::Center) => ("justify-self", "anchor-center".to_string()),
        (true, Align::Start) => ("left", "anchor(left)".to_string()),
        (true, Align::End) => ("right", "anchor(right)".to_string()),
        (false, Align::Center) => ("align-self", "anchor-center".to_string()),
        (false, Align::Start) => ("top", "anchor(top)".to_string()),
        (false, Align::End) => ("bottom", "anchor(bottom)".to_string()),
    };
    decls.push(cross);

    if flip {
        decls.push(("position-try-fallbacks", try_fallbacks(placement)));
    }
    decls
}
