//! Placement keywords: which side of the reference element a floating
//! element sits on, and how it aligns along that side.

use crate::error::PlacementParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of the reference element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Above
    Top,
    /// Below
    Bottom,
    /// To the left
    Left,
    /// To the right
    Right,
}

impl Side {
    /// Side across the reference element.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Top and bottom stack vertically; left and right horizontally.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    /// Mirror across the top-left/bottom-right diagonal.
    #[must_use]
    pub const fn transpose(self) -> Self {
        match self {
            Self::Top => Self::Left,
            Self::Left => Self::Top,
            Self::Bottom => Self::Right,
            Self::Right => Self::Bottom,
        }
    }
}

/// Alignment along the side.
///
/// `Start` is the left edge for top/bottom placements and the top edge for
/// left/right placements; `End` is the opposite edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Align {
    /// Centered on the cross axis
    Center,
    /// Leading edge
    Start,
    /// Trailing edge
    End,
}

impl Align {
    /// Start and end swap, center stays.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Center => Self::Center,
            Self::Start => Self::End,
            Self::End => Self::Start,
        }
    }
}

/// One of the twelve placements a floating element can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    /// Above, centered
    Top,
    /// Above, left edges aligned
    TopStart,
    /// Above, right edges aligned
    TopEnd,
    /// Below, centered
    #[default]
    Bottom,
    /// Below, left edges aligned
    BottomStart,
    /// Below, right edges aligned
    BottomEnd,
    /// Left, centered
    Left,
    /// Left, top edges aligned
    LeftStart,
    /// Left, bottom edges aligned
    LeftEnd,
    /// Right, centered
    Right,
    /// Right, top edges aligned
    RightStart,
    /// Right, bottom edges aligned
    RightEnd,
}

impl Placement {
    /// Every placement, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Top,
        Self::TopStart,
        Self::TopEnd,
        Self::Bottom,
        Self::BottomStart,
        Self::BottomEnd,
        Self::Left,
        Self::LeftStart,
        Self::LeftEnd,
        Self::Right,
        Self::RightStart,
        Self::RightEnd,
    ];

    /// Build a placement from its side and alignment.
    #[must_use]
    pub const fn from_parts(side: Side, align: Align) -> Self {
        match (side, align) {
            (Side::Top, Align::Center) => Self::Top,
            (Side::Top, Align::Start) => Self::TopStart,
            (Side::Top, Align::End) => Self::TopEnd,
            (Side::Bottom, Align::Center) => Self::Bottom,
            (Side::Bottom, Align::Start) => Self::BottomStart,
            (Side::Bottom, Align::End) => Self::BottomEnd,
            (Side::Left, Align::Center) => Self::Left,
            (Side::Left, Align::Start) => Self::LeftStart,
            (Side::Left, Align::End) => Self::LeftEnd,
            (Side::Right, Align::Center) => Self::Right,
            (Side::Right, Align::Start) => Self::RightStart,
            (Side::Right, Align::End) => Self::RightEnd,
        }
    }

    /// Side of the reference element.
    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Self::Top | Self::TopStart | Self::TopEnd => Side::Top,
            Self::Bottom | Self::BottomStart | Self::BottomEnd => Side::Bottom,
            Self::Left | Self::LeftStart | Self::LeftEnd => Side::Left,
            Self::Right | Self::RightStart | Self::RightEnd => Side::Right,
        }
    }

    /// Alignment along the side.
    #[must_use]
    pub const fn align(self) -> Align {
        match self {
            Self::Top | Self::Bottom | Self::Left | Self::Right => Align::Center,
            Self::TopStart | Self::BottomStart | Self::LeftStart | Self::RightStart => Align::Start,
            Self::TopEnd | Self::BottomEnd | Self::LeftEnd | Self::RightEnd => Align::End,
        }
    }

    /// Keyword as written in attributes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::TopStart => "top-start",
            Self::TopEnd => "top-end",
            Self::Bottom => "bottom",
            Self::BottomStart => "bottom-start",
            Self::BottomEnd => "bottom-end",
            Self::Left => "left",
            Self::LeftStart => "left-start",
            Self::LeftEnd => "left-end",
            Self::Right => "right",
            Self::RightStart => "right-start",
            Self::RightEnd => "right-end",
        }
    }

    /// Candidates tried, in order, when this placement overflows the viewport.
    ///
    /// Centered placements try the opposite side and then the two sides of
    /// the other axis. Aligned placements stay on their axis: opposite side
    /// with the same alignment, then the same side with the other alignment,
    /// then the opposite side with the other alignment.
    #[must_use]
    pub const fn fallbacks(self) -> [Self; 3] {
        let side = self.side();
        match self.align() {
            Align::Center => {
                let (a, b) = if side.is_vertical() {
                    (Self::Left, Self::Right)
                } else {
                    (Self::Top, Self::Bottom)
                };
                [Self::from_parts(side.opposite(), Align::Center), a, b]
            }
            align => [
                Self::from_parts(side.opposite(), align),
                Self::from_parts(side, align.opposite()),
                Self::from_parts(side.opposite(), align.opposite()),
            ],
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Placement {
    type Err = PlacementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| PlacementParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_default_is_bottom() {
        assert_eq!(Placement::default(), Placement::Bottom);
    }

    #[test]
    fn test_placement_parse_all() {
        for p in Placement::ALL {
            assert_eq!(p.as_str().parse::<Placement>(), Ok(p));
        }
    }

    #[test]
    fn test_placement_parse_tolerates_case_and_space() {
        assert_eq!(" Top-End ".parse::<Placement>(), Ok(Placement::TopEnd));
    }

    #[test]
    fn test_placement_parse_unknown() {
        assert_eq!(
            "middle".parse::<Placement>(),
            Err(PlacementParseError("middle".to_string()))
        );
    }

    #[test]
    fn test_parts_round_trip() {
        for p in Placement::ALL {
            assert_eq!(Placement::from_parts(p.side(), p.align()), p);
        }
    }

    #[test]
    fn test_fallbacks_centered() {
        assert_eq!(
            Placement::Top.fallbacks(),
            [Placement::Bottom, Placement::Left, Placement::Right]
        );
        assert_eq!(
            Placement::Left.fallbacks(),
            [Placement::Right, Placement::Top, Placement::Bottom]
        );
    }

    #[test]
    fn test_fallbacks_aligned() {
        assert_eq!(
            Placement::TopStart.fallbacks(),
            [Placement::BottomStart, Placement::TopEnd, Placement::BottomEnd]
        );
        assert_eq!(
            Placement::RightEnd.fallbacks(),
            [Placement::LeftEnd, Placement::RightStart, Placement::LeftStart]
        );
    }

    #[test]
    fn test_fallbacks_never_contain_self() {
        for p in Placement::ALL {
            assert!(!p.fallbacks().contains(&p), "{p} lists itself");
        }
    }

    #[test]
    fn test_side_transpose_involution() {
        for side in [Side::Top, Side::Bottom, Side::Left, Side::Right] {
            assert_eq!(side.transpose().transpose(), side);
            assert_ne!(side.transpose().is_vertical(), side.is_vertical());
        }
    }

    #[test]
    fn test_placement_serde_kebab() {
        let json = serde_json::to_string(&Placement::BottomStart).unwrap();
        assert_eq!(json, "\"bottom-start\"");
        let back: Placement = serde_json::from_str("\"left-end\"").unwrap();
        assert_eq!(back, Placement::LeftEnd);
    }
}
