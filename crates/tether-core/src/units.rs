//! CSS length literals and their conversion to pixels.

use crate::error::LengthParseError;
use crate::geometry::Size;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length unit accepted in offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Unit {
    /// CSS pixels
    #[default]
    Px,
    /// Multiples of the root font size
    Rem,
    /// Multiples of the floating element's font size
    Em,
    /// Percentage, kept as a raw number
    Percent,
    /// Percent of the viewport width
    Vw,
    /// Percent of the viewport height
    Vh,
}

impl Unit {
    /// Suffix as written in CSS.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Rem => "rem",
            Self::Em => "em",
            Self::Percent => "%",
            Self::Vw => "vw",
            Self::Vh => "vh",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "" | "px" => Some(Self::Px),
            "rem" => Some(Self::Rem),
            "em" => Some(Self::Em),
            "%" => Some(Self::Percent),
            "vw" => Some(Self::Vw),
            "vh" => Some(Self::Vh),
            _ => None,
        }
    }
}

/// Font metrics and viewport needed to resolve relative units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitContext {
    /// Computed font size of the root element, in pixels
    pub root_font_size: f64,
    /// Computed font size of the floating element, in pixels
    pub font_size: f64,
    /// Viewport size
    pub viewport: Size,
}

impl Default for UnitContext {
    fn default() -> Self {
        Self {
            root_font_size: 16.0,
            font_size: 16.0,
            viewport: Size::ZERO,
        }
    }
}

/// A number with a unit, e.g. `8px` or `0.5rem`.
///
/// Serializes as its CSS literal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Length {
    /// Magnitude
    pub value: f64,
    /// Unit
    pub unit: Unit,
}

impl Length {
    /// Offset used when none is given or the given one is malformed.
    pub const DEFAULT_OFFSET: Self = Self::px(8.0);

    /// Create a length.
    #[must_use]
    pub const fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Create a pixel length.
    #[must_use]
    pub const fn px(value: f64) -> Self {
        Self::new(value, Unit::Px)
    }

    /// Parse a literal such as `12`, `12px`, `1.5rem`, `-2em`, `50%`.
    ///
    /// A bare number is taken as pixels.
    pub fn parse(input: &str) -> Result<Self, LengthParseError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(LengthParseError::Empty);
        }
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
            .unwrap_or(s.len());
        // `1em` would otherwise swallow the `e` into the number
        let split = if s[..split].ends_with(['e', 'E']) && s[split..].starts_with(['m', 'M']) {
            split - 1
        } else {
            split
        };
        let (number, suffix) = s.split_at(split);
        let value: f64 = number
            .parse()
            .map_err(|_| LengthParseError::InvalidNumber(s.to_string()))?;
        if !value.is_finite() {
            return Err(LengthParseError::NotFinite(s.to_string()));
        }
        let unit = Unit::from_suffix(suffix.trim())
            .ok_or_else(|| LengthParseError::UnknownUnit(suffix.trim().to_string()))?;
        Ok(Self::new(value, unit))
    }

    /// Parse, falling back to `default` on malformed input.
    #[must_use]
    pub fn parse_or(input: &str, default: Self) -> Self {
        Self::parse(input).unwrap_or_else(|err| {
            log::debug!("offset `{input}` ignored: {err}");
            default
        })
    }

    /// Resolve to CSS pixels.
    #[must_use]
    pub fn to_pixels(&self, ctx: &UnitContext) -> f64 {
        match self.unit {
            Unit::Px | Unit::Percent => self.value,
            Unit::Rem => self.value * ctx.root_font_size,
            Unit::Em => self.value * ctx.font_size,
            Unit::Vw => self.value * ctx.viewport.width / 100.0,
            Unit::Vh => self.value * ctx.viewport.height / 100.0,
        }
    }
}

impl Default for Length {
    fn default() -> Self {
        Self::DEFAULT_OFFSET
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for Length {
    type Err = LengthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Length {
    type Error = LengthParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Length> for String {
    fn from(length: Length) -> Self {
        length.to_string()
    }
}

/// Convenience wrapper over [`Length::to_pixels`].
#[must_use]
pub fn to_pixels(value: f64, unit: Unit, ctx: &UnitContext) -> f64 {
    Length::new(value, unit).to_pixels(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx() -> UnitContext {
        UnitContext {
            root_font_size: 16.0,
            font_size: 20.0,
            viewport: Size::new(1000.0, 800.0),
        }
    }

    #[test]
    fn test_parse_bare_number_is_px() {
        assert_eq!(Length::parse("12"), Ok(Length::px(12.0)));
        assert_eq!(Length::parse(" 4.5 "), Ok(Length::px(4.5)));
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(Length::parse("10px"), Ok(Length::px(10.0)));
        assert_eq!(Length::parse("1.5rem"), Ok(Length::new(1.5, Unit::Rem)));
        assert_eq!(Length::parse("2em"), Ok(Length::new(2.0, Unit::Em)));
        assert_eq!(Length::parse("1em"), Ok(Length::new(1.0, Unit::Em)));
        assert_eq!(Length::parse("50%"), Ok(Length::new(50.0, Unit::Percent)));
        assert_eq!(Length::parse("25vw"), Ok(Length::new(25.0, Unit::Vw)));
        assert_eq!(Length::parse("-3VH"), Ok(Length::new(-3.0, Unit::Vh)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Length::parse(""), Err(LengthParseError::Empty));
        assert_eq!(
            Length::parse("px"),
            Err(LengthParseError::InvalidNumber("px".to_string()))
        );
        assert_eq!(
            Length::parse("10pt"),
            Err(LengthParseError::UnknownUnit("pt".to_string()))
        );
        assert_eq!(
            Length::parse("1e400px"),
            Err(LengthParseError::NotFinite("1e400px".to_string()))
        );
    }

    #[test]
    fn test_parse_or_defaults() {
        assert_eq!(Length::parse_or("bogus", Length::DEFAULT_OFFSET), Length::px(8.0));
        assert_eq!(Length::parse_or("3rem", Length::DEFAULT_OFFSET), Length::new(3.0, Unit::Rem));
    }

    #[test]
    fn test_to_pixels() {
        let c = ctx();
        assert_eq!(to_pixels(7.0, Unit::Px, &c), 7.0);
        assert_eq!(to_pixels(1.0, Unit::Rem, &c), 16.0);
        assert_eq!(to_pixels(1.0, Unit::Em, &c), 20.0);
        assert_eq!(to_pixels(50.0, Unit::Vw, &c), 500.0);
        assert_eq!(to_pixels(10.0, Unit::Vh, &c), 80.0);
    }

    #[test]
    fn test_percent_is_raw_number() {
        assert_eq!(to_pixels(50.0, Unit::Percent, &ctx()), 50.0);
    }

    #[test]
    fn test_serde_as_literal() {
        let json = serde_json::to_string(&Length::new(2.0, Unit::Em)).unwrap();
        assert_eq!(json, "\"2em\"");
        let back: Length = serde_json::from_str("\"12vh\"").unwrap();
        assert_eq!(back, Length::new(12.0, Unit::Vh));
        assert!(serde_json::from_str::<Length>("\"12pt\"").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Length::new(1.5, Unit::Rem).to_string(), "1.5rem");
        assert_eq!(Length::px(8.0).to_string(), "8px");
        assert_eq!(Length::new(50.0, Unit::Percent).to_string(), "50%");
    }

    proptest! {
        #[test]
        fn prop_display_parses_back(value in -1000.0f64..1000.0, idx in 0usize..6) {
            let unit = [Unit::Px, Unit::Rem, Unit::Em, Unit::Percent, Unit::Vw, Unit::Vh][idx];
            let len = Length::new(value, unit);
            prop_assert_eq!(Length::parse(&len.to_string()), Ok(len));
        }

        #[test]
        fn prop_px_is_identity(value in -1000.0f64..1000.0) {
            prop_assert_eq!(to_pixels(value, Unit::Px, &ctx()), value);
        }
    }
}
