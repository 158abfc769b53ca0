//! Hierarchical node coloring.
//!
//! Each node picks a base color from the palette by its sibling index and
//! blends it with its parent's color, so subtrees drift toward a shared hue
//! the deeper they go.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Weight of the parent color when blending a child's color.
pub const PARENT_COLOR_WEIGHT: f64 = 0.7;

/// Used when a palette is empty.
pub const FALLBACK_COLOR: Rgb = Rgb::new(209, 209, 209);

/// An opaque RGB color, written as CSS `rgb(r, g, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Blend `self` (weighted by `weight`) with `other` (weighted by `1 - weight`).
    pub fn mix(self, weight: f64, other: Rgb) -> Rgb {
        let channel = |a: u8, b: u8| -> u8 {
            let v = (a as f64 * weight + b as f64 * (1.0 - weight)).round();
            v.clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}, expected rgb(r, g, b)")]
pub struct ParseColorError(String);

impl FromStr for Rgb {
    type Err = ParseColorError;

    /// Reads the first three integer runs, so `rgb(1,2,3)`, `rgba(1, 2, 3, 0.5)`
    /// and `1 2 3` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut channels = s
            .split(|c: char| !c.is_ascii_digit())
            .filter(|run| !run.is_empty())
            .map(|run| run.parse::<u8>());

        let mut next = || match channels.next() {
            Some(Ok(v)) => Ok(v),
            _ => Err(ParseColorError(s.to_string())),
        };
        Ok(Rgb::new(next()?, next()?, next()?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

/// Color for the `sibling_index`-th child of a node colored `parent`.
///
/// Without a parent color the palette entry is returned unchanged.
pub fn node_color(palette: &[Rgb], sibling_index: usize, parent: Option<Rgb>) -> Rgb {
    let base = if palette.is_empty() {
        FALLBACK_COLOR
    } else {
        palette[sibling_index % palette.len()]
    };

    match parent {
        None => base,
        Some(parent) => parent.mix(PARENT_COLOR_WEIGHT, base),
    }
}
