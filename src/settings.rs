//! Layout settings for both view modes.
//!
//! Every struct is `#[serde(default)]`, so a partial per-tree settings object
//! only overrides the fields it names.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::Result;

/// Settings for both layout modes of one tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeSettings {
    /// Horizontal, title-only mode.
    pub titles_mode: HorizontalSettings,
    /// Vertical, box-node mode.
    pub default_mode: VerticalSettings,
}

impl TreeSettings {
    /// Parse a (possibly partial) settings document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Configuration for the vertical (box) layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerticalSettings {
    /// Fixed node width. When unset, the width is derived from the tree's
    /// average branching factor.
    pub node_width: Option<f64>,
    /// Lower bound for a derived node width.
    pub min_node_width: f64,
    /// Width per unit of (average branching factor + 2).
    pub node_width_branching_factor_multiplier: f64,
    pub node_height: f64,
    /// Gap between consecutive levels.
    pub vertical_spacing: f64,
    /// Gap between adjacent leaves that share a parent.
    pub sibling_node_spacing: f64,
    /// Gap before the first leaf of a new sibling group.
    pub node_group_spacing: f64,
}

impl Default for VerticalSettings {
    fn default() -> Self {
        Self {
            node_width: None,
            min_node_width: 2000.0,
            node_width_branching_factor_multiplier: 400.0,
            node_height: 1400.0,
            vertical_spacing: 130.0,
            sibling_node_spacing: 500.0,
            node_group_spacing: 600.0,
        }
    }
}

/// Average glyph metrics for titles rendered at one depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharSize {
    pub text_size: f64,
    pub char_w: f64,
}

impl CharSize {
    pub const fn new(text_size: f64, char_w: f64) -> Self {
        Self { text_size, char_w }
    }
}

/// Configuration for the horizontal (titles) layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HorizontalSettings {
    /// Column advance per depth level.
    pub horizontal_spacing: f64,
    pub sibling_node_spacing: f64,
    pub node_group_spacing: f64,
    /// Glyph metrics per depth; deeper levels use `default_title_char_size`.
    pub avg_text_char_sizes: Vec<CharSize>,
    pub default_title_char_size: CharSize,
    /// Extra column offset contributed by each depth, summed cumulatively.
    pub horizontal_spacing_additions: Vec<f64>,
    /// Right-hand canvas padding reserved for the last column's titles.
    pub width_addition: f64,
    pub base_colors: Vec<Rgb>,
    /// Deepest depth that keeps its breakdown. Unset means unlimited.
    pub depth_limit: Option<usize>,
}

impl HorizontalSettings {
    /// Glyph metrics used at `depth`.
    pub fn char_size(&self, depth: usize) -> CharSize {
        self.avg_text_char_sizes
            .get(depth)
            .copied()
            .unwrap_or(self.default_title_char_size)
    }

    /// Sum of the per-depth additions for every depth above `depth`.
    pub fn spacing_addition(&self, depth: usize) -> f64 {
        self.horizontal_spacing_additions.iter().take(depth).sum()
    }
}

impl Default for HorizontalSettings {
    fn default() -> Self {
        Self {
            horizontal_spacing: 600.0,
            sibling_node_spacing: 40.0,
            node_group_spacing: 70.0,
            avg_text_char_sizes: vec![
                CharSize::new(70.0, 34.0),
                CharSize::new(50.0, 26.0),
                CharSize::new(30.0, 14.7),
                CharSize::new(22.0, 10.7),
                CharSize::new(18.0, 8.8),
            ],
            default_title_char_size: CharSize::new(15.0, 7.287),
            horizontal_spacing_additions: vec![350.0, 70.0, 70.0],
            width_addition: 80.0,
            base_colors: vec![
                Rgb::new(102, 153, 204), // muted blue
                Rgb::new(179, 153, 204), // muted purple
                Rgb::new(204, 153, 153), // muted red
                Rgb::new(153, 204, 153), // muted green
                Rgb::new(204, 179, 153), // muted gold
                Rgb::new(153, 204, 204), // muted teal
            ],
            depth_limit: None,
        }
    }
}
