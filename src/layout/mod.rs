//! Layout algorithms for research-map trees.
//!
//! Both modes walk the tree into an arena of layout entries, position the
//! end nodes with a running cursor, then derive interior positions from
//! their children. Output is a flat list of positioned nodes in traversal
//! order plus the canvas extents.

pub mod horizontal;
pub mod vertical;

pub use horizontal::{HorizontalLayout, HorizontalResult, LinkTarget, PosLink, TitlePosNode};
pub use vertical::{PositionedNode, VerticalLayout, VerticalResult};

/// Running maximum of node extents, used for canvas sizing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    /// Grow to include a point (the far corner of a node).
    #[inline]
    pub fn include(&mut self, x: f64, y: f64) {
        self.width = self.width.max(x);
        self.height = self.height.max(y);
    }
}

/// Advance a leaf cursor.
///
/// The first leaf seen sets no gap. After that a leaf that starts a new
/// sibling group advances by `group_gap`, any other leaf by `sibling_gap`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LeafCursor {
    position: f64,
    started: bool,
}

impl LeafCursor {
    pub fn advance(&mut self, starts_group: bool, group_gap: f64, sibling_gap: f64) -> f64 {
        if self.started {
            self.position += if starts_group { group_gap } else { sibling_gap };
        } else {
            self.started = true;
        }
        self.position
    }
}
