//! Vertical ("default mode") box layout.
//!
//! Nodes are uniform boxes growing top-down, with leaves laid out left to
//! right and every parent centered over its children.
//!
//! # Algorithm Overview
//!
//! 1. **End-node pass (top-down):** Depth-first walk that gives every visible
//!    node its `top` (`depth * (node_height + vertical_spacing)`) and gives each
//!    end node its `left` from a running cursor. An end node has no breakdown
//!    or only collapsed sub-nodes; collapsed nodes are not visited at all.
//! 2. **Interior passes (bottom-up, to a fixed point):** Every interior node
//!    whose children all have a `left` is centered over their combined
//!    footprint. Nodes with unresolved children are retried on the next pass.
//!    Passes repeat until the root is placed, which takes at most the tree
//!    height.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::Serialize;

use super::{Extent, LeafCursor};
use crate::settings::VerticalSettings;
use crate::tree::{Node, NodeInfo, average_branching_factor};

/// A node placed by the vertical layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub node: NodeInfo,
    pub depth: usize,
    pub top: f64,
    pub left: f64,
    /// Index of the parent in `positioned_nodes` (None for the root).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    /// Indices of the visible children in `positioned_nodes`, in reading
    /// order. Absent on end nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<usize>>,
}

/// Result of the vertical layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerticalResult {
    /// Positioned nodes in post-order (children before their parent).
    pub positioned_nodes: Vec<PositionedNode>,
    pub total_height: f64,
    pub total_width: f64,
    pub node_width: f64,
    pub node_height: f64,
}

impl VerticalResult {
    /// Index of the root in `positioned_nodes`.
    pub fn root_index(&self) -> Option<usize> {
        self.positioned_nodes.len().checked_sub(1)
    }

    pub fn find(&self, id: &str) -> Option<&PositionedNode> {
        self.positioned_nodes.iter().find(|p| p.node.id == id)
    }
}

/// Arena entry used while the layout is in progress.
#[derive(Debug)]
struct LayoutNode<'t> {
    node: &'t Node,
    depth: usize,
    top: f64,
    left: Option<f64>,
    parent: Option<usize>,
    /// Visible children, empty for end nodes.
    children: Vec<usize>,
}

/// State threaded through the end-node pass.
struct Traversal<'t, 'c> {
    collapsed: &'c HashSet<String>,
    cursor: LeafCursor,
    nodes: Vec<LayoutNode<'t>>,
}

/// The vertical layout engine.
pub struct VerticalLayout {
    settings: VerticalSettings,
}

impl VerticalLayout {
    pub fn new(settings: VerticalSettings) -> Self {
        Self { settings }
    }

    pub fn with_defaults() -> Self {
        Self::new(VerticalSettings::default())
    }

    pub fn settings(&self) -> &VerticalSettings {
        &self.settings
    }

    /// Box width for `tree`: the configured width, or one derived from the
    /// average branching factor so wider trees get wider boxes.
    pub fn node_width(&self, tree: &Node) -> f64 {
        self.settings.node_width.unwrap_or_else(|| {
            let factor = average_branching_factor(tree) + 2.0;
            (factor * self.settings.node_width_branching_factor_multiplier)
                .max(self.settings.min_node_width)
        })
    }

    /// Lay out `tree`, hiding the subtrees of every id in `collapsed`.
    ///
    /// The root is never treated as collapsed. `collapsed` itself is not
    /// modified.
    pub fn compute(&self, tree: &Node, collapsed: &HashSet<String>) -> VerticalResult {
        let collapsed = without_root(collapsed, &tree.id);
        let node_width = self.node_width(tree);
        let node_height = self.settings.node_height;

        let mut traversal = Traversal {
            collapsed: &collapsed,
            cursor: LeafCursor::default(),
            nodes: Vec::new(),
        };
        let root = self.position_end_nodes(&mut traversal, tree, 0, true, node_width);
        let mut nodes = traversal.nodes;

        // Each pass resolves at least the deepest unresolved level.
        let mut passes = 0;
        while nodes[root].left.is_none() && passes <= nodes.len() {
            self.position_bulk_of_tree(root, &mut nodes, node_width);
            passes += 1;
        }

        let mut extent = Extent::default();
        for n in &nodes {
            extent.include(n.left.unwrap_or(0.0) + node_width, n.top + node_height);
        }

        tracing::debug!(
            nodes = nodes.len(),
            collapsed = collapsed.len(),
            passes,
            node_width,
            "vertical layout"
        );

        let positioned_nodes = nodes
            .into_iter()
            .map(|n| PositionedNode {
                node: n.node.info(),
                depth: n.depth,
                top: n.top,
                left: n.left.unwrap_or(0.0),
                parent: n.parent,
                children: (!n.children.is_empty()).then_some(n.children),
            })
            .collect();

        VerticalResult {
            positioned_nodes,
            total_height: extent.height,
            total_width: extent.width,
            node_width,
            node_height,
        }
    }

    /// End-node pass. Returns the arena index of `node`.
    ///
    /// `first_in_group` is true when `node` is the first visible child of its
    /// parent (or the root).
    fn position_end_nodes<'t>(
        &self,
        traversal: &mut Traversal<'t, '_>,
        node: &'t Node,
        depth: usize,
        first_in_group: bool,
        node_width: f64,
    ) -> usize {
        let top = depth as f64 * (self.settings.node_height + self.settings.vertical_spacing);
        let visible: Vec<&'t Node> = node.visible_sub_nodes(traversal.collapsed).collect();

        let mut children = Vec::with_capacity(visible.len());
        let mut left = None;
        if visible.is_empty() {
            left = Some(traversal.cursor.advance(
                first_in_group,
                node_width + self.settings.node_group_spacing,
                node_width + self.settings.sibling_node_spacing,
            ));
        } else {
            for (i, sub) in visible.into_iter().enumerate() {
                children.push(self.position_end_nodes(traversal, sub, depth + 1, i == 0, node_width));
            }
        }

        let index = traversal.nodes.len();
        for &child in &children {
            traversal.nodes[child].parent = Some(index);
        }
        traversal.nodes.push(LayoutNode {
            node,
            depth,
            top,
            left,
            parent: None,
            children,
        });
        index
    }

    /// One interior pass: center every node whose children are all placed,
    /// descend into the ones that are not.
    fn position_bulk_of_tree(&self, v: usize, nodes: &mut [LayoutNode<'_>], node_width: f64) {
        if nodes[v].children.is_empty() {
            return;
        }

        let lefts: Option<Vec<f64>> = nodes[v].children.iter().map(|&c| nodes[c].left).collect();
        match lefts {
            Some(lefts) => {
                if let (Some(&first), Some(&last)) = (lefts.first(), lefts.last()) {
                    nodes[v].left = Some(center_over(first, last, node_width));
                }
            }
            None => {
                // Clone children indices to avoid borrow conflict during recursion
                let children = nodes[v].children.clone();
                for child in children {
                    self.position_bulk_of_tree(child, nodes, node_width);
                }
            }
        }
    }
}

/// Left edge of a box centered over boxes spanning `first_left` to
/// `last_left + width`.
fn center_over(first_left: f64, last_left: f64, width: f64) -> f64 {
    let span = last_left + width - first_left;
    first_left + (span / 2.0 - width / 2.0)
}

/// `collapsed` with the root id removed, copied only when it is present.
fn without_root<'c>(collapsed: &'c HashSet<String>, root_id: &str) -> Cow<'c, HashSet<String>> {
    if collapsed.contains(root_id) {
        let mut owned = collapsed.clone();
        owned.remove(root_id);
        Cow::Owned(owned)
    } else {
        Cow::Borrowed(collapsed)
    }
}
