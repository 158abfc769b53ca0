//! Horizontal ("titles mode") layout.
//!
//! Titles are laid out left to right: each depth is a column, and nodes are
//! stacked top to bottom inside it. Column offsets grow with depth, title
//! widths come from per-depth glyph metrics, and deeper subtrees are pulled
//! toward their parent by a condensation pass.
//!
//! # Algorithm Overview
//!
//! 1. **Depth limit:** Nodes at `depth_limit` lose their breakdown.
//! 2. **Leaves first:** At every level, sub-nodes without a breakdown are
//!    visited before sub-nodes with one. This only affects spacing; the
//!    children lists are restored to reading order at the end.
//! 3. **End-node pass:** Depth-first walk assigning width, column offset and
//!    color to every node, and a `top` from a running cursor to every leaf.
//! 4. **Interior tops:** Each parent sits halfway between its first and last
//!    child.
//! 5. **Condensation:** Subtrees are pulled toward their parent's row.
//! 6. **Cross-links:** Each link resolves to a positioned node, or to the raw
//!    target when the depth limit hides it.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::Serialize;

use super::{Extent, LeafCursor};
use crate::color::{Rgb, node_color};
use crate::settings::HorizontalSettings;
use crate::tree::{Link, Node, NodeInfo};

/// Added to every title's measured width.
pub const TITLE_PADDING: f64 = 10.0;

/// Extra vertical clearance per unit of text size above the default size.
pub const TEXT_SIZE_SPACING_FACTOR: f64 = 1.4;

/// Fraction of its natural offset a subtree keeps after condensation.
pub const CONDENSE_FACTOR: f64 = 0.3;

/// A title placed by the horizontal layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitlePosNode {
    pub node: NodeInfo,
    pub depth: usize,
    pub width: f64,
    pub color: Rgb,
    pub left: f64,
    pub top: f64,
    /// Indices of the children in `positioned_nodes`, in reading order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pos_links: Vec<PosLink>,
}

/// A resolved cross-link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PosLink {
    pub id: String,
    pub reason: String,
    pub target: LinkTarget,
}

/// Where a cross-link points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LinkTarget {
    /// Index of the target in `positioned_nodes`.
    Positioned { index: usize },
    /// The target exists but is hidden by the depth limit.
    Hidden { node: NodeInfo },
}

/// Result of the horizontal layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizontalResult {
    /// Positioned titles in post-order of the leaves-first walk.
    pub positioned_nodes: Vec<TitlePosNode>,
    /// Largest `top` of any title.
    pub total_height: f64,
    /// Largest `left` of any title.
    pub total_width: f64,
    /// `total_width` plus the configured width addition.
    pub canvas_width: f64,
}

impl HorizontalResult {
    pub fn find(&self, id: &str) -> Option<&TitlePosNode> {
        self.positioned_nodes.iter().find(|p| p.node.id == id)
    }
}

#[derive(Debug)]
struct TitleEntry<'t> {
    node: &'t Node,
    depth: usize,
    /// Position among the parent's sub-nodes in reading order, used to
    /// restore that order after the leaves-first walk.
    sibling_index: usize,
    width: f64,
    color: Rgb,
    left: f64,
    top: Option<f64>,
    /// Children in visiting (leaves-first) order until the final re-sort.
    children: Vec<usize>,
}

/// The horizontal layout engine.
pub struct HorizontalLayout {
    settings: HorizontalSettings,
}

impl HorizontalLayout {
    pub fn new(settings: HorizontalSettings) -> Self {
        Self { settings }
    }

    pub fn with_defaults() -> Self {
        Self::new(HorizontalSettings::default())
    }

    pub fn settings(&self) -> &HorizontalSettings {
        &self.settings
    }

    pub fn compute(&self, tree: &Node) -> HorizontalResult {
        let limited = match self.settings.depth_limit {
            Some(depth) => Cow::Owned(tree.limited_to_depth(depth)),
            None => Cow::Borrowed(tree),
        };

        let mut cursor = LeafCursor::default();
        let mut nodes = Vec::new();
        let root = self.position_end_nodes(&mut cursor, &mut nodes, &limited, 0, 0, 0, None);
        set_non_end_tops(root, &mut nodes);
        self.condense_siblings(root, &mut nodes);

        let mut extent = Extent::default();
        for n in &nodes {
            extent.include(n.left, n.top.unwrap_or(0.0));
        }

        // Back to reading order for display.
        let sibling_indices: Vec<usize> = nodes.iter().map(|n| n.sibling_index).collect();
        for n in &mut nodes {
            n.children.sort_by_key(|&c| sibling_indices[c]);
        }

        let index_by_id: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.node.id.as_str(), i))
            .collect();

        let positioned_nodes: Vec<TitlePosNode> = nodes
            .iter()
            .map(|n| TitlePosNode {
                node: n.node.info(),
                depth: n.depth,
                width: n.width,
                color: n.color,
                left: n.left,
                top: n.top.unwrap_or(0.0),
                children: (!n.children.is_empty()).then(|| n.children.clone()),
                pos_links: n
                    .node
                    .links
                    .iter()
                    .filter_map(|link| resolve_link(link, &limited, tree, &index_by_id))
                    .collect(),
            })
            .collect();

        tracing::debug!(
            nodes = positioned_nodes.len(),
            depth_limit = ?self.settings.depth_limit,
            "horizontal layout"
        );

        HorizontalResult {
            positioned_nodes,
            total_height: extent.height,
            total_width: extent.width,
            canvas_width: extent.width + self.settings.width_addition,
        }
    }

    /// End-node pass. Returns the arena index of `node`.
    #[allow(clippy::too_many_arguments)]
    fn position_end_nodes<'t>(
        &self,
        cursor: &mut LeafCursor,
        nodes: &mut Vec<TitleEntry<'t>>,
        node: &'t Node,
        depth: usize,
        sibling_index: usize,
        visit_index: usize,
        parent_color: Option<Rgb>,
    ) -> usize {
        let s = &self.settings;
        let char_size = s.char_size(depth);
        // Palette slots follow the leaves-first visiting order.
        let color = node_color(&s.base_colors, visit_index, parent_color);
        // Widths count UTF-16 code units, as the renderer measures titles.
        let title_len = node.title.encode_utf16().count();
        let width = char_size.char_w * title_len as f64 + TITLE_PADDING;
        let left = depth as f64 * s.horizontal_spacing + s.spacing_addition(depth);

        let mut children = Vec::new();
        let mut top = None;
        if node.has_children() {
            let sub_nodes = node.sub_nodes();
            // The root's color is not blended into its children.
            let inherited = (depth > 0).then_some(color);
            for (position, index) in leaves_first(sub_nodes).into_iter().enumerate() {
                children.push(self.position_end_nodes(
                    cursor,
                    nodes,
                    &sub_nodes[index],
                    depth + 1,
                    index,
                    position,
                    inherited,
                ));
            }
        } else {
            let text_clearance = (char_size.text_size - s.default_title_char_size.text_size)
                * TEXT_SIZE_SPACING_FACTOR;
            top = Some(cursor.advance(
                visit_index == 0,
                s.node_group_spacing,
                s.sibling_node_spacing + text_clearance,
            ));
        }

        nodes.push(TitleEntry {
            node,
            depth,
            sibling_index,
            width,
            color,
            left,
            top,
            children,
        });
        nodes.len() - 1
    }

    /// Pull subtrees toward their parent's row.
    ///
    /// If the first child that has children already sits below the parent,
    /// the level is left as is and only its children are condensed.
    /// Otherwise each child with children keeps `CONDENSE_FACTOR` of its
    /// offset from the parent, never closer than `node_group_spacing` to the
    /// previous such child. Leaf siblings are then shifted to keep the gap
    /// set by the first moved child.
    fn condense_siblings(&self, v: usize, nodes: &mut [TitleEntry<'_>]) {
        if nodes[v].children.is_empty() {
            return;
        }
        let s = &self.settings;
        // Clone children indices to avoid borrow conflict during recursion
        let children = nodes[v].children.clone();
        let parent_top = top_of(nodes, v);

        let mut first_gap: Option<f64> = None;
        let mut already_below = false;
        if let Some(i) = children.iter().position(|&c| !nodes[c].children.is_empty()) {
            let c = children[i];
            if top_of(nodes, c) > parent_top {
                for &sub in &children {
                    self.condense_siblings(sub, nodes);
                }
                already_below = true;
                if i > 0 {
                    first_gap = Some(top_of(nodes, c) - top_of(nodes, children[i - 1]));
                }
            }
        }

        if !already_below {
            let mut prev_with_children: Option<f64> = None;
            for (i, &c) in children.iter().enumerate() {
                self.condense_siblings(c, nodes);
                if nodes[c].children.is_empty() {
                    continue;
                }

                let mut top = parent_top + (top_of(nodes, c) - parent_top) * CONDENSE_FACTOR;
                if let Some(prev) = prev_with_children {
                    top = top.max(prev + s.node_group_spacing);
                }
                nodes[c].top = Some(top);
                prev_with_children = Some(top);

                if first_gap.is_none() && i > 0 {
                    first_gap = Some(top - top_of(nodes, children[i - 1]));
                }
            }
        }

        let Some(gap) = first_gap else {
            return;
        };
        for &c in &children {
            let top = top_of(nodes, c);
            // The very first leaf of the tree stays anchored at 0.
            if !nodes[c].children.is_empty() || top == 0.0 {
                continue;
            }
            let text_clearance = (s.default_title_char_size.text_size
                - s.char_size(nodes[c].depth).text_size)
                * TEXT_SIZE_SPACING_FACTOR;
            nodes[c].top = Some(top + gap - s.sibling_node_spacing + text_clearance);
        }
    }
}

/// Sub-node indices with leaves before nodes that have children, each group
/// keeping reading order.
fn leaves_first(sub_nodes: &[Node]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..sub_nodes.len()).collect();
    order.sort_by_key(|&i| sub_nodes[i].has_children());
    order
}

fn top_of(nodes: &[TitleEntry<'_>], i: usize) -> f64 {
    nodes[i].top.unwrap_or(0.0)
}

/// Give every interior node the midpoint of its first and last child's top.
fn set_non_end_tops(v: usize, nodes: &mut [TitleEntry<'_>]) {
    if nodes[v].top.is_some() || nodes[v].children.is_empty() {
        return;
    }
    let children = nodes[v].children.clone();
    for &c in &children {
        set_non_end_tops(c, nodes);
    }
    if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
        let min = top_of(nodes, first);
        let max = top_of(nodes, last);
        nodes[v].top = Some(min + (max - min) / 2.0);
    }
}

fn resolve_link(
    link: &Link,
    limited: &Node,
    full: &Node,
    index_by_id: &HashMap<&str, usize>,
) -> Option<PosLink> {
    let target = if let Some(&index) = limited
        .lookup(&link.id)
        .and_then(|t| index_by_id.get(t.id.as_str()))
    {
        LinkTarget::Positioned { index }
    } else if let Some(hidden) = full.lookup(&link.id) {
        LinkTarget::Hidden {
            node: hidden.info(),
        }
    } else {
        tracing::warn!(target_id = %link.id, "cross-link target not found");
        return None;
    };

    Some(PosLink {
        id: link.id.clone(),
        reason: link.reason.clone(),
        target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CharSize;
    use crate::tree::Breakdown;

    fn leaf(id: &str) -> Node {
        Node::new(id, id)
    }

    fn branch(id: &str, children: Vec<Node>) -> Node {
        let mut node = leaf(id);
        node.breakdown = Some(Breakdown::new("b", children));
        node
    }

    fn link(node: &mut Node, target: &str) {
        node.links.push(Link {
            id: target.to_string(),
            reason: format!("see {target}"),
        });
    }

    /// Uniform text size everywhere, so no text-size clearance applies.
    fn flat_settings() -> HorizontalSettings {
        HorizontalSettings {
            horizontal_spacing: 100.0,
            sibling_node_spacing: 40.0,
            node_group_spacing: 70.0,
            avg_text_char_sizes: Vec::new(),
            default_title_char_size: CharSize::new(15.0, 7.0),
            horizontal_spacing_additions: Vec::new(),
            ..Default::default()
        }
    }

    fn sample() -> Node {
        branch(
            "n",
            vec![
                branch("n00", vec![leaf("n0000"), branch("n0001", vec![leaf("n000100")])]),
                leaf("n01"),
                branch("n02", vec![leaf("n0200"), leaf("n0201")]),
            ],
        )
    }

    /// Mixed leaf and branch siblings at every level.
    fn mixed() -> Node {
        branch(
            "n",
            vec![
                branch("n00", vec![branch("n0000", vec![leaf("n000000")]), leaf("n0001")]),
                leaf("n01"),
                branch("n02", vec![leaf("n0200"), branch("n0201", vec![leaf("n020100")])]),
            ],
        )
    }

    fn pos<'a>(result: &'a HorizontalResult, id: &str) -> &'a TitlePosNode {
        result
            .find(id)
            .unwrap_or_else(|| panic!("{id} should be positioned"))
    }

    #[test]
    fn test_columns_depend_only_on_depth() {
        let layout = HorizontalLayout::with_defaults();
        let result = layout.compute(&sample());
        assert_eq!(result.positioned_nodes.len(), sample().count());

        // horizontal spacing 600, additions [350, 70, 70]
        let expected = [0.0, 950.0, 1620.0, 2290.0];
        for p in &result.positioned_nodes {
            assert_eq!(p.left, expected[p.depth], "{} at depth {}", p.node.id, p.depth);
        }
        assert_eq!(result.total_width, 2290.0);
        assert_eq!(result.canvas_width, 2290.0 + 80.0);
    }

    #[test]
    fn test_width_from_char_metrics() {
        let result = HorizontalLayout::with_defaults().compute(&sample());
        // "n" at depth 0: 34 * 1 + 10
        assert_eq!(pos(&result, "n").width, 44.0);
        // "n0000" at depth 2: 14.7 * 5 + 10
        assert!((pos(&result, "n0000").width - 83.5).abs() < 1e-9);
    }

    #[test]
    fn test_width_counts_utf16_units() {
        let tree = Node::new("n", "\u{1F52C}a");
        let result = HorizontalLayout::with_defaults().compute(&tree);
        // The microscope emoji is a surrogate pair: 34 * 3 + 10
        assert_eq!(pos(&result, "n").width, 112.0);
    }

    #[test]
    fn test_leaf_tops_use_sibling_and_group_spacing() {
        let tree = branch("n", vec![leaf("n00"), leaf("n01"), leaf("n02")]);
        let result = HorizontalLayout::new(flat_settings()).compute(&tree);

        assert_eq!(pos(&result, "n00").top, 0.0);
        assert_eq!(pos(&result, "n01").top, 40.0);
        assert_eq!(pos(&result, "n02").top, 80.0);
        assert_eq!(pos(&result, "n").top, 40.0);
        assert_eq!(result.total_height, 80.0);
    }

    #[test]
    fn test_text_size_adds_sibling_clearance() {
        let settings = HorizontalSettings {
            avg_text_char_sizes: vec![CharSize::new(40.0, 20.0), CharSize::new(25.0, 12.0)],
            ..flat_settings()
        };
        let tree = branch("n", vec![leaf("n00"), leaf("n01")]);
        let result = HorizontalLayout::new(settings).compute(&tree);
        // 40 + (25 - 15) * 1.4
        assert!((pos(&result, "n01").top - 54.0).abs() < 1e-9);
    }

    #[test]
    fn test_leaves_visited_first_but_children_keep_reading_order() {
        let tree = branch("n", vec![branch("n00", vec![leaf("n0000"), leaf("n0001")]), leaf("n01")]);
        let result = HorizontalLayout::new(flat_settings()).compute(&tree);

        // The leaf sibling is placed first.
        assert_eq!(pos(&result, "n01").top, 0.0);
        assert_eq!(pos(&result, "n0000").top, 70.0);
        assert_eq!(pos(&result, "n0001").top, 110.0);
        assert_eq!(pos(&result, "n00").top, 90.0);
        assert_eq!(pos(&result, "n").top, 45.0);

        let root = pos(&result, "n");
        let ids: Vec<_> = root
            .children
            .as_ref()
            .unwrap()
            .iter()
            .map(|&c| result.positioned_nodes[c].node.id.as_str())
            .collect();
        assert_eq!(ids, vec!["n00", "n01"]);
    }

    #[test]
    fn test_condense_pulls_subtrees_toward_parent() {
        let tree = branch(
            "n",
            vec![
                branch("n00", vec![leaf("n0000"), leaf("n0001")]),
                branch("n01", vec![leaf("n0100"), leaf("n0101")]),
            ],
        );
        let result = HorizontalLayout::new(flat_settings()).compute(&tree);

        // Before condensing: n00 = 20, n01 = 130, root = 75.
        assert_eq!(pos(&result, "n").top, 75.0);
        assert!((pos(&result, "n00").top - 58.5).abs() < 1e-9);
        // 75 + 55 * 0.3 = 91.5, floored at 58.5 + 70.
        assert!((pos(&result, "n01").top - 128.5).abs() < 1e-9);
        // Leaves are not moved by their grandparent.
        assert_eq!(pos(&result, "n0000").top, 0.0);
        assert_eq!(pos(&result, "n0101").top, 150.0);
    }

    #[test]
    fn test_condense_nudges_leaf_below_subtree_that_is_already_lower() {
        let result = HorizontalLayout::with_defaults().compute(&mixed());

        // n00: n0001 at 70, n0000 at 140, so the gap is 70.
        // 70 + 70 - 40 + (15 - 30) * 1.4
        let n0001 = pos(&result, "n0001").top;
        assert!((n0001 - 79.0).abs() < 1e-9, "n0001 top was {n0001}");
        // n02: n0200 at 210, n0201 at 280.
        let n0200 = pos(&result, "n0200").top;
        assert!((n0200 - 219.0).abs() < 1e-9, "n0200 top was {n0200}");
        // Subtrees already below their parent keep their tops.
        assert_eq!(pos(&result, "n0000").top, 140.0);
        assert_eq!(pos(&result, "n0201").top, 280.0);
        // The first leaf of the tree stays at 0.
        assert_eq!(pos(&result, "n01").top, 0.0);
    }

    #[test]
    fn test_condense_nudges_leaf_next_to_pulled_subtree() {
        let settings = HorizontalSettings {
            avg_text_char_sizes: vec![
                CharSize::new(40.0, 7.0),
                CharSize::new(30.0, 7.0),
                CharSize::new(20.0, 7.0),
            ],
            ..flat_settings()
        };
        let tree = branch(
            "n",
            vec![
                leaf("n00"),
                branch(
                    "n01",
                    vec![
                        leaf("n0100"),
                        branch("n0101", vec![leaf("n010100")]),
                        branch("n0102", vec![leaf("n010200"), leaf("n010201"), leaf("n010202")]),
                    ],
                ),
            ],
        );
        let result = HorizontalLayout::new(settings).compute(&tree);

        // Before condensing n01 sits at 160, n0101 at 140 and n0102 at 250.
        assert_eq!(pos(&result, "n01").top, 160.0);
        let n0101 = pos(&result, "n0101").top;
        assert!((n0101 - 154.0).abs() < 1e-9, "n0101 top was {n0101}");
        // 160 + 90 * 0.3 = 187, floored at 154 + 70.
        let n0102 = pos(&result, "n0102").top;
        assert!((n0102 - 224.0).abs() < 1e-9, "n0102 top was {n0102}");
        // Gap 154 - 70 = 84: 70 + 84 - 40 + (15 - 20) * 1.4
        let n0100 = pos(&result, "n0100").top;
        assert!((n0100 - 107.0).abs() < 1e-9, "n0100 top was {n0100}");
    }

    #[test]
    fn test_colors_follow_visiting_order() {
        let settings = HorizontalSettings::default();
        let palette = settings.base_colors.clone();
        let result = HorizontalLayout::new(settings).compute(&mixed());

        assert_eq!(pos(&result, "n").color, palette[0]);
        // Leaves are visited first, so n01 takes the first slot.
        assert_eq!(pos(&result, "n01").color, palette[0]);
        assert_eq!(pos(&result, "n00").color, palette[1]);
        assert_eq!(pos(&result, "n02").color, palette[2]);
        assert_eq!(pos(&result, "n00").color.to_string(), "rgb(179, 153, 204)");
        assert_eq!(pos(&result, "n0001").color.to_string(), "rgb(156, 153, 204)");
        assert_eq!(pos(&result, "n0000").color, palette[1].mix(0.7, palette[1]));
        assert_eq!(pos(&result, "n0200").color, palette[2].mix(0.7, palette[0]));
    }

    #[test]
    fn test_color_independent_of_other_subtrees() {
        let mut other = sample();
        if let Some(b) = &mut other.breakdown {
            b.sub_nodes[2] = branch(
                "n02",
                vec![branch("n0200", vec![leaf("n020000")]), leaf("n0201"), leaf("n0202")],
            );
        }
        let a = HorizontalLayout::with_defaults().compute(&sample());
        let b = HorizontalLayout::with_defaults().compute(&other);
        assert_eq!(pos(&a, "n000100").color, pos(&b, "n000100").color);
    }

    #[test]
    fn test_no_links_means_no_pos_links() {
        let result = HorizontalLayout::with_defaults().compute(&sample());
        assert!(result.positioned_nodes.iter().all(|p| p.pos_links.is_empty()));
    }

    #[test]
    fn test_depth_limit_hides_subtrees_and_links_fall_back() {
        let mut linker = leaf("n01");
        link(&mut linker, "n00");
        link(&mut linker, "n000100");
        link(&mut linker, "n99");
        let tree = branch(
            "n",
            vec![
                branch("n00", vec![branch("n0000", vec![leaf("n000000")]), leaf("n0001")]),
                linker,
            ],
        );

        let result = HorizontalLayout::new(HorizontalSettings {
            depth_limit: Some(1),
            ..flat_settings()
        })
        .compute(&tree);

        assert_eq!(result.positioned_nodes.len(), 3);
        assert!(result.find("n0000").is_none());
        assert!(pos(&result, "n00").children.is_none());

        let links = &pos(&result, "n01").pos_links;
        // The unknown target is dropped.
        assert_eq!(links.len(), 1);
        match &links[0].target {
            LinkTarget::Positioned { index } => {
                assert_eq!(result.positioned_nodes[*index].node.id, "n00");
            }
            other => panic!("expected a positioned target, got {other:?}"),
        }
        assert_eq!(links[0].reason, "see n00");
    }

    #[test]
    fn test_hidden_link_target_uses_full_tree() {
        let mut linker = leaf("n01");
        link(&mut linker, "n000000");
        let tree = branch(
            "n",
            vec![branch("n00", vec![branch("n0000", vec![leaf("n000000")])]), linker],
        );

        let result = HorizontalLayout::new(HorizontalSettings {
            depth_limit: Some(2),
            ..flat_settings()
        })
        .compute(&tree);

        assert!(result.find("n000000").is_none());
        let links = &pos(&result, "n01").pos_links;
        assert_eq!(links.len(), 1);
        match &links[0].target {
            LinkTarget::Hidden { node } => assert_eq!(node.id, "n000000"),
            other => panic!("expected a hidden target, got {other:?}"),
        }
    }

    #[test]
    fn test_single_node_tree() {
        let result = HorizontalLayout::with_defaults().compute(&leaf("n"));
        assert_eq!(result.positioned_nodes.len(), 1);
        let root = &result.positioned_nodes[0];
        assert_eq!((root.left, root.top), (0.0, 0.0));
        assert!(root.children.is_none());
        assert_eq!(result.total_height, 0.0);
        assert_eq!(result.total_width, 0.0);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let layout = HorizontalLayout::with_defaults();
        assert_eq!(layout.compute(&sample()), layout.compute(&sample()));
    }
}
