//! Breakdown selection: turn a [`RawNode`] tree into a strict [`Node`] tree.
//!
//! Each node keeps exactly one active breakdown, chosen from its candidates
//! through a selection map keyed by node id. Only the active breakdown is
//! recursed into, so the cost is bounded by the visible tree. The raw tree is
//! never modified.

use std::collections::HashMap;

use super::address::NodePath;
use super::node::{AlternativeBreakdown, Breakdown, Node, RawBreakdown, RawNode};

/// Node id -> chosen breakdown id.
pub type BreakdownSelection = HashMap<String, String>;

/// Resolves raw trees against a breakdown selection.
#[derive(Debug, Clone, Copy)]
pub struct BreakdownResolver<'a> {
    selection: &'a BreakdownSelection,
    require_sub_nodes: bool,
}

impl<'a> BreakdownResolver<'a> {
    /// With `require_sub_nodes`, a selected breakdown that has no sub-nodes is
    /// ignored in favor of the first candidate.
    pub fn new(selection: &'a BreakdownSelection, require_sub_nodes: bool) -> Self {
        Self {
            selection,
            require_sub_nodes,
        }
    }

    /// Resolve a whole tree from its root.
    pub fn resolve(&self, root: &RawNode) -> Node {
        self.resolve_node(root, &NodePath::root())
    }

    fn resolve_node(&self, raw: &RawNode, path: &NodePath) -> Node {
        let id = node_id(raw, path);
        let candidates: Vec<&RawBreakdown> = raw.candidates().collect();
        let active = self.choose(&id, &candidates);

        let breakdown = active.map(|index| {
            let chosen = candidates[index];
            let sub_nodes = chosen
                .sub_nodes
                .iter()
                .enumerate()
                .map(|(i, sub)| self.resolve_node(sub, &path.child(index, i)))
                .collect();
            Breakdown {
                id: breakdown_id(chosen, index),
                title: chosen.title.clone(),
                sub_nodes,
                explanation: chosen.explanation.clone(),
                references: chosen.references.clone(),
                paper: chosen.paper.clone(),
            }
        });

        let other_breakdowns = candidates
            .iter()
            .enumerate()
            .filter(|&(i, _)| Some(i) != active)
            .map(|(i, b)| AlternativeBreakdown {
                id: breakdown_id(b, i),
                title: b.title.clone(),
                explanation: b.explanation.clone(),
                sub_node_count: b.sub_nodes.len(),
            })
            .collect();

        Node {
            id,
            title: raw.title.clone(),
            description: raw.description.clone(),
            mini_description: raw.mini_description.clone(),
            breakdown,
            other_breakdowns,
            links: raw.links.clone(),
            papers: raw.papers.clone(),
            questions: raw.questions.clone(),
        }
    }

    /// Index of the candidate to activate, or `None` when there are none.
    fn choose(&self, node_id: &str, candidates: &[&RawBreakdown]) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }

        let Some(selected) = self.selection.get(node_id) else {
            return Some(0);
        };

        match candidates
            .iter()
            .enumerate()
            .find(|&(i, b)| breakdown_id(b, i) == *selected)
        {
            Some((_, b)) if self.require_sub_nodes && b.sub_nodes.is_empty() => {
                tracing::debug!(node_id, selected = %selected, "selected breakdown is empty, using first");
                Some(0)
            }
            Some((i, _)) => Some(i),
            None => {
                tracing::debug!(node_id, selected = %selected, "selected breakdown not found, using first");
                Some(0)
            }
        }
    }
}

/// Resolve with an explicit selection.
pub fn resolve_breakdowns(
    root: &RawNode,
    selection: &BreakdownSelection,
    require_sub_nodes: bool,
) -> Node {
    BreakdownResolver::new(selection, require_sub_nodes).resolve(root)
}

/// Resolve taking the first candidate everywhere.
pub fn first_breakdowns(root: &RawNode) -> Node {
    resolve_breakdowns(root, &BreakdownSelection::new(), false)
}

/// Every node id across all candidate breakdowns, except the root's.
pub fn all_collapsible_ids(root: &RawNode) -> Vec<String> {
    fn walk(raw: &RawNode, path: &NodePath, ids: &mut Vec<String>) {
        if !path.is_root() {
            ids.push(node_id(raw, path));
        }
        for (b, breakdown) in raw.candidates().enumerate() {
            for (i, sub) in breakdown.sub_nodes.iter().enumerate() {
                walk(sub, &path.child(b, i), ids);
            }
        }
    }

    let mut ids = Vec::new();
    walk(root, &NodePath::root(), &mut ids);
    ids
}

fn node_id(raw: &RawNode, path: &NodePath) -> String {
    raw.id.clone().unwrap_or_else(|| path.encode())
}

fn breakdown_id(breakdown: &RawBreakdown, index: usize) -> String {
    breakdown.id.clone().unwrap_or_else(|| index.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawNode {
        serde_json::from_value(value).unwrap()
    }

    fn two_plans() -> RawNode {
        raw(json!({
            "title": "root",
            "breakdowns": [
                { "id": "plan-a", "sub_nodes": [
                    { "title": "a0", "breakdowns": [
                        { "id": "deep", "sub_nodes": [{ "title": "a00" }] }
                    ] },
                    { "title": "a1" }
                ] },
                { "id": "plan-b", "sub_nodes": [{ "title": "b0" }] },
                { "id": "plan-empty", "sub_nodes": [] }
            ]
        }))
    }

    #[test]
    fn test_defaults_to_first_candidate() {
        let node = first_breakdowns(&two_plans());
        assert_eq!(node.id, "n");
        let breakdown = node.breakdown.as_ref().unwrap();
        assert_eq!(breakdown.id, "plan-a");
        assert_eq!(breakdown.sub_nodes.len(), 2);
        assert_eq!(breakdown.sub_nodes[0].id, "n00");
        assert_eq!(breakdown.sub_nodes[1].id, "n01");
        assert_eq!(breakdown.sub_nodes[0].sub_nodes()[0].id, "n0000");

        let others: Vec<_> = node.other_breakdowns.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(others, vec!["plan-b", "plan-empty"]);
        assert_eq!(node.other_breakdowns[0].sub_node_count, 1);
    }

    #[test]
    fn test_uses_selection() {
        let selection: BreakdownSelection =
            [("n".to_string(), "plan-b".to_string())].into_iter().collect();
        let node = resolve_breakdowns(&two_plans(), &selection, true);
        let breakdown = node.breakdown.as_ref().unwrap();
        assert_eq!(breakdown.id, "plan-b");
        // Ids encode the candidate index the node was reached through.
        assert_eq!(breakdown.sub_nodes[0].id, "n10");
        let others: Vec<_> = node.other_breakdowns.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(others, vec!["plan-a", "plan-empty"]);
    }

    #[test]
    fn test_empty_selection_respects_flag() {
        let selection: BreakdownSelection = [("n".to_string(), "plan-empty".to_string())]
            .into_iter()
            .collect();

        let strict = resolve_breakdowns(&two_plans(), &selection, true);
        assert_eq!(strict.breakdown.as_ref().unwrap().id, "plan-a");

        let lenient = resolve_breakdowns(&two_plans(), &selection, false);
        assert_eq!(lenient.breakdown.as_ref().unwrap().id, "plan-empty");
        assert!(!lenient.has_children());
    }

    #[test]
    fn test_unknown_selection_falls_back() {
        let selection: BreakdownSelection =
            [("n".to_string(), "nope".to_string())].into_iter().collect();
        let node = resolve_breakdowns(&two_plans(), &selection, false);
        assert_eq!(node.breakdown.as_ref().unwrap().id, "plan-a");
    }

    #[test]
    fn test_does_not_mutate_input() {
        let tree = two_plans();
        let before = tree.clone();
        let _ = first_breakdowns(&tree);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_explicit_ids_are_kept() {
        let tree = raw(json!({
            "id": "root",
            "title": "root",
            "breakdown": { "sub_nodes": [{ "id": "child", "title": "c" }] }
        }));
        let node = first_breakdowns(&tree);
        assert_eq!(node.id, "root");
        assert_eq!(node.breakdown.as_ref().unwrap().id, "0");
        assert_eq!(node.sub_nodes()[0].id, "child");
    }

    #[test]
    fn test_all_collapsible_ids_spans_every_candidate() {
        let ids = all_collapsible_ids(&two_plans());
        assert_eq!(ids, vec!["n00", "n0000", "n01", "n10"]);
    }
}
