//! Tree node types.
//!
//! [`RawNode`] mirrors the stored JSON, where a node may offer several
//! candidate breakdowns. [`Node`] is the strict shape the layouts work on:
//! exactly zero or one active breakdown, every id present.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LayoutError, Result};

/// A non-hierarchical reference from one node to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Id of the target node.
    pub id: String,
    #[serde(default)]
    pub reason: String,
}

/// A node as stored, before breakdown selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNode {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub mini_description: Option<String>,
    pub breakdowns: Vec<RawBreakdown>,
    /// Older trees store a single breakdown under this key.
    pub breakdown: Option<RawBreakdown>,
    pub links: Vec<Link>,
    pub papers: Option<Value>,
    pub questions: Option<Value>,
}

impl RawNode {
    /// Parse a stored tree.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Candidate breakdowns in order, including the legacy single one.
    pub fn candidates(&self) -> impl Iterator<Item = &RawBreakdown> {
        self.breakdowns.iter().chain(self.breakdown.iter())
    }
}

/// A candidate decomposition of a [`RawNode`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBreakdown {
    pub id: Option<String>,
    pub title: Option<String>,
    pub sub_nodes: Vec<RawNode>,
    pub explanation: Option<String>,
    pub references: Option<Value>,
    pub paper: Option<Value>,
}

/// A tree vertex with one resolved breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mini_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Breakdown>,
    #[serde(rename = "otherBreakdowns", skip_serializing_if = "Vec::is_empty")]
    pub other_breakdowns: Vec<AlternativeBreakdown>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub papers: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Value>,
}

/// The active decomposition of a [`Node`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub sub_nodes: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper: Option<Value>,
}

impl Breakdown {
    pub fn new(id: impl Into<String>, sub_nodes: Vec<Node>) -> Self {
        Self {
            id: id.into(),
            title: None,
            sub_nodes,
            explanation: None,
            references: None,
            paper: None,
        }
    }
}

/// An inactive candidate breakdown. Its sub-nodes are not resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeBreakdown {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub sub_node_count: usize,
}

/// The per-node payload carried by positioned output, without the subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mini_description: Option<String>,
    #[serde(rename = "breakdownId", skip_serializing_if = "Option::is_none")]
    pub breakdown_id: Option<String>,
    #[serde(rename = "otherBreakdowns", skip_serializing_if = "Vec::is_empty")]
    pub other_breakdowns: Vec<AlternativeBreakdown>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub papers: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Value>,
}

impl Node {
    /// A bare leaf node.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            mini_description: None,
            breakdown: None,
            other_breakdowns: Vec::new(),
            links: Vec::new(),
            papers: None,
            questions: None,
        }
    }

    /// Active sub-nodes, empty when there is no breakdown.
    pub fn sub_nodes(&self) -> &[Node] {
        self.breakdown
            .as_ref()
            .map(|b| b.sub_nodes.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the active breakdown has at least one sub-node.
    pub fn has_children(&self) -> bool {
        !self.sub_nodes().is_empty()
    }

    /// Active sub-nodes that are not collapsed.
    pub fn visible_sub_nodes<'s>(
        &'s self,
        collapsed: &HashSet<String>,
    ) -> impl Iterator<Item = &'s Node> {
        self.sub_nodes()
            .iter()
            .filter(move |sub| !collapsed.contains(&sub.id))
    }

    /// Depth-first search by id.
    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.sub_nodes().iter().find_map(|sub| sub.find(id))
    }

    /// Look a node up by path, falling back to a search for ids that are not
    /// valid paths.
    pub fn lookup(&self, id: &str) -> Option<&Node> {
        super::address::resolve(id, self).or_else(|| self.find(id))
    }

    /// Copy of the tree in which nodes at `max_depth` lose their breakdown.
    pub fn limited_to_depth(&self, max_depth: usize) -> Node {
        fn truncate(node: &mut Node, remaining: usize) {
            if remaining == 0 {
                node.breakdown = None;
                return;
            }
            if let Some(breakdown) = &mut node.breakdown {
                for sub in &mut breakdown.sub_nodes {
                    truncate(sub, remaining - 1);
                }
            }
        }

        let mut copy = self.clone();
        truncate(&mut copy, max_depth);
        copy
    }

    /// Number of nodes in the active tree.
    pub fn count(&self) -> usize {
        1 + self.sub_nodes().iter().map(Node::count).sum::<usize>()
    }

    /// Payload without the subtree.
    pub fn info(&self) -> NodeInfo {
        NodeInfo {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            mini_description: self.mini_description.clone(),
            breakdown_id: self.breakdown.as_ref().map(|b| b.id.clone()),
            other_breakdowns: self.other_breakdowns.clone(),
            links: self.links.clone(),
            papers: self.papers.clone(),
            questions: self.questions.clone(),
        }
    }
}

/// Average number of sub-nodes over the nodes that carry a breakdown.
///
/// Returns `0.0` when no node has a breakdown.
pub fn average_branching_factor(node: &Node) -> f64 {
    fn walk(n: &Node, nodes: &mut usize, branches: &mut usize) {
        if let Some(breakdown) = &n.breakdown {
            *nodes += 1;
            *branches += breakdown.sub_nodes.len();
            for sub in &breakdown.sub_nodes {
                walk(sub, nodes, branches);
            }
        }
    }

    let mut nodes = 0;
    let mut branches = 0;
    walk(node, &mut nodes, &mut branches);

    if nodes == 0 {
        0.0
    } else {
        branches as f64 / nodes as f64
    }
}

/// Number of leaves under `node`.
///
/// Calling this on a node without a breakdown is a caller error.
pub fn count_end_nodes(node: &Node) -> Result<usize> {
    let breakdown = node
        .breakdown
        .as_ref()
        .ok_or_else(|| LayoutError::NoBreakdown {
            id: node.id.clone(),
        })?;

    let mut sum = 0;
    for sub in &breakdown.sub_nodes {
        sum += if sub.has_children() {
            count_end_nodes(sub)?
        } else {
            1
        };
    }
    Ok(sum)
}
