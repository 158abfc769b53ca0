//! Path-encoded node ids.
//!
//! A node id spells out the route from the root: a leading [`PATH_MARKER`]
//! followed by one `(breakdown index, sub-node index)` pair per step. Single
//! digit indices are written bare; larger ones are wrapped in a pair of
//! [`INDEX_DELIMITER`]s so the string can still be read one character at a
//! time without a separator between every digit.
//!
//! ```text
//! n          root
//! n02        root -> breakdown 0 -> sub-node 2
//! n0_12_10   root -> breakdown 0 -> sub-node 12 -> breakdown 1 -> sub-node 0
//! ```
//!
//! Ids stay strings at the boundary (they are persisted in links), but all
//! manipulation happens on the typed [`NodePath`].

use std::fmt;
use std::str::FromStr;

use super::node::Node;
use crate::error::AddressError;

/// First character of every path id.
pub const PATH_MARKER: char = 'n';

/// Opens and closes a multi-digit index.
pub const INDEX_DELIMITER: char = '_';

/// One step down the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathStep {
    /// Index into the parent's candidate breakdowns.
    pub breakdown: usize,
    /// Index into that breakdown's sub-nodes.
    pub sub_node: usize,
}

impl PathStep {
    #[inline]
    pub fn new(breakdown: usize, sub_node: usize) -> Self {
        Self {
            breakdown,
            sub_node,
        }
    }
}

/// Typed form of a node id.
///
/// Ordering is lexicographic over steps, which is pre-order: a parent sorts
/// before its children and siblings sort by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    steps: Vec<PathStep>,
}

impl NodePath {
    /// The root's path.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Number of steps from the root (root = 0).
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Path of a child reached through `breakdown` / `sub_node`.
    pub fn child(&self, breakdown: usize, sub_node: usize) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(PathStep::new(breakdown, sub_node));
        Self { steps }
    }

    /// Path with the last step removed, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.steps.split_last()?;
        Some(Self {
            steps: rest.to_vec(),
        })
    }

    /// `self`, its parent, grandparent, ... down to and including the root.
    pub fn ancestors(&self) -> impl Iterator<Item = NodePath> + '_ {
        (0..=self.steps.len())
            .rev()
            .map(|len| Self::from_steps(self.steps[..len].to_vec()))
    }

    /// The sub-node index of every step.
    pub fn sub_node_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps.iter().map(|step| step.sub_node)
    }

    /// Parse an id, requiring complete `(breakdown, sub-node)` pairs.
    pub fn parse(id: &str) -> Result<Self, AddressError> {
        let indices = decode(id)?;
        if indices.len() % 2 != 0 {
            return Err(AddressError::OddIndexCount { id: id.to_string() });
        }
        let steps = indices
            .chunks_exact(2)
            .map(|pair| PathStep::new(pair[0], pair[1]))
            .collect();
        Ok(Self { steps })
    }

    /// String form of the path.
    pub fn encode(&self) -> String {
        let mut id = String::with_capacity(1 + self.steps.len() * 2);
        id.push(PATH_MARKER);
        for step in &self.steps {
            push_index(&mut id, step.breakdown);
            push_index(&mut id, step.sub_node);
        }
        id
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for NodePath {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn push_index(id: &mut String, index: usize) {
    if index < 10 {
        id.push(char::from(b'0' + index as u8));
    } else {
        id.push(INDEX_DELIMITER);
        id.push_str(&index.to_string());
        id.push(INDEX_DELIMITER);
    }
}

/// Decode an id into its raw index sequence
/// `[breakdown, sub_node, breakdown, sub_node, ...]`.
pub fn decode(id: &str) -> Result<Vec<usize>, AddressError> {
    let mut chars = id.char_indices();
    match chars.next() {
        Some((_, c)) if c == PATH_MARKER => {}
        _ => {
            return Err(AddressError::MissingMarker {
                id: id.to_string(),
                marker: PATH_MARKER,
            });
        }
    }

    let mut indices = Vec::new();
    while let Some((offset, c)) = chars.next() {
        if let Some(digit) = c.to_digit(10) {
            indices.push(digit as usize);
            continue;
        }
        if c != INDEX_DELIMITER {
            return Err(AddressError::UnexpectedChar {
                id: id.to_string(),
                found: c,
                offset,
            });
        }

        let mut value: usize = 0;
        let mut digits = 0;
        let mut closed = false;
        for (offset, c) in chars.by_ref() {
            if c == INDEX_DELIMITER {
                closed = true;
                break;
            }
            let Some(digit) = c.to_digit(10) else {
                return Err(AddressError::UnexpectedChar {
                    id: id.to_string(),
                    found: c,
                    offset,
                });
            };
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit as usize))
                .ok_or_else(|| AddressError::IndexOverflow { id: id.to_string() })?;
            digits += 1;
        }

        if !closed {
            return Err(AddressError::UnterminatedIndex { id: id.to_string() });
        }
        if digits == 0 {
            return Err(AddressError::EmptyIndex { id: id.to_string() });
        }
        indices.push(value);
    }

    Ok(indices)
}

/// Decode only the sub-node indices (every second raw index).
pub fn decode_sub_node_indices(id: &str) -> Result<Vec<usize>, AddressError> {
    Ok(NodePath::parse(id)?.sub_node_indices().collect())
}

/// Id of the parent node. `None` for the root or a malformed id.
pub fn parent_id(id: &str) -> Option<String> {
    NodePath::parse(id).ok()?.parent().map(|p| p.encode())
}

/// `[id, parent, grandparent, ..., root]`. Empty for a malformed id.
pub fn ancestor_chain(id: &str) -> Vec<String> {
    match NodePath::parse(id) {
        Ok(path) => path.ancestors().map(|p| p.encode()).collect(),
        Err(_) => Vec::new(),
    }
}

/// Walk `root` along the sub-node indices of `id`.
///
/// Returns `None` if the id is malformed, a step has no breakdown or runs
/// past the end of one, or the node reached carries a different id (the
/// path went through a breakdown that is not the active one).
pub fn resolve<'a>(id: &str, root: &'a Node) -> Option<&'a Node> {
    let path = NodePath::parse(id).ok()?;
    let mut node = root;
    for index in path.sub_node_indices() {
        node = node.breakdown.as_ref()?.sub_nodes.get(index)?;
    }
    (node.id == id).then_some(node)
}
