//! Research-map tree model.
//!
//! Raw trees come straight from stored JSON and may offer several candidate
//! breakdowns per node. Breakdown selection converts them into the strict
//! [`Node`] shape, and path ids address nodes within that shape.

pub mod address;
mod breakdown;
mod node;

pub use address::{NodePath, PathStep};
pub use breakdown::{
    BreakdownResolver, BreakdownSelection, all_collapsible_ids, first_breakdowns,
    resolve_breakdowns,
};
pub use node::{
    AlternativeBreakdown, Breakdown, Link, Node, NodeInfo, RawBreakdown, RawNode,
    average_branching_factor, count_end_nodes,
};
