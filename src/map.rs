//! ResearchMap - the stateful core behind the WASM facade.
//!
//! Holds the raw tree, the settings and the breakdown selection, and keeps
//! the resolved tree in sync with them so both layouts and the tree queries
//! see the same active breakdowns.

use std::collections::HashSet;

use crate::error::{LayoutError, Result};
use crate::layout::{HorizontalLayout, HorizontalResult, VerticalLayout, VerticalResult};
use crate::settings::TreeSettings;
use crate::tree::{
    BreakdownSelection, Node, RawNode, all_collapsible_ids, average_branching_factor,
    count_end_nodes, resolve_breakdowns,
};

pub struct ResearchMap {
    raw: RawNode,
    settings: TreeSettings,
    selection: BreakdownSelection,
    /// Ignore selected breakdowns that have no sub-nodes.
    require_sub_nodes: bool,
    /// `raw` resolved against `selection`, rebuilt whenever either changes
    resolved: Node,
}

impl ResearchMap {
    pub fn new(raw: RawNode, settings: TreeSettings) -> Self {
        let selection = BreakdownSelection::new();
        let resolved = resolve_breakdowns(&raw, &selection, true);
        Self {
            raw,
            settings,
            selection,
            require_sub_nodes: true,
            resolved,
        }
    }

    /// Parse a raw tree document and an optional settings document.
    pub fn from_json(tree: &str, settings: Option<&str>) -> Result<Self> {
        let raw = RawNode::from_json(tree)?;
        let settings = match settings {
            Some(json) => TreeSettings::from_json(json)?,
            None => TreeSettings::default(),
        };
        Ok(Self::new(raw, settings))
    }

    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: TreeSettings) {
        self.settings = settings;
    }

    pub fn selection(&self) -> &BreakdownSelection {
        &self.selection
    }

    /// The tree with the active breakdowns applied.
    pub fn tree(&self) -> &Node {
        &self.resolved
    }

    pub fn set_selection(&mut self, selection: BreakdownSelection) {
        self.selection = selection;
        self.refresh();
    }

    /// Choose the breakdown shown for one node.
    pub fn select_breakdown(&mut self, node_id: &str, breakdown_id: &str) {
        self.selection
            .insert(node_id.to_string(), breakdown_id.to_string());
        self.refresh();
    }

    pub fn set_require_sub_nodes(&mut self, require: bool) {
        if self.require_sub_nodes != require {
            self.require_sub_nodes = require;
            self.refresh();
        }
    }

    fn refresh(&mut self) {
        self.resolved = resolve_breakdowns(&self.raw, &self.selection, self.require_sub_nodes);
    }

    /// Box layout with the given subtrees collapsed.
    pub fn layout_default(&self, collapsed: &HashSet<String>) -> VerticalResult {
        VerticalLayout::new(self.settings.default_mode.clone()).compute(&self.resolved, collapsed)
    }

    /// Titles layout. `depth_limit` overrides the configured limit when set.
    pub fn layout_titles(&self, depth_limit: Option<usize>) -> HorizontalResult {
        let mut settings = self.settings.titles_mode.clone();
        if depth_limit.is_some() {
            settings.depth_limit = depth_limit;
        }
        HorizontalLayout::new(settings).compute(&self.resolved)
    }

    pub fn node(&self, id: &str) -> Result<&Node> {
        self.resolved
            .lookup(id)
            .ok_or_else(|| LayoutError::NodeNotFound { id: id.to_string() })
    }

    /// Ids a "collapse all" should hide, across every candidate breakdown.
    pub fn all_collapsible_ids(&self) -> Vec<String> {
        all_collapsible_ids(&self.raw)
    }

    pub fn count_end_nodes(&self, id: &str) -> Result<usize> {
        count_end_nodes(self.node(id)?)
    }

    pub fn average_branching_factor(&self) -> f64 {
        average_branching_factor(&self.resolved)
    }
}
