//! Research Map Layout - WASM Module
//!
//! This module lays out research-map trees for the research map viewer.
//! It is compiled to WebAssembly and exposes a JavaScript-friendly API via
//! wasm-bindgen.
//!
//! # Architecture
//!
//! - `tree`: Raw and resolved tree model, breakdown selection, path ids
//! - `layout`: Vertical (box) and horizontal (titles) layout algorithms
//! - `color`: Hierarchical node colors
//! - `settings`: Layout configuration with per-tree overrides
//! - `map`: Stateful core tying a tree, its settings and its selection together

use std::collections::HashSet;

use js_sys::Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod color;
pub mod error;
pub mod layout;
pub mod map;
pub mod settings;
pub mod tree;

use map::ResearchMap;
use settings::TreeSettings;
use tree::{BreakdownSelection, RawNode, address};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Main entry point for the layout engine.
///
/// This struct wraps the internal ResearchMap and provides the public API
/// exposed to JavaScript.
#[wasm_bindgen]
pub struct ResearchMapWasm {
    map: ResearchMap,
}

#[wasm_bindgen]
impl ResearchMapWasm {
    /// Create an engine for one stored tree.
    ///
    /// # Arguments
    ///
    /// * `tree` - The stored tree object
    /// * `settings` - Optional partial settings, merged over the defaults
    #[wasm_bindgen(constructor)]
    pub fn new(tree: JsValue, settings: JsValue) -> Result<ResearchMapWasm, JsValue> {
        let raw: RawNode = serde_wasm_bindgen::from_value(tree)?;
        let settings: TreeSettings = if settings.is_undefined() || settings.is_null() {
            TreeSettings::default()
        } else {
            serde_wasm_bindgen::from_value(settings)?
        };
        Ok(Self {
            map: ResearchMap::new(raw, settings),
        })
    }

    // =========================================================================
    // Breakdown Selection
    // =========================================================================

    /// Replace the whole selection with a `{ nodeId: breakdownId }` object.
    #[wasm_bindgen(js_name = setBreakdownSelection)]
    pub fn set_breakdown_selection(&mut self, selection: JsValue) -> Result<(), JsValue> {
        let selection: BreakdownSelection = serde_wasm_bindgen::from_value(selection)?;
        self.map.set_selection(selection);
        Ok(())
    }

    /// Choose the breakdown shown for one node.
    #[wasm_bindgen(js_name = selectBreakdown)]
    pub fn select_breakdown(&mut self, node_id: &str, breakdown_id: &str) {
        self.map.select_breakdown(node_id, breakdown_id);
    }

    /// Whether a selected breakdown without sub-nodes falls back to the first.
    #[wasm_bindgen(js_name = setRequireSubNodes)]
    pub fn set_require_sub_nodes(&mut self, require: bool) {
        self.map.set_require_sub_nodes(require);
    }

    // =========================================================================
    // Layout Algorithms
    // =========================================================================

    /// Compute the box layout.
    ///
    /// Returns `{ positionedNodes, totalHeight, totalWidth, nodeWidth, nodeHeight }`.
    ///
    /// # Arguments
    ///
    /// * `collapsed` - Ids of nodes whose subtrees are hidden
    #[wasm_bindgen(js_name = layoutDefault)]
    pub fn layout_default(&self, collapsed: Array) -> Result<JsValue, JsValue> {
        let collapsed: HashSet<String> = collapsed.iter().filter_map(|v| v.as_string()).collect();
        to_js(&self.map.layout_default(&collapsed))
    }

    /// Compute the titles layout.
    ///
    /// Returns `{ positionedNodes, totalHeight, totalWidth, canvasWidth }`.
    ///
    /// # Arguments
    ///
    /// * `depth_limit` - Overrides the configured depth limit when given
    #[wasm_bindgen(js_name = layoutTitles)]
    pub fn layout_titles(&self, depth_limit: Option<u32>) -> Result<JsValue, JsValue> {
        to_js(&self.map.layout_titles(depth_limit.map(|d| d as usize)))
    }

    // =========================================================================
    // Tree Queries
    // =========================================================================

    /// Parent path id, or undefined for the root.
    #[wasm_bindgen(js_name = parentId)]
    pub fn parent_id(&self, id: &str) -> Option<String> {
        address::parent_id(id)
    }

    /// Path ids from `id` up to the root, inclusive.
    #[wasm_bindgen(js_name = ancestorChain)]
    pub fn ancestor_chain(&self, id: &str) -> Vec<String> {
        address::ancestor_chain(id)
    }

    /// The node payload (without its subtree), or undefined.
    #[wasm_bindgen(js_name = nodeById)]
    pub fn node_by_id(&self, id: &str) -> Result<JsValue, JsValue> {
        match self.map.node(id) {
            Ok(node) => to_js(&node.info()),
            Err(_) => Ok(JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(js_name = allCollapsibleIds)]
    pub fn all_collapsible_ids(&self) -> Vec<String> {
        self.map.all_collapsible_ids()
    }

    /// Number of end nodes under `id`. Fails if `id` has no breakdown.
    #[wasm_bindgen(js_name = countEndNodes)]
    pub fn count_end_nodes(&self, id: &str) -> Result<u32, JsValue> {
        self.map
            .count_end_nodes(id)
            .map(|n| n as u32)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = averageBranchingFactor)]
    pub fn average_branching_factor(&self) -> f64 {
        self.map.average_branching_factor()
    }
}

/// Serialize with maps as plain objects, so opaque JSON payloads round-trip.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}
