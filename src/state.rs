//! Bridge state
//!
//! Everything the pipeline knows lives in one record that is passed by
//! reference into each component operation.

use crate::commit::{CommitProcessor, ShadowTree};
use crate::filter::FilterEngine;
use crate::profiler::Profiler;
use crate::registry::VNodeRegistry;
use crate::selection::SelectionTracker;
use crate::strings::StringTable;
use crate::types::VNodeId;

#[derive(Debug)]
pub struct BridgeState {
    pub renderer_id: u32,
    pub registry: VNodeRegistry,
    pub strings: StringTable,
    pub filters: FilterEngine,
    pub shadow: ShadowTree,
    pub profiler: Profiler,
    pub selection: SelectionTracker,
    pub processor: CommitProcessor,
    /// Live roots in mount order
    pub roots: Vec<VNodeId>,
}

impl Default for BridgeState {
    fn default() -> Self {
        Self::new(1)
    }
}

impl BridgeState {
    pub fn new(renderer_id: u32) -> Self {
        Self {
            renderer_id,
            registry: VNodeRegistry::new(),
            strings: StringTable::new(),
            filters: FilterEngine::new(),
            shadow: ShadowTree::default(),
            profiler: Profiler::default(),
            selection: SelectionTracker::new(),
            processor: CommitProcessor::new(),
            roots: Vec::new(),
        }
    }
}
