//! Scenario files: a scripted sequence of runtime and host calls.

use crate::bridge::{Bridge, HookEvent, RecordingHook};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::filter::FilterRule;
use crate::profiler::ProfilingData;
use crate::selection::{BestMatch, SelectionPath};
use crate::tree::VNode;
use crate::types::NodeHandle;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Commit { root: VNode },
    Unmount { handle: NodeHandle },
    Filters { rules: Vec<FilterRule> },
    StartProfiling,
    StopProfiling,
    Track { path: Option<SelectionPath> },
    Connect,
    Disconnect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Overrides the configured renderer id
    #[serde(default)]
    pub renderer_id: Option<u32>,
    /// Connect before the first step
    #[serde(default = "default_true")]
    pub connect: bool,
    pub steps: Vec<Step>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub events: Vec<HookEvent>,
    /// Messages still queued when the scenario ended
    pub pending: usize,
    pub best_match: Option<BestMatch>,
    pub profiling: ProfilingData,
}

impl ReplayReport {
    pub fn messages(&self) -> Vec<Vec<u32>> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HookEvent::Operations(message) => Some(message.payload.clone()),
                HookEvent::BestMatch(_) => None,
            })
            .collect()
    }
}

/// Run every step against a fresh bridge built from `config`.
pub fn run_scenario(scenario: &Scenario, config: &BridgeConfig) -> Result<ReplayReport, BridgeError> {
    let hook = RecordingHook::new();
    let mut bridge = Bridge::from_config(config)?;
    bridge.attach(
        scenario.renderer_id.unwrap_or(config.renderer_id),
        Box::new(hook.clone()),
    );
    if scenario.connect {
        bridge.connect()?;
    }

    for (index, step) in scenario.steps.iter().enumerate() {
        debug!(index, ?step, "Scenario step");
        match step {
            Step::Commit { root } => bridge.on_commit_root(root)?,
            Step::Unmount { handle } => bridge.on_commit_unmount(*handle)?,
            Step::Filters { rules } => bridge.apply_filters(rules.clone())?,
            Step::StartProfiling => {
                if !bridge.start_profiling() {
                    warn!(index, "Profiling already running");
                }
            }
            Step::StopProfiling => bridge.stop_profiling(),
            Step::Track { path } => bridge.set_tracked_path(path.clone()),
            Step::Connect => {
                bridge.connect()?;
            }
            Step::Disconnect => bridge.disconnect(),
        }
    }

    Ok(ReplayReport {
        events: hook.drain(),
        pending: bridge.pending_len(),
        best_match: bridge.get_best_match(),
        profiling: bridge.get_profiling_data(),
    })
}
