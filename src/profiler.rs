//! Profiler
//!
//! Records per-node render timings and changed prop/state keys for every
//! commit while running, grouped by root. Stopping keeps the history; a new
//! session started after a stop begins with empty history.

use crate::registry::VNodeRegistry;
use crate::types::VNodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfilerStatus {
    Stopped,
    Running,
}

impl ProfilerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProfilerStatus::Stopped => "stopped",
            ProfilerStatus::Running => "running",
        }
    }
}

/// Render cost of one visible node in one commit, in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub id: VNodeId,
    pub self_duration: u64,
    pub total_duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitProfile {
    /// Microseconds since profiling started
    pub commit_time_micros: u64,
    /// Nodes whose props or state keys changed since the previous commit
    pub changed: BTreeMap<VNodeId, BTreeSet<String>>,
    pub timings: Vec<Timing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootProfile {
    pub root_id: VNodeId,
    /// Tree base durations of the nodes that existed when profiling started
    pub initial_tree_base_durations: Vec<(VNodeId, u64)>,
    pub commits: Vec<CommitProfile>,
}

impl RootProfile {
    fn new(root_id: VNodeId) -> Self {
        Self {
            root_id,
            initial_tree_base_durations: Vec::new(),
            commits: Vec::new(),
        }
    }
}

/// Snapshot handed to the host on demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilingData {
    pub renderer_id: u32,
    pub captured_at: DateTime<Utc>,
    pub status: ProfilerStatus,
    pub roots: Vec<RootProfile>,
}

#[derive(Debug)]
pub struct Profiler {
    status: ProfilerStatus,
    started_at: Option<Instant>,
    record_changes: bool,
    roots: BTreeMap<VNodeId, RootProfile>,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Profiler {
    pub fn new(record_changes: bool) -> Self {
        Self {
            status: ProfilerStatus::Stopped,
            started_at: None,
            record_changes,
            roots: BTreeMap::new(),
        }
    }

    pub fn status(&self) -> ProfilerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == ProfilerStatus::Running
    }

    /// Whether changed prop/state keys should be collected
    pub fn records_changes(&self) -> bool {
        self.is_running() && self.record_changes
    }

    /// Begin a session, seeding baselines from the current tree base durations.
    ///
    /// Returns `false` when already running.
    pub fn start_profiling(
        &mut self,
        registry: &VNodeRegistry,
        base_durations: &HashMap<VNodeId, u64>,
    ) -> bool {
        if self.is_running() {
            debug!("Profiling already running");
            return false;
        }
        self.status = ProfilerStatus::Running;
        self.started_at = Some(Instant::now());
        self.roots.clear();

        let mut seeded: BTreeMap<VNodeId, Vec<(VNodeId, u64)>> = BTreeMap::new();
        for (id, duration) in base_durations {
            if let Some(entry) = registry.resolve(*id) {
                seeded.entry(entry.root).or_default().push((*id, *duration));
            }
        }
        for (root_id, mut durations) in seeded {
            durations.sort_unstable();
            let profile = self
                .roots
                .entry(root_id)
                .or_insert_with(|| RootProfile::new(root_id));
            profile.initial_tree_base_durations = durations;
        }

        info!(
            seeded_nodes = base_durations.len(),
            "Profiling started"
        );
        true
    }

    pub fn stop_profiling(&mut self) {
        if self.is_running() {
            self.status = ProfilerStatus::Stopped;
            info!(roots = self.roots.len(), "Profiling stopped");
        }
    }

    /// Append one commit to the history of `root_id`. Ignored while stopped.
    pub fn record_commit(
        &mut self,
        root_id: VNodeId,
        changed: BTreeMap<VNodeId, BTreeSet<String>>,
        timings: Vec<Timing>,
    ) {
        if !self.is_running() {
            return;
        }
        let commit_time_micros = self
            .started_at
            .map(|start| start.elapsed().as_micros() as u64)
            .unwrap_or(0);
        debug!(
            root_id,
            commit_time_micros,
            timings = timings.len(),
            changed = changed.len(),
            "Recorded profiling commit"
        );
        self.roots
            .entry(root_id)
            .or_insert_with(|| RootProfile::new(root_id))
            .commits
            .push(CommitProfile {
                commit_time_micros,
                changed,
                timings,
            });
    }

    /// Everything collected in the current or last session.
    pub fn get_profiling_data(&self, renderer_id: u32) -> ProfilingData {
        ProfilingData {
            renderer_id,
            captured_at: Utc::now(),
            status: self.status,
            roots: self.roots.values().cloned().collect(),
        }
    }
}

/// Keys whose values differ between two snapshots, including added and
/// removed keys.
pub fn changed_keys<V: PartialEq>(
    previous: &BTreeMap<String, V>,
    current: &BTreeMap<String, V>,
    out: &mut BTreeSet<String>,
) {
    for (key, value) in current {
        if previous.get(key) != Some(value) {
            out.insert(key.clone());
        }
    }
    for key in previous.keys() {
        if !current.contains_key(key) {
            out.insert(key.clone());
        }
    }
}
