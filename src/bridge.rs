//! Bridge
//!
//! The single object a host attaches to. It routes runtime notifications
//! through the commit processor, encodes the resulting commits, and either
//! hands them to the host hook or holds them until the host signals that the
//! inspector connection is ready.

use crate::commit;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::filter::FilterRule;
use crate::profiler::{ProfilerStatus, ProfilingData};
use crate::protocol::{encode_commit, Commit, EncodedCommit};
use crate::registry::VNodeEntry;
use crate::selection::{path_for, BestMatch, SelectionPath};
use crate::state::BridgeState;
use crate::tree::VNode;
use crate::types::{NodeHandle, VNodeId};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, error, info, trace, warn};

/// What the bridge pushes to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum HookEvent {
    /// One encoded commit
    Operations(EncodedCommit),
    /// Re-resolved tracked selection, pushed after each commit
    BestMatch(Option<BestMatch>),
}

/// Host side of the bridge. Framing and transport belong to the host.
pub trait InspectorHook {
    fn emit(&mut self, event: HookEvent);
}

/// Hook that keeps every event in a shared log
#[derive(Debug, Clone, Default)]
pub struct RecordingHook {
    events: Rc<RefCell<Vec<HookEvent>>>,
}

impl RecordingHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<HookEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Payloads of the recorded `Operations` events, in order.
    pub fn messages(&self) -> Vec<Vec<u32>> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                HookEvent::Operations(message) => Some(message.payload.clone()),
                HookEvent::BestMatch(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl InspectorHook for RecordingHook {
    fn emit(&mut self, event: HookEvent) {
        self.events.borrow_mut().push(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No inspector yet; commits are queued
    Waiting,
    Connected,
    /// A previous inspector went away; the next connect starts from scratch
    Disconnected,
}

pub struct Bridge {
    state: BridgeState,
    hook: Option<Box<dyn InspectorHook>>,
    connection: ConnectionState,
    pending: VecDeque<EncodedCommit>,
    warn_after: usize,
    profile_on_attach: bool,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("renderer_id", &self.state.renderer_id)
            .field("attached", &self.hook.is_some())
            .field("connection", &self.connection)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    pub fn new() -> Self {
        Self {
            state: BridgeState::default(),
            hook: None,
            connection: ConnectionState::Waiting,
            pending: VecDeque::new(),
            warn_after: crate::config::DEFAULT_QUEUE_WARN_AFTER,
            profile_on_attach: false,
        }
    }

    /// Build a bridge with initial filters and profiling options from `config`.
    pub fn from_config(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let mut bridge = Self::new();
        bridge.state = BridgeState::new(config.renderer_id);
        bridge.state.profiler =
            crate::profiler::Profiler::new(config.profiling.record_change_descriptions);
        bridge.state.filters.apply_filters(config.filters.clone())?;
        bridge.warn_after = config.queue.warn_after;
        bridge.profile_on_attach = config.profiling.start_on_attach;
        Ok(bridge)
    }

    /// Register the host hook under `renderer_id`.
    pub fn attach(&mut self, renderer_id: u32, hook: Box<dyn InspectorHook>) {
        self.state.renderer_id = renderer_id;
        self.hook = Some(hook);
        info!(renderer_id, "Host attached");
        if self.profile_on_attach {
            self.start_profiling();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.hook.is_some()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Host readiness signal.
    ///
    /// The first connect flushes the queue in arrival order, or describes the
    /// current tree if nothing is queued. A connect after a disconnect always
    /// starts the new inspector from a full initial tree. Repeated connects
    /// are no-ops. Returns the number of messages delivered.
    pub fn connect(&mut self) -> Result<usize, BridgeError> {
        if self.hook.is_none() {
            return Err(BridgeError::NotAttached);
        }
        let delivered = match self.connection {
            ConnectionState::Connected => {
                debug!("Already connected");
                return Ok(0);
            }
            ConnectionState::Waiting if !self.pending.is_empty() => {
                self.connection = ConnectionState::Connected;
                self.flush_pending()
            }
            ConnectionState::Waiting | ConnectionState::Disconnected => {
                if !self.pending.is_empty() {
                    debug!(
                        dropped = self.pending.len(),
                        "Initial tree replaces queued deltas"
                    );
                    self.pending.clear();
                }
                self.connection = ConnectionState::Connected;
                self.send_initial_trees()
            }
        };
        info!(delivered, "Inspector connected");
        self.push_best_match();
        Ok(delivered)
    }

    /// The inspector went away; its string table and tree are gone with it.
    pub fn disconnect(&mut self) {
        if self.connection != ConnectionState::Connected {
            return;
        }
        self.connection = ConnectionState::Disconnected;
        self.state.strings.reset();
        info!("Inspector disconnected");
    }

    fn flush_pending(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(message) = self.pending.pop_front() {
            self.deliver(message);
            delivered += 1;
        }
        info!(delivered, "Flushed pending commits");
        delivered
    }

    fn send_initial_trees(&mut self) -> usize {
        self.state.strings.reset();
        self.state.shadow.clear_emitted_durations();
        self.state.processor.clear_pending_unmounts();
        let roots = self.state.roots.clone();
        for root_id in &roots {
            let commit = commit::initial_tree_commit(&mut self.state, *root_id);
            self.dispatch(commit);
        }
        roots.len()
    }

    fn deliver(&mut self, message: EncodedCommit) {
        match self.hook.as_mut() {
            Some(hook) => hook.emit(HookEvent::Operations(message)),
            None => self.pending.push_back(message),
        }
    }

    /// Encode `commit` and send or queue it.
    fn dispatch(&mut self, commit: Commit) {
        if commit.is_empty() {
            trace!(root_id = commit.root_id, "Skipping empty commit");
            return;
        }
        let payload = encode_commit(self.state.renderer_id, &commit, &mut self.state.strings);
        let message = EncodedCommit { commit, payload };
        if self.is_connected() {
            self.deliver(message);
            return;
        }
        self.pending.push_back(message);
        if self.pending.len() == self.warn_after {
            warn!(
                pending = self.pending.len(),
                "Pending commit queue is growing; is an inspector going to connect?"
            );
        }
    }

    fn push_best_match(&mut self) {
        if self.state.selection.tracked_path().is_none() {
            return;
        }
        let best = self.state.selection.refresh(
            &self.state.roots,
            &self.state.shadow,
            &self.state.registry,
        );
        if self.is_connected() {
            if let Some(hook) = self.hook.as_mut() {
                hook.emit(HookEvent::BestMatch(best));
            }
        }
    }

    /// Runtime notification: `root` finished committing.
    pub fn on_commit_root(&mut self, root: &VNode) -> Result<(), BridgeError> {
        let commit = commit::on_commit_root(&mut self.state, root).map_err(|e| {
            error!(error = %e, handle = %root.handle, "Dropping commit notification");
            e
        })?;
        self.dispatch(commit);
        self.push_best_match();
        Ok(())
    }

    /// Runtime notification: the node behind `handle` unmounted.
    pub fn on_commit_unmount(&mut self, handle: NodeHandle) -> Result<(), BridgeError> {
        let finished = commit::on_commit_unmount(&mut self.state, handle).map_err(|e| {
            error!(error = %e, %handle, "Dropping unmount notification");
            e
        })?;
        if let Some(commit) = finished {
            self.dispatch(commit);
            self.push_best_match();
        }
        Ok(())
    }

    /// Replace the component filters and re-describe every root under them.
    pub fn apply_filters(&mut self, rules: Vec<FilterRule>) -> Result<(), BridgeError> {
        self.state.filters.apply_filters(rules)?;
        let roots = self.state.roots.clone();
        for root_id in roots {
            let commit = commit::refilter_root(&mut self.state, root_id);
            self.dispatch(commit);
        }
        self.push_best_match();
        Ok(())
    }

    pub fn filters(&self) -> &[FilterRule] {
        self.state.filters.raw()
    }

    pub fn set_tracked_path(&mut self, path: Option<SelectionPath>) {
        self.state.selection.set_tracked_path(path);
        self.push_best_match();
    }

    pub fn get_best_match(&self) -> Option<BestMatch> {
        self.state.selection.get_best_match(
            &self.state.roots,
            &self.state.shadow,
            &self.state.registry,
        )
    }

    /// Selection path that leads to visible node `id`.
    pub fn path_for(&self, id: VNodeId) -> Option<SelectionPath> {
        path_for(
            id,
            &self.state.roots,
            &self.state.shadow,
            &self.state.registry,
        )
    }

    /// Visible owners of `id`, nearest first.
    pub fn owners_of(&self, id: VNodeId) -> Vec<VNodeId> {
        self.state.registry.owners_of(id)
    }

    /// Registry record for `id`; `None` once it unmounted.
    pub fn inspect(&self, id: VNodeId) -> Option<&VNodeEntry> {
        self.state.registry.resolve(id)
    }

    /// Returns `false` when a session is already running.
    pub fn start_profiling(&mut self) -> bool {
        let started = self
            .state
            .profiler
            .start_profiling(&self.state.registry, self.state.shadow.base_durations());
        if started {
            // the inspector needs base durations for every node again
            self.state.shadow.clear_emitted_durations();
        }
        started
    }

    pub fn stop_profiling(&mut self) {
        self.state.profiler.stop_profiling();
    }

    pub fn profiler_status(&self) -> ProfilerStatus {
        self.state.profiler.status()
    }

    pub fn get_profiling_data(&self) -> ProfilingData {
        self.state.profiler.get_profiling_data(self.state.renderer_id)
    }

    pub fn roots(&self) -> &[VNodeId] {
        &self.state.roots
    }

    pub fn renderer_id(&self) -> u32 {
        self.state.renderer_id
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn state(&self) -> &BridgeState {
        &self.state
    }
}

/// Shared handle given to both the runtime and the host.
///
/// Calls that arrive while another call is still inside the bridge, such as
/// a render triggered from a hook callback, are logged and dropped.
#[derive(Debug, Clone)]
pub struct BridgeHandle(Rc<RefCell<Bridge>>);

impl BridgeHandle {
    pub fn new(bridge: Bridge) -> Self {
        Self(Rc::new(RefCell::new(bridge)))
    }

    fn with<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Bridge) -> Result<T, BridgeError>,
    ) -> Result<T, BridgeError> {
        match self.0.try_borrow_mut() {
            Ok(mut bridge) => f(&mut *bridge),
            Err(_) => {
                error!(operation, "Re-entrant bridge call dropped");
                Err(BridgeError::Reentrant)
            }
        }
    }

    /// Run `f` against a shared borrow of the bridge.
    pub fn read<T>(&self, f: impl FnOnce(&Bridge) -> T) -> Result<T, BridgeError> {
        self.0
            .try_borrow()
            .map(|bridge| f(&*bridge))
            .map_err(|_| BridgeError::Reentrant)
    }

    pub fn attach(&self, renderer_id: u32, hook: Box<dyn InspectorHook>) -> Result<(), BridgeError> {
        self.with("attach", |bridge| {
            bridge.attach(renderer_id, hook);
            Ok(())
        })
    }

    pub fn connect(&self) -> Result<usize, BridgeError> {
        self.with("connect", Bridge::connect)
    }

    pub fn disconnect(&self) -> Result<(), BridgeError> {
        self.with("disconnect", |bridge| {
            bridge.disconnect();
            Ok(())
        })
    }

    pub fn on_commit_root(&self, root: &VNode) -> Result<(), BridgeError> {
        self.with("on_commit_root", |bridge| bridge.on_commit_root(root))
    }

    pub fn on_commit_unmount(&self, handle: NodeHandle) -> Result<(), BridgeError> {
        self.with("on_commit_unmount", |bridge| bridge.on_commit_unmount(handle))
    }

    pub fn apply_filters(&self, rules: Vec<FilterRule>) -> Result<(), BridgeError> {
        self.with("apply_filters", |bridge| bridge.apply_filters(rules))
    }

    pub fn set_tracked_path(&self, path: Option<SelectionPath>) -> Result<(), BridgeError> {
        self.with("set_tracked_path", |bridge| {
            bridge.set_tracked_path(path);
            Ok(())
        })
    }

    pub fn start_profiling(&self) -> Result<bool, BridgeError> {
        self.with("start_profiling", |bridge| Ok(bridge.start_profiling()))
    }

    pub fn stop_profiling(&self) -> Result<(), BridgeError> {
        self.with("stop_profiling", |bridge| {
            bridge.stop_profiling();
            Ok(())
        })
    }

    pub fn get_best_match(&self) -> Result<Option<BestMatch>, BridgeError> {
        self.read(Bridge::get_best_match)
    }

    pub fn get_profiling_data(&self) -> Result<ProfilingData, BridgeError> {
        self.read(Bridge::get_profiling_data)
    }
}
