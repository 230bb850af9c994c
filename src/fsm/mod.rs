//! Context provisioning orchestrator.
//!
//! A sans-io state machine driven by [`Notice`]s:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Session (one per document)                                       │
//! │                                                                   │
//! │  Discovering:  manager ─▶ modems ─▶ SIM probes ─▶ identity match  │
//! │                                       │                           │
//! │                                       ▼                           │
//! │                              connection manager                   │
//! │                                       │                           │
//! │  Provisioning: ┌──────────────────────┴───────────────────┐       │
//! │                │ ContextTask(internet)  ContextTask(mms)  │       │
//! │                └──────────────────────┬───────────────────┘       │
//! │                                       ▼                           │
//! │                          Success | PartialSuccess | Failure       │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every request the engine issues through the [`TelephonyPort`] is
//! recorded in a pending table keyed by [`RequestId`].  A notice is acted
//! on only if its request is still pending and its session is still live
//! (generation check), so late or duplicate completions are harmless.
//!
//! A per-session deadline is re-armed whenever the session makes progress.
//! If it fires, the session fails and every pending request is cancelled
//! at the transport.  Each session produces exactly one [`Completion`].

pub mod session;
pub mod task;

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use log::{debug, info, warn};

use crate::app::ports::{ContextProperty, PropertyValue, RequestId, TelephonyPort};
use crate::config::{ContextPolicy, ServiceConfig};
use crate::events::{ConnectionManagerInfo, ContextInfo, ModemInfo, Notice, RpcError, SimInfo};
use crate::settings::ProvisioningSettings;

use session::{ModemProbe, Phase, Session};
use task::{ContextKind, ContextTask, TaskState, property_plan};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Generation-checked handle of a provisioning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId {
    index: usize,
    generation: u32,
}

/// Overall result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    PartialSuccess,
    Failure,
}

impl Outcome {
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::PartialSuccess => "PartialSuccess",
            Self::Failure => "Failure",
        }
    }
}

/// Reported once per session when it finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub session: SessionId,
    pub identity: String,
    /// Modem that was (attempted to be) provisioned; empty if discovery
    /// never matched a SIM.
    pub context_path: String,
    pub outcome: Outcome,
}

/// Fold terminal task states into an outcome.
///
/// `Success` iff at least one task and all succeeded, `Failure` iff none
/// succeeded, `PartialSuccess` otherwise.
pub fn aggregate(states: impl IntoIterator<Item = TaskState>) -> Outcome {
    let (mut ok, mut total) = (0usize, 0usize);
    for state in states {
        total += 1;
        if state == TaskState::Success {
            ok += 1;
        }
    }
    match (ok, total) {
        (_, 0) | (0, _) => Outcome::Failure,
        (ok, total) if ok == total => Outcome::Success,
        _ => Outcome::PartialSuccess,
    }
}

// ---------------------------------------------------------------------------
// Pending requests
// ---------------------------------------------------------------------------

/// What a pending request will tell us when it completes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Awaiting {
    Manager,
    Sim(String),
    ConnectionManager,
    Context(ContextKind),
    AddContext(ContextKind),
    Deactivate(ContextKind),
    Write(ContextKind, ContextProperty),
    Deadline,
}

#[derive(Debug, Clone)]
struct Pending {
    session: SessionId,
    awaiting: Awaiting,
}

type PendingTable = HashMap<RequestId, Pending>;

fn track(pending: &mut PendingTable, request: RequestId, session: SessionId, awaiting: Awaiting) {
    debug!("Request {} -> {:?}", request, awaiting);
    pending.insert(request, Pending { session, awaiting });
}

fn release(pending: &mut PendingTable, port: &mut impl TelephonyPort, request: RequestId) {
    pending.remove(&request);
    port.cancel(request);
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    session: Option<Session>,
}

// ---------------------------------------------------------------------------
// Provisioner
// ---------------------------------------------------------------------------

/// Runs any number of provisioning sessions against one telephony port.
pub struct Provisioner {
    timeout: Duration,
    policy: ContextPolicy,
    slots: Vec<Slot>,
    pending: PendingTable,
    finished: Vec<Completion>,
}

impl Provisioner {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            timeout: config.session_timeout(),
            policy: config.context_policy,
            slots: Vec::new(),
            pending: HashMap::new(),
            finished: Vec::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start provisioning `settings` onto the modem whose SIM reports
    /// `identity`.  Empty settings complete immediately with `Failure`.
    pub fn provision(
        &mut self,
        identity: &str,
        settings: ProvisioningSettings,
        port: &mut impl TelephonyPort,
    ) -> SessionId {
        let empty = settings.is_empty();
        let id = self.allocate(Session::new(identity.to_string(), settings));
        info!("Session {:?} started for identity {}", id, identity);

        if empty {
            warn!("No usable settings in document");
            self.finish(id, Outcome::Failure, port);
            return id;
        }

        let request = port.watch_manager();
        track(&mut self.pending, request, id, Awaiting::Manager);
        self.arm_deadline(id, port);
        id
    }

    /// Cancel a live session.  It completes with `Failure`.  Returns
    /// `false` if the session already finished.
    pub fn cancel(&mut self, id: SessionId, port: &mut impl TelephonyPort) -> bool {
        if !self.is_live(id) {
            return false;
        }
        info!("Session {:?} cancelled", id);
        self.finish(id, Outcome::Failure, port);
        true
    }

    /// Cancel every live session.
    pub fn cancel_all(&mut self, port: &mut impl TelephonyPort) {
        for id in self.live_sessions() {
            self.cancel(id, port);
        }
    }

    /// Drain sessions finished since the last call.
    pub fn take_completions(&mut self) -> Vec<Completion> {
        core::mem::take(&mut self.finished)
    }

    /// No live session and nothing pending.
    pub fn is_idle(&self) -> bool {
        self.slots.iter().all(|s| s.session.is_none()) && self.pending.is_empty()
    }

    pub fn is_live(&self, id: SessionId) -> bool {
        self.slots
            .get(id.index)
            .is_some_and(|s| s.generation == id.generation && s.session.is_some())
    }

    /// State of the `kind` task of a live session.
    pub fn task_state(&self, id: SessionId, kind: ContextKind) -> Option<TaskState> {
        self.session(id)?
            .tasks
            .iter()
            .find(|t| t.kind == kind)
            .map(|t| t.state)
    }

    // ── Event dispatch ────────────────────────────────────────

    /// Feed one notice from the telephony gateway.
    pub fn handle(&mut self, notice: Notice, port: &mut impl TelephonyPort) {
        if let Notice::ContextActiveChanged { context, active } = notice {
            self.on_active_changed(&context, active, port);
            return;
        }
        let Some(request) = notice.request() else {
            return;
        };
        let Some(Pending { session: id, awaiting }) = self.pending.remove(&request) else {
            debug!("Ignoring notice for stale request {}", request);
            return;
        };
        if !self.is_live(id) {
            debug!("Ignoring notice {} for finished session {:?}", request, id);
            return;
        }

        match (awaiting, notice) {
            (Awaiting::Deadline, Notice::DeadlineElapsed { .. }) => {
                warn!("Session {:?} timed out", id);
                if let Some(session) = self.session_mut(id) {
                    session.deadline = None;
                }
                self.finish(id, Outcome::Failure, port);
                return;
            }
            (Awaiting::Manager, Notice::Manager { result, .. }) => {
                self.on_manager(id, result, port);
            }
            (Awaiting::Sim(modem), Notice::Sim { result, .. }) => {
                self.on_sim(id, &modem, result, port);
            }
            (Awaiting::ConnectionManager, Notice::ConnectionManager { result, .. }) => {
                self.on_connection_manager(id, result, port);
            }
            (Awaiting::AddContext(kind), Notice::ContextAdded { result, .. }) => {
                self.on_context_added(id, kind, result, port);
            }
            (Awaiting::Context(kind), Notice::Context { result, .. }) => {
                self.on_context(id, kind, result, port);
            }
            (Awaiting::Deactivate(kind), Notice::RequestDone { result, .. }) => {
                self.on_deactivated(id, kind, result, port);
            }
            (Awaiting::Write(kind, property), Notice::RequestDone { request, result }) => {
                self.on_written(id, kind, property, request, result);
            }
            (awaiting, notice) => {
                warn!("Unexpected {:?} while awaiting {:?}", notice, awaiting);
                return;
            }
        }

        self.check_done(id, port);
    }

    // ── Discovery ─────────────────────────────────────────────

    fn on_manager(
        &mut self,
        id: SessionId,
        result: Result<Vec<ModemInfo>, RpcError>,
        port: &mut impl TelephonyPort,
    ) {
        let modems = match result {
            Ok(modems) => modems,
            Err(e) => {
                warn!("Manager unavailable: {}", e);
                self.finish(id, Outcome::Failure, port);
                return;
            }
        };
        let Some((session, pending)) = self.parts(id) else {
            return;
        };
        for modem in modems.iter().filter(|m| m.has_sim_manager()) {
            let request = port.watch_sim(&modem.path);
            track(pending, request, id, Awaiting::Sim(modem.path.clone()));
            session.probes.push(ModemProbe {
                path: modem.path.clone(),
                has_gprs: modem.has_connection_manager(),
                request: Some(request),
            });
        }
        if session.probes.is_empty() {
            warn!("No modem with a SIM manager ({} modems)", modems.len());
            self.finish(id, Outcome::Failure, port);
        }
    }

    fn on_sim(
        &mut self,
        id: SessionId,
        modem: &str,
        result: Result<SimInfo, RpcError>,
        port: &mut impl TelephonyPort,
    ) {
        let Some((session, pending)) = self.parts(id) else {
            return;
        };
        if let Some(probe) = session.probe_mut(modem) {
            probe.request = None;
        }

        let matched = match result {
            Ok(sim) if sim.present && sim.identity.as_deref() == Some(session.identity.as_str()) => {
                true
            }
            Ok(sim) => {
                debug!("Skipping modem {} (present={})", modem, sim.present);
                false
            }
            Err(e) => {
                warn!("SIM of {} unavailable: {}", modem, e);
                false
            }
        };

        if !matched {
            if session.probes_exhausted() {
                warn!("No SIM matches the session identity");
                self.finish(id, Outcome::Failure, port);
            }
            return;
        }

        info!("SIM identity matched on {}", modem);
        session.modem = Some(modem.to_string());
        for probe in &mut session.probes {
            if let Some(other) = probe.request.take() {
                release(pending, port, other);
            }
        }

        let has_gprs = session.probes.iter().any(|p| p.path == modem && p.has_gprs);
        if !has_gprs {
            warn!("Modem {} has no packet data support", modem);
            self.finish(id, Outcome::Failure, port);
            return;
        }
        let request = port.watch_connection_manager(modem);
        track(pending, request, id, Awaiting::ConnectionManager);
    }

    fn on_connection_manager(
        &mut self,
        id: SessionId,
        result: Result<ConnectionManagerInfo, RpcError>,
        port: &mut impl TelephonyPort,
    ) {
        let info = match result {
            Ok(info) => info,
            Err(e) => {
                warn!("Connection manager unavailable: {}", e);
                self.finish(id, Outcome::Failure, port);
                return;
            }
        };
        let policy = self.policy;
        let Some((session, pending)) = self.parts(id) else {
            return;
        };
        let modem = session.context_path();
        debug!(
            "Connection manager on {}: attached={} contexts={}",
            modem,
            info.attached,
            info.contexts.len()
        );

        session.phase = Phase::Provisioning;
        for kind in ContextKind::ALL {
            if property_plan(&session.settings, kind).is_empty() {
                continue;
            }
            if let Some(existing) = info.context_of(kind) {
                let mut task = ContextTask::new(kind, Some(existing.path.clone()));
                let request = port.watch_context(&existing.path);
                task.watch = Some(request);
                track(pending, request, id, Awaiting::Context(kind));
                session.tasks.push(task);
                continue;
            }
            match policy {
                ContextPolicy::CreateMissing => {
                    info!("Creating {} context on {}", kind, modem);
                    let request = port.add_context(&modem, kind.as_str());
                    track(pending, request, id, Awaiting::AddContext(kind));
                    session.tasks.push(ContextTask::new(kind, None));
                }
                ContextPolicy::UsePreProvisioned => {
                    warn!("No {} context on {}, skipping", kind, modem);
                }
            }
        }

        if session.tasks.is_empty() {
            warn!("No context to provision on {}", modem);
            self.finish(id, Outcome::Failure, port);
        }
    }

    // ── Per-context tasks ─────────────────────────────────────

    fn on_context_added(
        &mut self,
        id: SessionId,
        kind: ContextKind,
        result: Result<String, RpcError>,
        port: &mut impl TelephonyPort,
    ) {
        let Some((session, pending)) = self.parts(id) else {
            return;
        };
        let Some(task) = session.task_mut(kind) else {
            return;
        };
        match result {
            Ok(path) => {
                info!("Created {} context {}", kind, path);
                let request = port.watch_context(&path);
                task.context = Some(path);
                task.watch = Some(request);
                track(pending, request, id, Awaiting::Context(kind));
            }
            Err(e) => {
                warn!("Creating {} context failed: {}", kind, e);
                task.transition(TaskState::Error);
            }
        }
    }

    fn on_context(
        &mut self,
        id: SessionId,
        kind: ContextKind,
        result: Result<ContextInfo, RpcError>,
        port: &mut impl TelephonyPort,
    ) {
        let Some((session, pending)) = self.parts(id) else {
            return;
        };
        let settings = &session.settings;
        let Some(task) = session.tasks.iter_mut().find(|t| t.kind == kind) else {
            return;
        };
        let Some(context) = task.context.clone() else {
            return;
        };

        let info = match result {
            Ok(info) => info,
            Err(e) => {
                warn!("{} context {} never became valid: {}", kind, context, e);
                if let Some(watch) = task.watch.take() {
                    release(pending, port, watch);
                }
                task.transition(TaskState::Error);
                return;
            }
        };

        match (task.state, info.active) {
            (TaskState::Initializing, true) => {
                task.transition(TaskState::Deactivating);
                let request =
                    port.set_property(&context, ContextProperty::Active, PropertyValue::Bool(false));
                track(pending, request, id, Awaiting::Deactivate(kind));
            }
            (TaskState::Initializing | TaskState::Deactivating, false) => {
                start_provisioning(task, settings, id, pending, port);
            }
            (TaskState::Deactivating, true) => {
                debug!("{} context {} still active, waiting", kind, context);
            }
            _ => {}
        }
    }

    fn on_deactivated(
        &mut self,
        id: SessionId,
        kind: ContextKind,
        result: Result<(), RpcError>,
        port: &mut impl TelephonyPort,
    ) {
        let Some((session, pending)) = self.parts(id) else {
            return;
        };
        let Some(task) = session.task_mut(kind) else {
            return;
        };
        if task.state != TaskState::Deactivating {
            return;
        }
        let Some(context) = task.context.clone() else {
            return;
        };
        if let Some(watch) = task.watch.take() {
            release(pending, port, watch);
        }
        match result {
            Ok(()) => {
                // Revalidate; an `Active` change may still beat the reply.
                let request = port.watch_context(&context);
                task.watch = Some(request);
                track(pending, request, id, Awaiting::Context(kind));
            }
            Err(e) => {
                warn!("Deactivating {} context failed: {}", kind, e);
                task.transition(TaskState::Error);
            }
        }
    }

    fn on_written(
        &mut self,
        id: SessionId,
        kind: ContextKind,
        property: ContextProperty,
        request: RequestId,
        result: Result<(), RpcError>,
    ) {
        let Some(session) = self.session_mut(id) else {
            return;
        };
        let Some(task) = session.task_mut(kind) else {
            return;
        };
        if let Err(e) = &result {
            warn!("Writing {} on {} context failed: {}", property.as_str(), kind, e);
        }
        task.complete_write(request, result.is_ok());
    }

    fn on_active_changed(&mut self, context: &str, active: bool, port: &mut impl TelephonyPort) {
        if active {
            return;
        }
        let found = self.slots.iter().enumerate().find_map(|(index, slot)| {
            let session = slot.session.as_ref()?;
            let task = session.tasks.iter().find(|t| {
                t.state == TaskState::Deactivating && t.context.as_deref() == Some(context)
            })?;
            Some((
                SessionId { index, generation: slot.generation },
                task.kind,
            ))
        });
        let Some((id, kind)) = found else {
            debug!("Ignoring Active change on {}", context);
            return;
        };
        if let Some((session, pending)) = self.parts(id) {
            let settings = &session.settings;
            if let Some(task) = session.tasks.iter_mut().find(|t| t.kind == kind) {
                start_provisioning(task, settings, id, pending, port);
            }
        }
        self.check_done(id, port);
    }

    // ── Completion ────────────────────────────────────────────

    fn check_done(&mut self, id: SessionId, port: &mut impl TelephonyPort) {
        let Some(session) = self.session(id) else {
            return;
        };
        if session.is_done() {
            let outcome = aggregate(session.task_states());
            self.finish(id, outcome, port);
        } else {
            self.arm_deadline(id, port);
        }
    }

    fn arm_deadline(&mut self, id: SessionId, port: &mut impl TelephonyPort) {
        let timeout = self.timeout;
        let Some((session, pending)) = self.parts(id) else {
            return;
        };
        if let Some(old) = session.deadline.take() {
            release(pending, port, old);
        }
        let request = port.schedule_deadline(timeout);
        session.deadline = Some(request);
        track(pending, request, id, Awaiting::Deadline);
    }

    /// Retire the session, cancel everything it still has in flight and
    /// record its completion.
    fn finish(&mut self, id: SessionId, outcome: Outcome, port: &mut impl TelephonyPort) {
        let Some(slot) = self.slots.get_mut(id.index) else {
            return;
        };
        if slot.generation != id.generation {
            return;
        }
        let Some(session) = slot.session.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);

        let mut doomed: BTreeSet<RequestId> = self
            .pending
            .iter()
            .filter(|(_, p)| p.session == id)
            .map(|(r, _)| *r)
            .collect();
        doomed.extend(session.tasks.iter().filter_map(|t| t.watch));
        for request in doomed {
            release(&mut self.pending, port, request);
        }

        for task in &session.tasks {
            debug!("Task {} finished in {}", task.kind, task.state.name());
        }
        let context_path = session.context_path();
        info!(
            "Session {:?} finished: {} (identity={}, path='{}')",
            id,
            outcome.name(),
            session.identity,
            context_path
        );
        self.finished.push(Completion {
            session: id,
            identity: session.identity,
            context_path,
            outcome,
        });
    }

    // ── Internal ──────────────────────────────────────────────

    fn allocate(&mut self, session: Session) -> SessionId {
        if let Some(index) = self.slots.iter().position(|s| s.session.is_none()) {
            let slot = &mut self.slots[index];
            slot.session = Some(session);
            return SessionId { index, generation: slot.generation };
        }
        self.slots.push(Slot { generation: 0, session: Some(session) });
        SessionId { index: self.slots.len() - 1, generation: 0 }
    }

    fn live_sessions(&self) -> Vec<SessionId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.session.is_some())
            .map(|(index, s)| SessionId { index, generation: s.generation })
            .collect()
    }

    fn session(&self, id: SessionId) -> Option<&Session> {
        self.slots
            .get(id.index)
            .filter(|s| s.generation == id.generation)?
            .session
            .as_ref()
    }

    fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.slots
            .get_mut(id.index)
            .filter(|s| s.generation == id.generation)?
            .session
            .as_mut()
    }

    /// Split borrow of a live session and the pending table.
    fn parts(&mut self, id: SessionId) -> Option<(&mut Session, &mut PendingTable)> {
        let session = self
            .slots
            .get_mut(id.index)
            .filter(|s| s.generation == id.generation)?
            .session
            .as_mut()?;
        Some((session, &mut self.pending))
    }
}

/// Issue every property write for `task` at once.
fn start_provisioning(
    task: &mut ContextTask,
    settings: &ProvisioningSettings,
    id: SessionId,
    pending: &mut PendingTable,
    port: &mut impl TelephonyPort,
) {
    if let Some(watch) = task.watch.take() {
        release(pending, port, watch);
    }
    let Some(context) = task.context.clone() else {
        return;
    };
    task.transition(TaskState::Provisioning);
    for (property, value) in property_plan(settings, task.kind) {
        let request = port.set_property(&context, property, value);
        task.outstanding.push(request);
        track(pending, request, id, Awaiting::Write(task.kind, property));
    }
    if task.outstanding.is_empty() {
        task.transition(TaskState::Success);
    }
}
