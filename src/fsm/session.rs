//! Provisioning session state.
//!
//! One session per decoded document.  It owns its tasks outright; the
//! orchestrator addresses it by a generation-checked
//! [`SessionId`](super::SessionId), so a late completion can never reach a
//! session that has already finished.

use crate::app::ports::RequestId;
use crate::settings::ProvisioningSettings;

use super::task::{ContextKind, ContextTask, TaskState};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Looking for the modem whose SIM carries the session identity.
    Discovering,
    /// Context tasks created; waiting for them to finish.
    Provisioning,
}

/// SIM probe of one candidate modem.
#[derive(Debug, Clone)]
pub struct ModemProbe {
    pub path: String,
    /// The modem exposes a connection manager (packet data capable).
    pub has_gprs: bool,
    /// Pending SIM watch; `None` once answered or cancelled.
    pub request: Option<RequestId>,
}

#[derive(Debug)]
pub struct Session {
    pub identity: String,
    pub settings: ProvisioningSettings,
    /// Path of the modem whose SIM matched, once known.
    pub modem: Option<String>,
    pub phase: Phase,
    pub probes: Vec<ModemProbe>,
    pub tasks: Vec<ContextTask>,
    /// Current deadline timer.
    pub deadline: Option<RequestId>,
}

impl Session {
    pub fn new(identity: String, settings: ProvisioningSettings) -> Self {
        Self {
            identity,
            settings,
            modem: None,
            phase: Phase::Discovering,
            probes: Vec::new(),
            tasks: Vec::new(),
            deadline: None,
        }
    }

    pub fn task_mut(&mut self, kind: ContextKind) -> Option<&mut ContextTask> {
        self.tasks.iter_mut().find(|t| t.kind == kind)
    }

    pub fn probe_mut(&mut self, path: &str) -> Option<&mut ModemProbe> {
        self.probes.iter_mut().find(|p| p.path == path)
    }

    /// Every SIM probe has answered without a match.
    pub fn probes_exhausted(&self) -> bool {
        self.modem.is_none() && self.probes.iter().all(|p| p.request.is_none())
    }

    /// Tasks exist and all of them reached a terminal state.
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Provisioning
            && !self.tasks.is_empty()
            && self.tasks.iter().all(ContextTask::is_terminal)
    }

    pub fn task_states(&self) -> impl Iterator<Item = TaskState> + '_ {
        self.tasks.iter().map(|t| t.state)
    }

    /// The opaque path reported with the outcome; empty until a SIM matched.
    pub fn context_path(&self) -> String {
        self.modem.clone().unwrap_or_default()
    }
}
