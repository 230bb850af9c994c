//! Telephony notices.
//!
//! Everything the telephony gateway reports back to the orchestrator is a
//! [`Notice`].  Every RPC, watch and deadline the orchestrator starts is
//! identified by a [`RequestId`]; its completion comes back tagged with
//! the same id, in whatever order the transport delivers it.
//!
//! ```text
//! ┌──────────────┐  watch_* / set_property  ┌──────────────┐
//! │              │─────────────────────────▶│  Telephony   │
//! │  Provisioner │                          │   gateway    │
//! │ (event loop) │◀─────────────────────────│  (adapter)   │
//! └──────────────┘   Notice { request, .. } └──────────────┘
//! ```
//!
//! A notice whose request was cancelled, or whose session already
//! finished, is dropped by the orchestrator without touching any state.

use crate::app::ports::RequestId;
use crate::fsm::task::ContextKind;

/// D-Bus interface a modem must expose for SIM discovery.
pub const SIM_MANAGER_INTERFACE: &str = "org.ofono.SimManager";
/// D-Bus interface a modem must expose for packet data (GPRS).
pub const CONNECTION_MANAGER_INTERFACE: &str = "org.ofono.ConnectionManager";

/// A failed telephony call, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    /// Error name, e.g. `org.ofono.Error.InProgress`.
    pub name: String,
    pub message: String,
}

impl RpcError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl core::fmt::Display for RpcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

/// One modem object as listed by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModemInfo {
    pub path: String,
    /// Interfaces the modem currently exposes.
    pub interfaces: Vec<String>,
}

impl ModemInfo {
    pub fn has_interface(&self, name: &str) -> bool {
        self.interfaces.iter().any(|i| i == name)
    }

    pub fn has_sim_manager(&self) -> bool {
        self.has_interface(SIM_MANAGER_INTERFACE)
    }

    pub fn has_connection_manager(&self) -> bool {
        self.has_interface(CONNECTION_MANAGER_INTERFACE)
    }
}

/// SIM manager state once the object is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimInfo {
    pub present: bool,
    /// Subscriber identity (IMSI), when the SIM has reported one.
    pub identity: Option<String>,
}

/// One existing data context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSummary {
    pub path: String,
    /// `None` for context types we never provision (`wap`, `ims`...).
    pub kind: Option<ContextKind>,
    pub active: bool,
}

/// Connection manager state once the object is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionManagerInfo {
    pub attached: bool,
    pub contexts: Vec<ContextSummary>,
}

impl ConnectionManagerInfo {
    /// First context of the given type.
    pub fn context_of(&self, kind: ContextKind) -> Option<&ContextSummary> {
        self.contexts.iter().find(|c| c.kind == Some(kind))
    }
}

/// Connection context state once the object is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextInfo {
    pub active: bool,
}

/// Completion or notification delivered to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The manager became valid and listed its modems.
    Manager {
        request: RequestId,
        result: Result<Vec<ModemInfo>, RpcError>,
    },
    /// A SIM manager became valid (or never did).
    Sim {
        request: RequestId,
        result: Result<SimInfo, RpcError>,
    },
    /// A connection manager became valid (or never did).
    ConnectionManager {
        request: RequestId,
        result: Result<ConnectionManagerInfo, RpcError>,
    },
    /// A connection context became valid (or never did).
    Context {
        request: RequestId,
        result: Result<ContextInfo, RpcError>,
    },
    /// `AddContext` returned the new context's path.
    ContextAdded {
        request: RequestId,
        result: Result<String, RpcError>,
    },
    /// A property write finished.
    RequestDone {
        request: RequestId,
        result: Result<(), RpcError>,
    },
    /// A deadline scheduled with `schedule_deadline` elapsed.
    DeadlineElapsed { request: RequestId },
    /// Unsolicited `Active` property change on a context.
    ContextActiveChanged { context: String, active: bool },
}

impl Notice {
    /// The request this notice completes, if it completes one.
    pub fn request(&self) -> Option<RequestId> {
        match self {
            Self::Manager { request, .. }
            | Self::Sim { request, .. }
            | Self::ConnectionManager { request, .. }
            | Self::Context { request, .. }
            | Self::ContextAdded { request, .. }
            | Self::RequestDone { request, .. }
            | Self::DeadlineElapsed { request } => Some(*request),
            Self::ContextActiveChanged { .. } => None,
        }
    }
}
