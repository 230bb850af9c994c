//! Per-context provisioning task.
//!
//! ```text
//!                      active                   inactive
//!  Initializing ─────────────────▶ Deactivating ─────────▶ Provisioning
//!       │  inactive                                           │
//!       └────────────────────────────────────────────────────▶│
//!       │                                                     ├─ all writes ok ─▶ Success
//!       └─ invalid / deactivate failed ─▶ Error ◀─ any failed ┘
//! ```
//!
//! A task only records what it is waiting for; the [`Provisioner`](super::Provisioner)
//! decides transitions and issues the requests.

use log::info;
use serde::Serialize;

use crate::app::ports::{ContextProperty, PropertyValue, RequestId};
use crate::settings::ProvisioningSettings;

// ---------------------------------------------------------------------------
// Context kind
// ---------------------------------------------------------------------------

/// Type of data context a task provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    Internet,
    Mms,
}

impl ContextKind {
    /// Provisioning order within a session.
    pub const ALL: [ContextKind; 2] = [ContextKind::Internet, ContextKind::Mms];

    /// The context `Type` property value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Internet => "internet",
            Self::Mms => "mms",
        }
    }

    pub fn from_type(value: &str) -> Option<Self> {
        match value {
            "internet" => Some(Self::Internet),
            "mms" => Some(Self::Mms),
            _ => None,
        }
    }
}

impl core::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Task state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Waiting for the context object to become valid (or to be created).
    Initializing,
    /// `Active=false` written; waiting for the flag to clear.
    Deactivating,
    /// Property writes in flight.
    Provisioning,
    Success,
    Error,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::Deactivating => "Deactivating",
            Self::Provisioning => "Provisioning",
            Self::Success => "Success",
            Self::Error => "Error",
        }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Provisioning of one data context, owned by its session.
#[derive(Debug, Clone)]
pub struct ContextTask {
    pub kind: ContextKind,
    /// Context object path, resolved lazily when the context is created.
    pub context: Option<String>,
    pub state: TaskState,
    /// Property writes not yet completed.
    pub outstanding: Vec<RequestId>,
    /// Whether any completed write reported an error.
    pub failed: bool,
    /// Validity watch on the context; also carries `Active` changes.
    pub watch: Option<RequestId>,
}

impl ContextTask {
    pub fn new(kind: ContextKind, context: Option<String>) -> Self {
        Self {
            kind,
            context,
            state: TaskState::Initializing,
            outstanding: Vec::new(),
            failed: false,
            watch: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Move to `next`.  Terminal states are final.
    pub fn transition(&mut self, next: TaskState) {
        if self.state == next || self.state.is_terminal() {
            return;
        }
        info!(
            "FSM transition [{}]: {} -> {}",
            self.kind,
            self.state.name(),
            next.name()
        );
        self.state = next;
    }

    /// Account for one finished write.  Returns `false` for a request
    /// this task is not waiting on.
    pub fn complete_write(&mut self, request: RequestId, ok: bool) -> bool {
        let Some(pos) = self.outstanding.iter().position(|r| *r == request) else {
            return false;
        };
        self.outstanding.swap_remove(pos);
        if !ok {
            self.failed = true;
        }
        if self.outstanding.is_empty() && self.state == TaskState::Provisioning {
            let next = if self.failed {
                TaskState::Error
            } else {
                TaskState::Success
            };
            self.transition(next);
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Property plan
// ---------------------------------------------------------------------------

/// Every property write for a context of `kind`, in issue order.
///
/// Absent values are written as empty strings so credentials or proxies
/// left over from earlier provisioning are cleared.  Returns an empty
/// plan when `settings` carries nothing for `kind`.
pub fn property_plan(
    settings: &ProvisioningSettings,
    kind: ContextKind,
) -> Vec<(ContextProperty, PropertyValue)> {
    fn s(value: &str) -> PropertyValue {
        PropertyValue::Str(value.to_string())
    }
    fn opt(value: Option<&str>) -> PropertyValue {
        s(value.unwrap_or_default())
    }

    match kind {
        ContextKind::Internet => {
            let Some(net) = settings.internet.as_ref() else {
                return Vec::new();
            };
            vec![
                (ContextProperty::AccessPointName, s(&net.apn)),
                (ContextProperty::Name, s(&net.name)),
                (ContextProperty::Username, opt(net.username.as_deref())),
                (ContextProperty::Password, opt(net.password.as_deref())),
                (
                    ContextProperty::AuthenticationMethod,
                    s(net.auth_type.as_context_str()),
                ),
            ]
        }
        ContextKind::Mms => {
            let Some(mms) = settings.mms.as_ref() else {
                return Vec::new();
            };
            vec![
                (ContextProperty::AccessPointName, s(&mms.apn)),
                (ContextProperty::Name, s(&mms.name)),
                (ContextProperty::Username, opt(mms.username.as_deref())),
                (ContextProperty::Password, opt(mms.password.as_deref())),
                (
                    ContextProperty::AuthenticationMethod,
                    s(mms.auth_type.as_context_str()),
                ),
                (
                    ContextProperty::MessageCenter,
                    opt(mms.message_center.as_deref()),
                ),
                (
                    ContextProperty::MessageProxy,
                    PropertyValue::Str(mms.message_proxy().unwrap_or_default()),
                ),
            ]
        }
    }
}
