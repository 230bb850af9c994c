//! Mock telephony adapter for integration tests.
//!
//! Records every port call with the request id it handed out, so tests
//! can answer requests in any order and assert on the full call history
//! without a bus.

use std::time::Duration;

use cellprov::app::events::AppEvent;
use cellprov::app::ports::{ContextProperty, EventSink, PropertyValue, RequestId, TelephonyPort};
use cellprov::events::{
    CONNECTION_MANAGER_INTERFACE, ConnectionManagerInfo, ContextSummary, ModemInfo,
    SIM_MANAGER_INTERFACE, SimInfo,
};
use cellprov::fsm::task::ContextKind;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    WatchManager,
    WatchSim(String),
    WatchConnectionManager(String),
    WatchContext(String),
    AddContext { modem: String, kind: String },
    SetProperty { context: String, property: ContextProperty, value: PropertyValue },
    Deadline(Duration),
}

// ── MockTelephony ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockTelephony {
    next: u64,
    pub calls: Vec<(RequestId, Call)>,
    pub cancelled: Vec<RequestId>,
}

#[allow(dead_code)]
impl MockTelephony {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(&mut self, call: Call) -> RequestId {
        self.next += 1;
        let id = RequestId(self.next);
        self.calls.push((id, call));
        id
    }

    /// Most recent request matching `pred`.
    pub fn last(&self, pred: impl Fn(&Call) -> bool) -> RequestId {
        self.calls
            .iter()
            .rev()
            .find(|(_, c)| pred(c))
            .map(|(id, _)| *id)
            .expect("no matching call")
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|(_, c)| pred(c)).count()
    }

    pub fn manager(&self) -> RequestId {
        self.last(|c| *c == Call::WatchManager)
    }

    pub fn sim(&self, modem: &str) -> RequestId {
        self.last(|c| matches!(c, Call::WatchSim(m) if m == modem))
    }

    pub fn connection_manager(&self, modem: &str) -> RequestId {
        self.last(|c| matches!(c, Call::WatchConnectionManager(m) if m == modem))
    }

    pub fn context_watch(&self, context: &str) -> RequestId {
        self.last(|c| matches!(c, Call::WatchContext(p) if p == context))
    }

    pub fn add_context(&self, kind: &str) -> RequestId {
        self.last(|c| matches!(c, Call::AddContext { kind: k, .. } if k == kind))
    }

    pub fn deadline(&self) -> RequestId {
        self.last(|c| matches!(c, Call::Deadline(_)))
    }

    /// Property writes on `context`, excluding `Active`.
    pub fn writes(&self, context: &str) -> Vec<(RequestId, ContextProperty, PropertyValue)> {
        self.calls
            .iter()
            .filter_map(|(id, c)| match c {
                Call::SetProperty { context: ctx, property, value }
                    if ctx == context && *property != ContextProperty::Active =>
                {
                    Some((*id, *property, value.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Value written for `property` on `context`.
    pub fn written(&self, context: &str, property: ContextProperty) -> Option<PropertyValue> {
        self.writes(context)
            .into_iter()
            .find(|(_, p, _)| *p == property)
            .map(|(_, _, v)| v)
    }

    pub fn deactivation(&self, context: &str) -> RequestId {
        self.last(|c| {
            matches!(c, Call::SetProperty { context: ctx, property: ContextProperty::Active, .. } if ctx == context)
        })
    }

    pub fn is_cancelled(&self, id: RequestId) -> bool {
        self.cancelled.contains(&id)
    }
}

impl TelephonyPort for MockTelephony {
    fn watch_manager(&mut self) -> RequestId {
        self.issue(Call::WatchManager)
    }

    fn watch_sim(&mut self, modem: &str) -> RequestId {
        self.issue(Call::WatchSim(modem.into()))
    }

    fn watch_connection_manager(&mut self, modem: &str) -> RequestId {
        self.issue(Call::WatchConnectionManager(modem.into()))
    }

    fn watch_context(&mut self, context: &str) -> RequestId {
        self.issue(Call::WatchContext(context.into()))
    }

    fn add_context(&mut self, modem: &str, kind: &str) -> RequestId {
        self.issue(Call::AddContext { modem: modem.into(), kind: kind.into() })
    }

    fn set_property(
        &mut self,
        context: &str,
        property: ContextProperty,
        value: PropertyValue,
    ) -> RequestId {
        self.issue(Call::SetProperty { context: context.into(), property, value })
    }

    fn schedule_deadline(&mut self, after: Duration) -> RequestId {
        self.issue(Call::Deadline(after))
    }

    fn cancel(&mut self, request: RequestId) {
        if !self.cancelled.contains(&request) {
            self.cancelled.push(request);
        }
    }
}

// ── Recording sink ────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Telephony fixtures ────────────────────────────────────────

pub const IMSI: &str = "244051234567890";
pub const MODEM: &str = "/ril_0";
pub const INTERNET_CTX: &str = "/ril_0/context1";
pub const MMS_CTX: &str = "/ril_0/context2";

#[allow(dead_code)]
pub fn modem(path: &str) -> ModemInfo {
    ModemInfo {
        path: path.into(),
        interfaces: vec![SIM_MANAGER_INTERFACE.into(), CONNECTION_MANAGER_INTERFACE.into()],
    }
}

#[allow(dead_code)]
pub fn sim(identity: &str) -> SimInfo {
    SimInfo { present: true, identity: Some(identity.into()) }
}

#[allow(dead_code)]
pub fn contexts(list: &[(&str, ContextKind, bool)]) -> ConnectionManagerInfo {
    ConnectionManagerInfo {
        attached: true,
        contexts: list
            .iter()
            .map(|(path, kind, active)| ContextSummary {
                path: (*path).into(),
                kind: Some(*kind),
                active: *active,
            })
            .collect(),
    }
}

/// Both contexts present and inactive.
#[allow(dead_code)]
pub fn both_contexts() -> ConnectionManagerInfo {
    contexts(&[
        (INTERNET_CTX, ContextKind::Internet, false),
        (MMS_CTX, ContextKind::Mms, false),
    ])
}
