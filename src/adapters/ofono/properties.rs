//! oFono property maps → domain types.
//!
//! Works on borrowed [`Value`]s so the conversions can be tested without
//! a bus.  Missing or mistyped properties fall back to "absent".

use std::collections::HashMap;

use zbus::zvariant::Value;

use crate::events::{
    ConnectionManagerInfo, ContextInfo, ContextSummary, ModemInfo, RpcError, SimInfo,
};
use crate::fsm::task::ContextKind;

use super::proxies::Properties;

/// Borrowed view of a property map.
pub type PropertyView<'a> = HashMap<&'a str, &'a Value<'a>>;

pub fn view(props: &Properties) -> PropertyView<'_> {
    props.iter().map(|(k, v)| (k.as_str(), &**v)).collect()
}

pub fn as_bool(value: &Value<'_>) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

pub fn as_str<'v>(value: &'v Value<'_>) -> Option<&'v str> {
    match value {
        Value::Str(s) => Some(s.as_str()),
        _ => None,
    }
}

pub fn as_strings(value: &Value<'_>) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .inner()
            .iter()
            .filter_map(as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn flag(props: &PropertyView<'_>, name: &str) -> bool {
    props.get(name).and_then(|v| as_bool(v)).unwrap_or(false)
}

fn text(props: &PropertyView<'_>, name: &str) -> Option<String> {
    props.get(name).and_then(|v| as_str(v)).map(str::to_string)
}

// ───────────────────────────────────────────────────────────────
// Conversions
// ───────────────────────────────────────────────────────────────

pub fn modem_info(path: &str, props: &PropertyView<'_>) -> ModemInfo {
    ModemInfo {
        path: path.to_string(),
        interfaces: props.get("Interfaces").map(|v| as_strings(v)).unwrap_or_default(),
    }
}

pub fn sim_info(props: &PropertyView<'_>) -> SimInfo {
    SimInfo {
        present: flag(props, "Present"),
        identity: text(props, "SubscriberIdentity").filter(|s| !s.is_empty()),
    }
}

pub fn context_summary(path: &str, props: &PropertyView<'_>) -> ContextSummary {
    ContextSummary {
        path: path.to_string(),
        kind: props
            .get("Type")
            .and_then(|v| as_str(v))
            .and_then(ContextKind::from_type),
        active: flag(props, "Active"),
    }
}

pub fn connection_manager_info(
    props: &PropertyView<'_>,
    contexts: Vec<ContextSummary>,
) -> ConnectionManagerInfo {
    ConnectionManagerInfo {
        attached: flag(props, "Attached"),
        contexts,
    }
}

pub fn context_info(props: &PropertyView<'_>) -> ContextInfo {
    ContextInfo {
        active: flag(props, "Active"),
    }
}

impl From<zbus::Error> for RpcError {
    fn from(e: zbus::Error) -> Self {
        match e {
            zbus::Error::MethodError(name, message, _) => {
                RpcError::new(name.as_str(), message.unwrap_or_default())
            }
            other => RpcError::new("org.freedesktop.DBus.Error.Failed", other.to_string()),
        }
    }
}
