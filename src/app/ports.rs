//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Provisioner / ProvisioningService (domain)
//! ```
//!
//! The telephony gateway (oFono over D-Bus in production, a recording mock
//! in tests) implements [`TelephonyPort`]; event sinks implement
//! [`EventSink`].  The domain consumes both via generics, so the core never
//! touches the bus directly.
//!
//! ## Request model
//!
//! - Every port call returns immediately with a fresh [`RequestId`].
//! - Its result comes back later as a [`Notice`](crate::events::Notice)
//!   tagged with that id.
//! - [`TelephonyPort::cancel`] releases the transport side of a request.
//!   It is idempotent: cancelling a finished or unknown id is a no-op.

use core::time::Duration;

// ───────────────────────────────────────────────────────────────
// Request handles
// ───────────────────────────────────────────────────────────────

/// Handle of one pending telephony operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl core::fmt::Display for RequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Context properties
// ───────────────────────────────────────────────────────────────

/// Writable properties of a connection context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextProperty {
    Name,
    AccessPointName,
    Username,
    Password,
    AuthenticationMethod,
    MessageCenter,
    MessageProxy,
    Active,
}

impl ContextProperty {
    /// Property name on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::AccessPointName => "AccessPointName",
            Self::Username => "Username",
            Self::Password => "Password",
            Self::AuthenticationMethod => "AuthenticationMethod",
            Self::MessageCenter => "MessageCenter",
            Self::MessageProxy => "MessageProxy",
            Self::Active => "Active",
        }
    }
}

/// Value written to a context property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Str(String),
    Bool(bool),
}

// ───────────────────────────────────────────────────────────────
// Telephony port (driven adapter: domain → telephony stack)
// ───────────────────────────────────────────────────────────────

/// Asynchronous telephony operations.
///
/// The `watch_*` calls complete once the named object is valid (its
/// properties could be read), or with an error once the adapter gives up.
pub trait TelephonyPort {
    /// Wait for the manager and list its modems.
    fn watch_manager(&mut self) -> RequestId;

    /// Wait for the SIM manager of `modem` and read `Present` / identity.
    fn watch_sim(&mut self, modem: &str) -> RequestId;

    /// Wait for the connection manager of `modem` and list its contexts.
    fn watch_connection_manager(&mut self, modem: &str) -> RequestId;

    /// Wait for `context` and read its `Active` flag.  The adapter also
    /// reports `Active` changes on it until the request is cancelled.
    fn watch_context(&mut self, context: &str) -> RequestId;

    /// Create a new context of `kind` on `modem`.
    fn add_context(&mut self, modem: &str, kind: &str) -> RequestId;

    /// Write one context property.
    fn set_property(
        &mut self,
        context: &str,
        property: ContextProperty,
        value: PropertyValue,
    ) -> RequestId;

    /// Report a `DeadlineElapsed` notice after `after`.
    fn schedule_deadline(&mut self, after: Duration) -> RequestId;

    /// Cancel a pending request.  Idempotent.
    fn cancel(&mut self, request: RequestId);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (log, D-Bus
/// signal, test recorder...).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
