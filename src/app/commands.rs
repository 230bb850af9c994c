//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (push
//! transport, CLI, shutdown handling) that the
//! [`ProvisioningService`](super::service::ProvisioningService)
//! interprets and acts upon.

use crate::fsm::SessionId;

use super::service::PushMessage;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// A provisioning document arrived from the push transport.
    Push(PushMessage),

    /// Abort one session; it completes with `Failed`.
    Cancel(SessionId),

    /// Abort every live session (e.g. on shutdown).
    CancelAll,
}
