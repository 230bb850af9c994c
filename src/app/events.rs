//! Outbound application events.
//!
//! The [`ProvisioningService`](super::service::ProvisioningService) emits
//! these through the [`EventSink`](super::ports::EventSink) port, exactly
//! one per provisioning attempt.  Adapters on the other side decide what
//! to do with them: log, broadcast a D-Bus signal, exit the process, etc.

use crate::fsm::{Completion, Outcome};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Every context was provisioned.
    Succeeded { identity: String, context_path: String },

    /// Some contexts were provisioned, others failed.
    PartiallySucceeded { identity: String, context_path: String },

    /// Nothing was provisioned.  `context_path` is empty when no modem
    /// matched the identity or the document never decoded.
    Failed { identity: String, context_path: String },
}

impl AppEvent {
    pub fn identity(&self) -> &str {
        match self {
            Self::Succeeded { identity, .. }
            | Self::PartiallySucceeded { identity, .. }
            | Self::Failed { identity, .. } => identity,
        }
    }

    pub fn context_path(&self) -> &str {
        match self {
            Self::Succeeded { context_path, .. }
            | Self::PartiallySucceeded { context_path, .. }
            | Self::Failed { context_path, .. } => context_path,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Succeeded { .. } => Outcome::Success,
            Self::PartiallySucceeded { .. } => Outcome::PartialSuccess,
            Self::Failed { .. } => Outcome::Failure,
        }
    }
}

impl From<Completion> for AppEvent {
    fn from(c: Completion) -> Self {
        let (identity, context_path) = (c.identity, c.context_path);
        match c.outcome {
            Outcome::Success => Self::Succeeded { identity, context_path },
            Outcome::PartialSuccess => Self::PartiallySucceeded { identity, context_path },
            Outcome::Failure => Self::Failed { identity, context_path },
        }
    }
}
