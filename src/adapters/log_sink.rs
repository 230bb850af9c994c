//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one structured line per outcome to
//! the `log` facade (stderr through `tracing-subscriber` in the binary).
//! A D-Bus signal adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] and remembers the last one.
#[derive(Debug, Default)]
pub struct LogEventSink {
    last: Option<AppEvent>,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent outcome, if any session finished.
    pub fn last(&self) -> Option<&AppEvent> {
        self.last.as_ref()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Succeeded { identity, context_path } => {
                info!("OUTCOME | succeeded | identity={} | path={}", identity, context_path);
            }
            AppEvent::PartiallySucceeded { identity, context_path } => {
                warn!(
                    "OUTCOME | partially succeeded | identity={} | path={}",
                    identity, context_path
                );
            }
            AppEvent::Failed { identity, context_path } => {
                warn!(
                    "OUTCOME | failed | identity={} | path={}",
                    identity,
                    if context_path.is_empty() { "-" } else { context_path }
                );
            }
        }
        self.last = Some(event.clone());
    }
}
