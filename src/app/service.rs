//! Application service — the hexagonal core.
//!
//! [`ProvisioningService`] owns the provisioning engine and the service
//! configuration.  It validates push messages, decodes them and reports
//! one [`AppEvent`] per attempt.  All I/O flows through port traits
//! injected at call sites, making the entire service testable with mock
//! adapters.
//!
//! ```text
//!  PushMessage ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                  │     ProvisioningService     │
//!  Notice ───────▶ │  decoder · Provisioner      │ ──▶ TelephonyPort
//!                  └─────────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::ServiceConfig;
use crate::decoder::{self, XML_CONTENT_TYPE};
use crate::error::PushError;
use crate::events::Notice;
use crate::fsm::{Provisioner, SessionId};

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{EventSink, TelephonyPort};

/// A provisioning document as delivered by the push transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub content_type: String,
    /// Subscriber identity (IMSI) the document is addressed to.
    pub identity: String,
    pub payload: Vec<u8>,
}

// ───────────────────────────────────────────────────────────────
// ProvisioningService
// ───────────────────────────────────────────────────────────────

pub struct ProvisioningService {
    config: ServiceConfig,
    engine: Provisioner,
}

impl ProvisioningService {
    pub fn new(config: ServiceConfig) -> Self {
        let engine = Provisioner::new(&config);
        Self { config, engine }
    }

    // ── Push boundary ─────────────────────────────────────────

    /// Validate, decode and start provisioning one push message.
    ///
    /// Malformed messages are rejected with a [`PushError`] before the
    /// decoder runs.  A document that fails to decode, or decodes to
    /// nothing usable, emits `Failed` with an empty context path and
    /// returns `Ok(None)`.
    pub fn handle_push(
        &mut self,
        msg: PushMessage,
        port: &mut impl TelephonyPort,
        sink: &mut impl EventSink,
    ) -> Result<Option<SessionId>, PushError> {
        self.validate(&msg)?;
        info!(
            "Push for {}: {} bytes of {}",
            msg.identity,
            msg.payload.len(),
            msg.content_type
        );

        let settings = match decoder::decode_payload(&msg.content_type, &msg.payload) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Provisioning document rejected: {}", e);
                sink.emit(&AppEvent::Failed {
                    identity: msg.identity,
                    context_path: String::new(),
                });
                return Ok(None);
            }
        };
        if settings.is_empty() {
            warn!("Provisioning document has no usable access point");
            sink.emit(&AppEvent::Failed {
                identity: msg.identity,
                context_path: String::new(),
            });
            return Ok(None);
        }

        let id = self.engine.provision(&msg.identity, settings, port);
        self.drain(sink);
        Ok(Some(id))
    }

    fn validate(&self, msg: &PushMessage) -> Result<(), PushError> {
        let accepted = msg.content_type == self.config.accepted_content_type
            || (self.config.accept_xml && msg.content_type == XML_CONTENT_TYPE);
        if !accepted {
            return Err(PushError::UnsupportedContentType(msg.content_type.clone()));
        }
        if msg.identity.is_empty() {
            return Err(PushError::MissingIdentity);
        }
        if msg.payload.is_empty() {
            return Err(PushError::EmptyPayload);
        }
        Ok(())
    }

    // ── Event loop ────────────────────────────────────────────

    /// Feed one telephony notice into the engine.
    pub fn handle_notice(
        &mut self,
        notice: Notice,
        port: &mut impl TelephonyPort,
        sink: &mut impl EventSink,
    ) {
        self.engine.handle(notice, port);
        self.drain(sink);
    }

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        port: &mut impl TelephonyPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::Push(msg) => {
                if let Err(e) = self.handle_push(msg, port, sink) {
                    warn!("Push rejected: {}", e);
                }
            }
            AppCommand::Cancel(id) => {
                if !self.engine.cancel(id, port) {
                    info!("Session {:?} already finished", id);
                }
            }
            AppCommand::CancelAll => self.engine.cancel_all(port),
        }
        self.drain(sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// No session is in flight.
    pub fn is_idle(&self) -> bool {
        self.engine.is_idle()
    }

    // ── Internal ──────────────────────────────────────────────

    fn drain(&mut self, sink: &mut impl EventSink) {
        for completion in self.engine.take_completions() {
            sink.emit(&AppEvent::from(completion));
        }
    }
}
