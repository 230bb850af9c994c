//! cellprov library.
//!
//! Decodes OMA Client Provisioning documents into access point settings
//! and applies them to oFono data contexts.  The decoder, resolver and
//! orchestrator are pure logic; the D-Bus adapter is behind the `dbus`
//! feature.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod decoder;
pub mod error;
pub mod events;
pub mod fsm;
pub mod settings;
