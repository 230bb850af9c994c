//! Application core — push handling and outcome reporting, zero I/O.
//!
//! This module contains the service boundary of the provisioning daemon:
//! push-message validation, document decoding, and hand-off to the
//! [`Provisioner`](crate::fsm::Provisioner).  All interaction with the
//! telephony stack happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without a bus.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
