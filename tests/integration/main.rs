//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  No modem or system bus is required.

mod decoder_tests;
mod mock_telephony;
mod provisioning_flow_tests;
mod wbxml_writer;
