//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements    | Connects to                 |
//! |------------|---------------|-----------------------------|
//! | `log_sink` | EventSink     | `log` records               |
//! | `ofono`    | TelephonyPort | oFono over the system D-Bus |

pub mod log_sink;
#[cfg(feature = "dbus")]
pub mod ofono;
