//! oFono telephony adapter (D-Bus, via `zbus`).
//!
//! ```text
//!  Provisioner ──TelephonyPort──▶ OfonoGateway ──spawn──▶ LocalExecutor tasks
//!       ▲                                                  │  zbus calls,
//!       │                                                  │  retries, timers
//!       └──────────── Notice ◀── NoticeChannel ◀───────────┘
//! ```
//!
//! Every port call becomes one task on an `edge-executor` local executor.
//! Tasks report through an `embassy-sync` channel that the event loop in
//! [`io_task`] drains.  Cancelling a request drops its task, which drops
//! the in-flight D-Bus call with it.

pub mod channels;
pub mod gateway;
pub mod io_task;
pub mod properties;
pub mod proxies;

pub use gateway::OfonoGateway;
