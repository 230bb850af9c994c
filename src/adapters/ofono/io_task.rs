//! Event loop for one push message.
//!
//! Runs the service on a `edge-executor` local executor driven by
//! `futures_lite::future::block_on`.  Gateway tasks and timers run on
//! the same executor; the loop waits on the notice channel, so nothing
//! busy-spins between D-Bus replies.
//!
//! ```text
//!  ┌─────────────────────────────────────────────────────────┐
//!  │  block_on                                               │
//!  │  ┌───────────────────────────────────────────────────┐  │
//!  │  │  LocalExecutor                                    │  │
//!  │  │   ┌──────────────┐  Notice   ┌─────────────────┐  │  │
//!  │  │   │ gateway tasks│──────────▶│ event loop      │  │  │
//!  │  │   │ (per request)│◀──────────│ (service)       │  │  │
//!  │  │   └──────────────┘  spawn    └─────────────────┘  │  │
//!  │  └───────────────────────────────────────────────────┘  │
//!  └─────────────────────────────────────────────────────────┘
//! ```

use std::rc::Rc;

use log::{debug, info};

use crate::app::ports::EventSink;
use crate::app::service::{ProvisioningService, PushMessage};
use crate::config::ServiceConfig;
use crate::error::Result;

use super::channels::notice_channel;
use super::gateway::{Executor, OfonoGateway};

/// Provision one push message against the telephony daemon on `conn`.
///
/// Returns `sink` once the outcome has been emitted on it.
pub fn run<S>(
    conn: zbus::Connection,
    config: ServiceConfig,
    msg: PushMessage,
    mut sink: S,
) -> Result<S>
where
    S: EventSink + 'static,
{
    let executor: Rc<Executor> = Rc::new(Executor::new());
    let notices = Rc::new(notice_channel());
    let mut gateway = OfonoGateway::new(conn, &config, executor.clone(), notices.clone());
    let mut service = ProvisioningService::new(config);

    if service.handle_push(msg, &mut gateway, &mut sink)?.is_none() {
        return Ok(sink);
    }
    info!("Provisioning started");

    let sink = futures_lite::future::block_on(executor.run(async move {
        while !service.is_idle() {
            let notice = notices.receive().await;
            service.handle_notice(notice, &mut gateway, &mut sink);
            gateway.retire();
            debug!("{} telephony requests in flight", gateway.in_flight());
        }
        // Tasks still running are dropped with the gateway.
        drop(gateway);
        sink
    }));
    Ok(sink)
}
