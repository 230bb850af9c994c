//! [`TelephonyPort`] over oFono.
//!
//! Each port call allocates a [`RequestId`] and spawns one task on the
//! shared local executor.  The task performs the D-Bus call (retrying
//! validity probes as configured), posts exactly one completion
//! [`Notice`] and exits.  Context watches are the exception: after the
//! completion they keep forwarding `Active` changes until cancelled.

use core::future::Future;
use core::time::Duration;
use std::collections::HashMap;
use std::rc::Rc;

use edge_executor::{LocalExecutor, Task};
use futures_lite::StreamExt;
use log::{debug, info, warn};
use zbus::Connection;
use zbus::proxy::CacheProperties;
use zbus::zvariant::Value;

use crate::app::ports::{ContextProperty, PropertyValue, RequestId, TelephonyPort};
use crate::config::ServiceConfig;
use crate::events::{ConnectionManagerInfo, ModemInfo, Notice, RpcError, SimInfo};

use super::channels::NoticeChannel;
use super::properties;
use super::proxies::{
    ConnectionContextProxy, ConnectionManagerProxy, ManagerProxy, SimManagerProxy,
};

/// Executor shared by the gateway tasks and the event loop.
pub type Executor = LocalExecutor<'static, 64>;

/// Build an uncached proxy of `$ty` for `$path` on `$service`.
macro_rules! proxy {
    ($ty:ident, $conn:expr, $service:expr, $path:expr) => {
        $ty::builder($conn)
            .destination($service)?
            .path($path)?
            .cache_properties(CacheProperties::No)
            .build()
            .await
    };
}

// ───────────────────────────────────────────────────────────────
// Gateway
// ───────────────────────────────────────────────────────────────

pub struct OfonoGateway {
    conn: Connection,
    service: String,
    retry: Retry,
    executor: Rc<Executor>,
    notices: Rc<NoticeChannel>,
    tasks: HashMap<RequestId, Task<()>>,
    next: u64,
}

impl OfonoGateway {
    pub fn new(
        conn: Connection,
        config: &ServiceConfig,
        executor: Rc<Executor>,
        notices: Rc<NoticeChannel>,
    ) -> Self {
        Self {
            conn,
            service: config.ofono_service.clone(),
            retry: Retry {
                attempts: config.retry_attempts.max(1),
                interval: config.retry_interval(),
            },
            executor,
            notices,
            tasks: HashMap::new(),
            next: 1,
        }
    }

    /// Requests whose task is still running.
    pub fn in_flight(&self) -> usize {
        self.tasks.values().filter(|t| !t.is_finished()).count()
    }

    /// Forget tasks that already posted their notice.
    pub fn retire(&mut self) {
        self.tasks.retain(|_, t| !t.is_finished());
    }

    fn allocate(&mut self) -> RequestId {
        let request = RequestId(self.next);
        self.next += 1;
        request
    }

    /// Run `fut` for `request` and post the notice it produces.
    fn spawn<F>(&mut self, request: RequestId, fut: F) -> RequestId
    where
        F: Future<Output = Notice> + 'static,
    {
        let notices = self.notices.clone();
        self.launch(request, async move {
            let notice = fut.await;
            notices.send(notice).await;
        })
    }

    fn launch<F>(&mut self, request: RequestId, fut: F) -> RequestId
    where
        F: Future<Output = ()> + 'static,
    {
        let task = self.executor.spawn(fut);
        self.tasks.insert(request, task);
        request
    }

    fn target(&self, path: &str) -> Target {
        Target {
            conn: self.conn.clone(),
            service: self.service.clone(),
            path: path.to_string(),
        }
    }
}

impl TelephonyPort for OfonoGateway {
    fn watch_manager(&mut self) -> RequestId {
        let request = self.allocate();
        let target = self.target("/");
        let retry = self.retry;
        self.spawn(request, async move {
            let result = retry.run(|| target.clone().modems()).await;
            Notice::Manager { request, result }
        })
    }

    fn watch_sim(&mut self, modem: &str) -> RequestId {
        let request = self.allocate();
        let target = self.target(modem);
        let retry = self.retry;
        self.spawn(request, async move {
            let result = retry.run(|| target.clone().sim()).await;
            Notice::Sim { request, result }
        })
    }

    fn watch_connection_manager(&mut self, modem: &str) -> RequestId {
        let request = self.allocate();
        let target = self.target(modem);
        let retry = self.retry;
        self.spawn(request, async move {
            let result = retry.run(|| target.clone().connection_manager()).await;
            Notice::ConnectionManager { request, result }
        })
    }

    fn watch_context(&mut self, context: &str) -> RequestId {
        let request = self.allocate();
        let target = self.target(context);
        let retry = self.retry;
        let notices = self.notices.clone();
        self.launch(request, follow_context(target, retry, request, notices))
    }

    fn add_context(&mut self, modem: &str, kind: &str) -> RequestId {
        let request = self.allocate();
        let target = self.target(modem);
        let kind = kind.to_string();
        info!("AddContext({}) on {}", kind, modem);
        self.spawn(request, async move {
            let result = target.add_context(&kind).await.map_err(RpcError::from);
            Notice::ContextAdded { request, result }
        })
    }

    fn set_property(
        &mut self,
        context: &str,
        property: ContextProperty,
        value: PropertyValue,
    ) -> RequestId {
        let request = self.allocate();
        let target = self.target(context);
        debug!("SetProperty({}) on {} as {}", property.as_str(), context, request);
        self.spawn(request, async move {
            let result = target
                .set_property(property, value)
                .await
                .map_err(RpcError::from);
            Notice::RequestDone { request, result }
        })
    }

    fn schedule_deadline(&mut self, after: Duration) -> RequestId {
        let request = self.allocate();
        self.spawn(request, async move {
            async_io_mini::Timer::after(after).await;
            Notice::DeadlineElapsed { request }
        })
    }

    fn cancel(&mut self, request: RequestId) {
        if self.tasks.remove(&request).is_some() {
            debug!("Cancelled {}", request);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Validity probes
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Retry {
    attempts: u32,
    interval: Duration,
}

impl Retry {
    /// Call `op` until it succeeds or the attempts run out.
    async fn run<T, F, Fut>(self, mut op: F) -> Result<T, RpcError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = zbus::Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.attempts => return Err(e.into()),
                Err(e) => {
                    debug!("Probe {}/{} failed: {}", attempt, self.attempts, e);
                    attempt += 1;
                    async_io_mini::Timer::after(self.interval).await;
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// D-Bus calls
// ───────────────────────────────────────────────────────────────

/// One object on the telephony daemon.
#[derive(Clone)]
struct Target {
    conn: Connection,
    service: String,
    path: String,
}

impl Target {
    async fn modems(self) -> zbus::Result<Vec<ModemInfo>> {
        let manager = proxy!(ManagerProxy, &self.conn, self.service, self.path)?;
        let modems = manager.get_modems().await?;
        Ok(modems
            .iter()
            .map(|(path, props)| properties::modem_info(path.as_str(), &properties::view(props)))
            .collect())
    }

    async fn sim(self) -> zbus::Result<SimInfo> {
        let sim = proxy!(SimManagerProxy, &self.conn, self.service, self.path)?;
        let props = sim.get_properties().await?;
        Ok(properties::sim_info(&properties::view(&props)))
    }

    async fn connection_manager(self) -> zbus::Result<ConnectionManagerInfo> {
        let cm = proxy!(ConnectionManagerProxy, &self.conn, self.service, self.path)?;
        let props = cm.get_properties().await?;
        let contexts = cm
            .get_contexts()
            .await?
            .iter()
            .map(|(path, props)| {
                properties::context_summary(path.as_str(), &properties::view(props))
            })
            .collect();
        Ok(properties::connection_manager_info(
            &properties::view(&props),
            contexts,
        ))
    }

    async fn add_context(self, kind: &str) -> zbus::Result<String> {
        let cm = proxy!(ConnectionManagerProxy, &self.conn, self.service, self.path)?;
        let path = cm.add_context(kind).await?;
        Ok(path.as_str().to_string())
    }

    async fn set_property(self, property: ContextProperty, value: PropertyValue) -> zbus::Result<()> {
        let context = proxy!(ConnectionContextProxy, &self.conn, self.service, self.path)?;
        let value = match value {
            PropertyValue::Str(s) => Value::from(s),
            PropertyValue::Bool(b) => Value::from(b),
        };
        context.set_property(property.as_str(), &value).await
    }
}

/// Wait for a context to become valid, report it, then forward its
/// `Active` changes until the watch is cancelled.
async fn follow_context(
    target: Target,
    retry: Retry,
    request: RequestId,
    notices: Rc<NoticeChannel>,
) {
    let context = match connect_context(&target).await {
        Ok(context) => context,
        Err(e) => {
            let result = Err(RpcError::from(e));
            notices.send(Notice::Context { request, result }).await;
            return;
        }
    };

    // Subscribe first so a change racing the property read is not lost.
    let changes = match context.receive_property_changed().await {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!("No PropertyChanged subscription on {}: {}", target.path, e);
            None
        }
    };

    let proxy = &context;
    let result = retry
        .run(move || async move { proxy.get_properties().await })
        .await
        .map(|props| properties::context_info(&properties::view(&props)));
    let valid = result.is_ok();
    notices.send(Notice::Context { request, result }).await;

    let (true, Some(mut changes)) = (valid, changes) else {
        return;
    };
    while let Some(signal) = changes.next().await {
        let Ok(args) = signal.args() else {
            continue;
        };
        if *args.name() != ContextProperty::Active.as_str() {
            continue;
        }
        if let Some(active) = properties::as_bool(args.value()) {
            debug!("{} Active -> {}", target.path, active);
            notices
                .send(Notice::ContextActiveChanged {
                    context: target.path.clone(),
                    active,
                })
                .await;
        }
    }
}

async fn connect_context(target: &Target) -> zbus::Result<ConnectionContextProxy<'static>> {
    proxy!(
        ConnectionContextProxy,
        &target.conn,
        target.service.clone(),
        target.path.clone()
    )
}
