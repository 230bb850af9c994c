//! oFono D-Bus interfaces.
//!
//! Only the calls provisioning needs.  Object paths other than the
//! manager's are supplied per proxy.

use std::collections::HashMap;

use zbus::proxy;
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

/// `a{sv}` as returned by every oFono `GetProperties`.
pub type Properties = HashMap<String, OwnedValue>;

/// Manager object, lists modems.
#[proxy(
    default_service = "org.ofono",
    interface = "org.ofono.Manager",
    default_path = "/"
)]
pub trait Manager {
    fn get_modems(&self) -> zbus::Result<Vec<(OwnedObjectPath, Properties)>>;
}

/// SIM manager of one modem.
#[proxy(default_service = "org.ofono", interface = "org.ofono.SimManager")]
pub trait SimManager {
    fn get_properties(&self) -> zbus::Result<Properties>;
}

/// Packet data manager of one modem.
#[proxy(default_service = "org.ofono", interface = "org.ofono.ConnectionManager")]
pub trait ConnectionManager {
    fn get_properties(&self) -> zbus::Result<Properties>;

    fn get_contexts(&self) -> zbus::Result<Vec<(OwnedObjectPath, Properties)>>;

    /// Create a context of the given type (`internet`, `mms`...) and return its path.
    fn add_context(&self, context_type: &str) -> zbus::Result<OwnedObjectPath>;
}

/// One data context.
#[proxy(default_service = "org.ofono", interface = "org.ofono.ConnectionContext")]
pub trait ConnectionContext {
    fn get_properties(&self) -> zbus::Result<Properties>;

    fn set_property(&self, name: &str, value: &Value<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    fn property_changed(&self, name: &str, value: Value<'_>) -> zbus::Result<()>;
}
