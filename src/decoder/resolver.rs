//! Cross-reference resolution.
//!
//! Picks one Internet and one MMS access point out of the collected
//! records and flattens the fragments that describe each of them into
//! [`ProvisioningSettings`].
//!
//! ```text
//!  Internet:  APPLICATION(TO-NAPID=INTERNET) ┐
//!             NAPDEF(has INTERNET)           ├─▶ (app, nap) ─▶ nap ◀ app
//!             APPLICATION(APPID=w2)          ┘
//!
//!  MMS:       APPLICATION(APPID=w4|ap0005) ─TO-PROXY─▶ PXLOGICAL ─▶ PXPHYSICAL
//!                   │                                                 │
//!                   └──────────────── TO-NAPID ───────────▶ NAPDEF ◀──┘
//!             app ◀ proxy ◀ nap
//! ```
//!
//! `a ◀ b` means "start from `a`, then overwrite with `b`".  The NAP is
//! authoritative for the APN on the MMS path; on the Internet path the
//! application overrides the NAP.
//!
//! Pure and deterministic: the same records always give the same result.

use std::collections::BTreeMap;

use log::{debug, warn};

use super::collector::{Characteristic, CharacteristicRecords, CharacteristicType};
use crate::settings::{AuthType, InternetSettings, MmsSettings, ProvisioningSettings};

const INTERNET_MARKER: &str = "INTERNET";
const INTERNET_APPID: &str = "w2";
const MMS_APPIDS: [&str; 2] = ["w4", "ap0005"];

/// Flattened parameter table built from several characteristics.
type Layer<'a> = BTreeMap<&'a str, &'a str>;

/// Resolve the collected records into settings.
///
/// A document with no usable access point yields empty settings; deciding
/// that this is a failure is the caller's job.
pub fn resolve(records: &CharacteristicRecords) -> ProvisioningSettings {
    ProvisioningSettings {
        internet: resolve_internet(records),
        mms: resolve_mms(records),
    }
}

// ───────────────────────────────────────────────────────────────
// Internet
// ───────────────────────────────────────────────────────────────

fn resolve_internet(records: &CharacteristicRecords) -> Option<InternetSettings> {
    let mut app = find(&records.applications, "TO-NAPID", INTERNET_MARKER);
    let mut nap = records.napdefs.iter().find(|n| n.has_param(INTERNET_MARKER));

    if app.is_none() {
        app = match nap {
            Some(nap) => nap
                .param("NAPID")
                .and_then(|id| find(&records.applications, "TO-NAPID", id)),
            None => find(&records.applications, "APPID", INTERNET_APPID),
        };
    }
    if nap.is_none() {
        nap = app
            .and_then(|a| a.param("TO-NAPID"))
            .and_then(|id| find(&records.napdefs, "NAPID", id));
    }

    let Some(nap) = nap else {
        debug!("No Internet access point in document");
        return None;
    };

    let mut merged = nap_layer(nap);
    if let Some(app) = app {
        overlay(&mut merged, &app.params);
    }

    let apn = apn(&merged, "Internet")?;
    let (username, password, auth_type) = credentials(&merged);
    Some(InternetSettings {
        name: text(&merged, "NAME"),
        apn,
        username,
        password,
        auth_type,
    })
}

// ───────────────────────────────────────────────────────────────
// MMS
// ───────────────────────────────────────────────────────────────

fn resolve_mms(records: &CharacteristicRecords) -> Option<MmsSettings> {
    let Some(app) = MMS_APPIDS
        .iter()
        .find_map(|id| find(&records.applications, "APPID", id))
    else {
        debug!("No MMS application in document");
        return None;
    };

    let proxy = app
        .param("TO-PROXY")
        .and_then(|id| find(&records.pxlogicals, "PROXY-ID", id));
    let physical = proxy.and_then(physical_proxy);

    let to_napid = app
        .param("TO-NAPID")
        .or_else(|| physical.and_then(|p| p.param("TO-NAPID")))
        .or_else(|| proxy.and_then(|p| p.param("TO-NAPID")));
    let nap = to_napid.and_then(|id| find(&records.napdefs, "NAPID", id));

    let mut merged: Layer<'_> = layer(&app.params);
    if let Some(proxy) = proxy {
        overlay(&mut merged, &proxy.params);
    }
    if let Some(physical) = physical {
        overlay(&mut merged, &physical.params);
    }
    if let Some(nap) = nap {
        let nap = nap_layer(nap);
        merged.extend(nap);
    }

    let apn = apn(&merged, "MMS")?;
    let (username, password, auth_type) = credentials(&merged);

    let message_center = merged
        .get("ADDR")
        .copied()
        .or_else(|| first_child_param(app, &CharacteristicType::AppAddr, "ADDR"))
        .map(str::to_string);

    let message_proxy_host = physical.and_then(|p| p.param("PXADDR")).map(str::to_string);
    let message_proxy_port = physical
        .and_then(|p| first_child_param(p, &CharacteristicType::Port, "PORTNBR"))
        .map(str::to_string);

    Some(MmsSettings {
        name: text(&merged, "NAME"),
        apn,
        username,
        password,
        message_center,
        message_proxy_host,
        message_proxy_port,
        auth_type,
    })
}

/// The PXPHYSICAL that names a NAP, else the first one.
fn physical_proxy(logical: &Characteristic) -> Option<&Characteristic> {
    let kind = CharacteristicType::PxPhysical;
    logical
        .children_of(&kind)
        .find(|p| p.has_param("TO-NAPID"))
        .or_else(|| logical.children_of(&kind).next())
}

// ───────────────────────────────────────────────────────────────
// Helpers
// ───────────────────────────────────────────────────────────────

fn find<'a>(list: &'a [Characteristic], name: &str, value: &str) -> Option<&'a Characteristic> {
    list.iter().find(|c| c.param(name) == Some(value))
}

fn layer(params: &BTreeMap<String, String>) -> Layer<'_> {
    params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

fn overlay<'a>(base: &mut Layer<'a>, params: &'a BTreeMap<String, String>) {
    base.extend(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
}

/// NAPDEF parameters with its first NAPAUTHINFO underneath.
fn nap_layer(nap: &Characteristic) -> Layer<'_> {
    let mut out = Layer::new();
    if let Some(auth) = nap.children_of(&CharacteristicType::NapAuthInfo).next() {
        overlay(&mut out, &auth.params);
    }
    overlay(&mut out, &nap.params);
    out
}

fn first_child_param<'a>(
    parent: &'a Characteristic,
    kind: &CharacteristicType,
    name: &str,
) -> Option<&'a str> {
    parent.children_of(kind).find_map(|c| c.param(name))
}

fn apn(merged: &Layer<'_>, label: &str) -> Option<String> {
    if merged.get("NAP-ADDRTYPE").copied() != Some("APN") {
        warn!("{} access point is not APN-addressed, dropping it", label);
        return None;
    }
    match merged.get("NAP-ADDRESS").copied() {
        Some(apn) if !apn.is_empty() => Some(apn.to_string()),
        _ => {
            warn!("{} access point has no APN, dropping it", label);
            None
        }
    }
}

fn text(merged: &Layer<'_>, name: &str) -> String {
    merged.get(name).copied().unwrap_or_default().to_string()
}

fn credentials(merged: &Layer<'_>) -> (Option<String>, Option<String>, AuthType) {
    let username = merged.get("AUTHNAME").copied();
    let password = merged.get("AUTHSECRET").copied();
    let has_credentials = username.is_some_and(|u| !u.is_empty())
        || password.is_some_and(|p| !p.is_empty());
    let auth_type = AuthType::from_param(merged.get("AUTHTYPE").copied(), has_credentials);
    (
        username.map(str::to_string),
        password.map(str::to_string),
        auth_type,
    )
}
