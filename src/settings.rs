//! Resolved provisioning settings.
//!
//! The normalized output of the decoder and the only input the
//! orchestrator needs.  A value is created once per decoded document
//! and consumed by exactly one provisioning session.

use serde::Serialize;

/// Authentication protocol for a data context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    None,
    Pap,
    Chap,
    Md5,
    /// Credentials are present but the protocol is unknown or unstated.
    Unspecified,
}

impl AuthType {
    /// Map an `AUTHTYPE` parameter (case-sensitive) to a protocol.
    ///
    /// An absent or empty value yields `None` when no credentials were
    /// provisioned and `Unspecified` otherwise.
    pub fn from_param(authtype: Option<&str>, has_credentials: bool) -> Self {
        match authtype {
            Some("PAP") => Self::Pap,
            Some("CHAP") => Self::Chap,
            Some("MD5") => Self::Md5,
            Some(v) if !v.is_empty() => Self::Unspecified,
            _ if has_credentials => Self::Unspecified,
            _ => Self::None,
        }
    }

    /// Value written to the context's `AuthenticationMethod` property.
    ///
    /// The telephony stack only knows `none`, `pap` and `chap`; MD5 is
    /// CHAP-MD5 and an unspecified protocol falls back to CHAP.
    pub fn as_context_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pap => "pap",
            Self::Chap | Self::Md5 | Self::Unspecified => "chap",
        }
    }
}

/// Internet access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InternetSettings {
    pub name: String,
    pub apn: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth_type: AuthType,
}

/// MMS access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MmsSettings {
    pub name: String,
    pub apn: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub message_center: Option<String>,
    pub message_proxy_host: Option<String>,
    pub message_proxy_port: Option<String>,
    pub auth_type: AuthType,
}

impl MmsSettings {
    /// `host:port` when both halves are non-empty, the bare host otherwise.
    pub fn message_proxy(&self) -> Option<String> {
        let host = self.message_proxy_host.as_deref().filter(|h| !h.is_empty())?;
        match self.message_proxy_port.as_deref() {
            Some(port) if !port.is_empty() => Some(format!("{host}:{port}")),
            _ => Some(host.to_string()),
        }
    }
}

/// Everything a provisioning document told us.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisioningSettings {
    pub internet: Option<InternetSettings>,
    pub mms: Option<MmsSettings>,
}

impl ProvisioningSettings {
    /// Neither access point resolved.  The service treats this as failure.
    pub fn is_empty(&self) -> bool {
        self.internet.is_none() && self.mms.is_none()
    }

    /// Copy with passwords masked, for printing.
    pub fn redacted(&self) -> Self {
        fn mask(p: Option<&String>) -> Option<String> {
            p.map(|p| if p.is_empty() { String::new() } else { "***".to_string() })
        }
        let mut out = self.clone();
        if let Some(net) = out.internet.as_mut() {
            net.password = mask(net.password.as_ref());
        }
        if let Some(mms) = out.mms.as_mut() {
            mms.password = mask(mms.password.as_ref());
        }
        out
    }
}
