//! Service configuration parameters
//!
//! All tunable parameters for the provisioning service.
//! Values can be overridden by a JSON file passed on the command line;
//! fields missing from the file keep their defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What to do when the connection manager has no context of a needed type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextPolicy {
    /// Contexts are created by the platform; a missing one is skipped.
    #[default]
    UsePreProvisioned,
    /// A missing context is created with `AddContext` before provisioning it.
    CreateMissing,
}

/// Core service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    // --- Orchestrator ---
    /// Seconds a session may stall before it is forced to fail
    pub session_timeout_secs: u64,
    /// Whether missing contexts are created or skipped
    pub context_policy: ContextPolicy,

    // --- Telephony gateway ---
    /// D-Bus well-known name of the telephony daemon
    pub ofono_service: String,
    /// Delay between validity probes of a telephony object (milliseconds)
    pub retry_interval_ms: u64,
    /// Number of validity probes before an object is declared invalid
    pub retry_attempts: u32,

    // --- Push boundary ---
    /// The only content type accepted from the push transport
    pub accepted_content_type: String,
    /// Also accept the textual `text/vnd.wap.connectivity-xml` form
    pub accept_xml: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            // Orchestrator
            session_timeout_secs: 30,
            context_policy: ContextPolicy::UsePreProvisioned,

            // Telephony gateway
            ofono_service: "org.ofono".to_string(),
            retry_interval_ms: 500,
            retry_attempts: 20, // 10 s at the default interval

            // Push boundary
            accepted_content_type: crate::decoder::WBXML_CONTENT_TYPE.to_string(),
            accept_xml: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a JSON file and validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the service hang or never retry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "session_timeout_secs must be > 0",
            ));
        }
        if self.retry_attempts == 0 {
            return Err(ConfigError::ValidationFailed("retry_attempts must be > 0"));
        }
        if self.retry_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("retry_interval_ms must be > 0"));
        }
        if self.ofono_service.is_empty() {
            return Err(ConfigError::ValidationFailed("ofono_service must not be empty"));
        }
        if self.accepted_content_type.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "accepted_content_type must not be empty",
            ));
        }
        Ok(())
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}
