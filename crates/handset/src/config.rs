//! Session Configuration
//!
//! Where the device cloud lives, how to authenticate, which device to ask
//! for, and where reports go. Loaded from YAML with environment overrides.
//!
//! ```yaml
//! remote_url: https://demo.perfectomobile.com/nexperience/perfectomobile/wd/hub
//! capabilities:
//!   platformName: Android
//!   deviceName: R58M12345
//! command_timeout: 120
//! report_dir: target/handset
//! ```

use crate::result::{DeviceError, DeviceResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `remote_url`
pub const ENV_REMOTE_URL: &str = "HANDSET_REMOTE_URL";
/// Environment variable overriding `security_token`
pub const ENV_SECURITY_TOKEN: &str = "HANDSET_SECURITY_TOKEN";

/// Default session-layer timeout in seconds
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 120;

/// Device session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// WebDriver hub URL
    pub remote_url: Option<String>,
    /// Device cloud security token
    pub security_token: Option<String>,
    /// Desired capabilities sent when the session is created
    pub capabilities: BTreeMap<String, serde_json::Value>,
    /// HTTP timeout for a single command, in seconds
    pub command_timeout: u64,
    /// Directory reports are written to
    pub report_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            security_token: None,
            capabilities: BTreeMap::new(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT_SECS,
            report_dir: PathBuf::from("target/handset"),
        }
    }
}

impl SessionConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML
    pub fn from_yaml(text: &str) -> DeviceResult<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Read a YAML file
    pub fn load(path: &Path) -> DeviceResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Apply `HANDSET_REMOTE_URL` and `HANDSET_SECURITY_TOKEN`
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a lookup function
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_REMOTE_URL).filter(|v| !v.is_empty()) {
            self.remote_url = Some(url);
        }
        if let Some(token) = lookup(ENV_SECURITY_TOKEN).filter(|v| !v.is_empty()) {
            self.security_token = Some(token);
        }
        self
    }

    /// Set the hub URL
    #[must_use]
    pub fn remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    /// Set the security token
    #[must_use]
    pub fn security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = Some(token.into());
        self
    }

    /// Add a capability
    #[must_use]
    pub fn capability(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.capabilities.insert(name.into(), value.into());
        self
    }

    /// Set the command timeout
    #[must_use]
    pub const fn command_timeout(mut self, seconds: u64) -> Self {
        self.command_timeout = seconds;
        self
    }

    /// Set the report directory
    #[must_use]
    pub fn report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = dir.into();
        self
    }

    /// Command timeout as a duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }

    /// Hub URL without a trailing slash, or an error if unset
    pub fn hub_url(&self) -> DeviceResult<&str> {
        self.remote_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                DeviceError::config(format!(
                    "remote_url is not set (config file or {ENV_REMOTE_URL})"
                ))
            })
    }

    /// Capabilities for session creation, including the security token
    #[must_use]
    pub fn session_capabilities(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut caps: serde_json::Map<String, serde_json::Value> = self
            .capabilities
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(token) = &self.security_token {
            caps.insert("securityToken".to_string(), token.clone().into());
        }
        caps
    }
}
