//! Host configuration.

/// Configuration applied when a host is launched.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HostConfig {
    /// Name given to the launcher thread that drives stage transitions.
    ///
    /// Linux truncates thread names to 15 bytes.
    pub launcher_thread_name: String,
    /// Log filter used when `RUST_LOG` is unset.
    pub default_log_filter: String,
    /// Spawns a background deadlock detector in debug builds.
    pub deadlock_detection: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            launcher_thread_name: "bridgeway-main".to_string(),
            default_log_filter: "error,bridgeway=info".to_string(),
            deadlock_detection: true,
        }
    }
}

#[cfg(feature = "serde")]
impl HostConfig {
    /// Parses a JSON document, filling missing fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self, crate::error::ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
