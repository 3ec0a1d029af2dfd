//! Registry configuration
//!
//! Controls what the registry logs. Nothing here changes definition,
//! access or validation semantics.

use serde::{Deserialize, Serialize};

use crate::observability::Severity;

/// Configuration for a `ClassRegistry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Events below this severity are dropped.
    pub min_log_severity: Severity,
    /// Log every refused accessor/mutator call.
    pub log_access_denials: bool,
    /// Log each `validate()` run that produced failure messages.
    pub log_validation_failures: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            min_log_severity: Severity::Warn,
            log_access_denials: true,
            log_validation_failures: false,
        }
    }
}

impl RegistryConfig {
    /// Only errors reach the log.
    pub fn quiet() -> Self {
        Self {
            min_log_severity: Severity::Error,
            log_access_denials: false,
            log_validation_failures: false,
        }
    }

    /// Definition-phase milestones, denials and validation failures.
    pub fn verbose() -> Self {
        Self {
            min_log_severity: Severity::Trace,
            log_access_denials: true,
            log_validation_failures: true,
        }
    }

    /// Parse from a JSON document; missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether an event of `severity` is emitted.
    pub fn logs(&self, severity: Severity) -> bool {
        severity >= self.min_log_severity
    }
}
