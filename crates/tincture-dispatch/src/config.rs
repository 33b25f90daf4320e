//! Dispatcher configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const DEFAULT_MAX_PENDING: usize = 16;
const DEFAULT_THREAD_NAME: &str = "tincture-worker";

/// What `submit` does while another job is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    /// Queue the job behind the running one, first in first out.
    #[default]
    Queue,
    /// Fail with [`DispatchError::Busy`](crate::DispatchError::Busy).
    Reject,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown busy policy '{0}', expected 'queue' or 'reject'")]
pub struct UnknownPolicy(pub String);

impl FromStr for BusyPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queue" => Ok(Self::Queue),
            "reject" => Ok(Self::Reject),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for BusyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queue => f.write_str("queue"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// Settings for one [`Dispatcher`](crate::Dispatcher).
///
/// `Default` honours `TINCTURE_BUSY_POLICY` and `TINCTURE_MAX_PENDING`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub busy_policy: BusyPolicy,
    /// Jobs allowed to wait behind the running one under [`BusyPolicy::Queue`].
    pub max_pending: usize,
    /// Name given to the worker thread.
    pub thread_name: String,
}

impl DispatcherConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_busy_policy(mut self, busy_policy: BusyPolicy) -> Self {
        self.busy_policy = busy_policy;
        self
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            busy_policy: std::env::var("TINCTURE_BUSY_POLICY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            max_pending: std::env::var("TINCTURE_MAX_PENDING")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_PENDING),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}
