//! # Service Configuration
//!
//! [`ServiceConfig`] holds the timeouts and the name of a service. It deserializes from
//! any serde format with every field optional; durations are written in milliseconds.
//!
//! ```rust
//! use sta_actor::ServiceConfig;
//! use std::time::Duration;
//!
//! let config = ServiceConfig::default()
//!     .with_name("scope")
//!     .with_timeout(Duration::from_millis(250));
//! assert_eq!(config.timeout, Duration::from_millis(250));
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_NAME: &str = "sta-service";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_millis(5);
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Worker thread name and `service` field of every log line.
    pub name: String,
    /// Bounds both the submission and the completion wait of a request.
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,
    /// How long the worker waits for a caller to take a finished envelope.
    #[serde(rename = "publish_timeout_ms", with = "millis")]
    pub publish_timeout: Duration,
    /// Poll interval used while draining submissions at shutdown.
    #[serde(rename = "drain_timeout_ms", with = "millis")]
    pub drain_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

impl ServiceConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How long the worker offers a result before dropping it.
    pub fn with_publish_timeout(mut self, publish_timeout: Duration) -> Self {
        self.publish_timeout = publish_timeout;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
