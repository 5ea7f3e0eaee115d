// Batch Configuration
//
// Segment size, batch deadline and segment parallelism, loaded from code or
// environment variables.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of items per segment
pub const DEFAULT_SEGMENT_SIZE: usize = 100;

/// Deadline for a whole batch
///
/// Serialized as milliseconds; any negative value means [`BatchTimeout::Never`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum BatchTimeout {
    #[default]
    Never,
    After(Duration),
}

impl BatchTimeout {
    pub fn duration(&self) -> Option<Duration> {
        match self {
            BatchTimeout::Never => None,
            BatchTimeout::After(duration) => Some(*duration),
        }
    }
}

impl From<i64> for BatchTimeout {
    fn from(millis: i64) -> Self {
        match u64::try_from(millis) {
            Ok(millis) => BatchTimeout::After(Duration::from_millis(millis)),
            Err(_) => BatchTimeout::Never,
        }
    }
}

impl From<BatchTimeout> for i64 {
    fn from(timeout: BatchTimeout) -> Self {
        match timeout {
            BatchTimeout::Never => -1,
            BatchTimeout::After(duration) => i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
        }
    }
}

/// Batch runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Items per segment, at least 1
    #[serde(default = "default_segment_size")]
    pub segment_size: usize,

    /// Deadline for the whole batch
    #[serde(rename = "timeout_ms", default)]
    pub timeout: BatchTimeout,

    /// Segments running at once; `None` runs every segment at once
    #[serde(default)]
    pub max_parallel_segments: Option<usize>,
}

fn default_segment_size() -> usize {
    DEFAULT_SEGMENT_SIZE
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            segment_size: DEFAULT_SEGMENT_SIZE,
            timeout: BatchTimeout::Never,
            max_parallel_segments: None,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `RULEFN_BATCH_SEGMENT_SIZE`: Items per segment (default: 100)
    /// - `RULEFN_BATCH_TIMEOUT_MS`: Batch deadline in milliseconds, negative for none (default: -1)
    /// - `RULEFN_BATCH_MAX_PARALLEL`: Segments running at once (default: unlimited)
    pub fn from_env() -> Self {
        let segment_size = env::var("RULEFN_BATCH_SEGMENT_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_SEGMENT_SIZE)
            .max(1);

        let timeout = env::var("RULEFN_BATCH_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .map(BatchTimeout::from)
            .unwrap_or_default();

        let max_parallel_segments = env::var("RULEFN_BATCH_MAX_PARALLEL")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|n| n.max(1));

        Self {
            segment_size,
            timeout,
            max_parallel_segments,
        }
    }

    /// Set items per segment
    pub fn with_segment_size(mut self, size: usize) -> Self {
        self.segment_size = size.max(1);
        self
    }

    /// Set the batch deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = BatchTimeout::After(timeout);
        self
    }

    /// Remove the batch deadline
    pub fn without_timeout(mut self) -> Self {
        self.timeout = BatchTimeout::Never;
        self
    }

    /// Set how many segments may run at once
    pub fn with_max_parallel_segments(mut self, max: usize) -> Self {
        self.max_parallel_segments = Some(max.max(1));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = BatchConfig::default();
        assert_eq!(config.segment_size, 100);
        assert_eq!(config.timeout, BatchTimeout::Never);
        assert_eq!(config.max_parallel_segments, None);
    }

    #[test]
    fn test_config_builder() {
        let config = BatchConfig::new()
            .with_segment_size(0)
            .with_timeout(Duration::from_secs(2))
            .with_max_parallel_segments(4);

        assert_eq!(config.segment_size, 1);
        assert_eq!(config.timeout.duration(), Some(Duration::from_secs(2)));
        assert_eq!(config.max_parallel_segments, Some(4));
        assert_eq!(config.without_timeout().timeout, BatchTimeout::Never);
    }

    #[test]
    fn test_timeout_serde() {
        let config: BatchConfig =
            serde_json::from_value(json!({"segment_size": 10, "timeout_ms": 1500})).unwrap();
        assert_eq!(config.timeout, BatchTimeout::After(Duration::from_millis(1500)));

        let config: BatchConfig = serde_json::from_value(json!({"timeout_ms": -1})).unwrap();
        assert_eq!(config.timeout, BatchTimeout::Never);
        assert_eq!(config.segment_size, 100);

        let value = serde_json::to_value(BatchConfig::default()).unwrap();
        assert_eq!(value["timeout_ms"], json!(-1));
    }
}
