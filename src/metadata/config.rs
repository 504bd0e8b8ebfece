use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for page-metadata extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Give up on a page after this many milliseconds (default: 4000)
    pub timeout_ms: u64,

    /// Number of parsed pages kept in memory (default: 256)
    pub parse_cache_capacity: u64,

    /// Host that marks "no real URL yet"; never fetched (default: localhost)
    pub placeholder_host: String,

    /// HTML beyond this many bytes is not downloaded (default: 2 MiB)
    pub max_body_bytes: usize,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 4000,
            parse_cache_capacity: 256,
            placeholder_host: "localhost".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl MetadataConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
