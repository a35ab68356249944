use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw response of the headlines endpoint. Only `articles` is ever looked at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewsPayload(pub serde_json::Value);

impl NewsPayload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Number of entries in `articles`, or 0 when it is missing or not a list.
    pub fn article_count(&self) -> usize {
        self.0
            .get("articles")
            .and_then(|v| v.as_array())
            .map(|a| a.len())
            .unwrap_or(0)
    }

    /// Bytes exactly as they are archived in the object store.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        crate::utils::json::to_python_json_vec(&self.0)
    }
}

/// One entry of an object-store listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub size: i64,
}

impl ObjectSummary {
    /// Last path segment of the key, used as the local file name.
    pub fn basename(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

pub const RAW_KEY_TIMESTAMP_FORMAT: &str = "%Y_%m_%dT%H_%M_%S";

/// `<prefix>news_<UTC timestamp>.json`, second precision.
pub fn raw_object_key(prefix: &str, timestamp: DateTime<Utc>) -> String {
    let prefix = if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    };
    format!(
        "{}news_{}.json",
        prefix,
        timestamp.format(RAW_KEY_TIMESTAMP_FORMAT)
    )
}

/// Picks the most recently modified object. Ties resolve to whichever the
/// listing returned last.
pub fn latest_object(objects: &[ObjectSummary]) -> Option<&ObjectSummary> {
    objects.iter().max_by_key(|o| o.last_modified)
}
