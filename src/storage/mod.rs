//! Storage abstractions for sync output.
//!
//! Both backends are flat key/value stores of whole objects; the
//! incremental writer decides what goes into each object.
//!
//! ## Layout
//!
//! ```text
//! {root or bucket prefix}/
//! ├── metadata/
//! │   └── latest_event_border_info.json   # Watermark
//! ├── event_info/
//! │   └── event_info_all.csv              # One row per synced event
//! └── border_info/
//!     ├── border_info_{event}_{border}.csv
//!     └── border_info_{event}_{border}_{idol}.csv
//! ```

pub mod local;
pub mod paths;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
pub use paths::Layout;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type to store a key with, by extension.
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext) {
        Some("csv") => CSV_CONTENT_TYPE,
        Some("json") => JSON_CONTENT_TYPE,
        _ => BINARY_CONTENT_TYPE,
    }
}

/// Trait for output storage backends.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a whole object, `None` if it does not exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace a whole object.
    async fn write_bytes(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// Whether an object exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Every key starting with `prefix`, relative to the backend root, sorted.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Human-readable location of a key, for logs.
    fn location(&self, key: &str) -> String;

    /// Create whatever the layout needs before the first write.
    async fn prepare(&self, _layout: &Layout) -> Result<()> {
        Ok(())
    }
}

/// Read and decode a JSON object.
pub async fn read_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Result<Option<T>> {
    match storage.read_bytes(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON object.
pub async fn write_json<T: Serialize + ?Sized>(storage: &dyn Storage, key: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    storage.write_bytes(key, &bytes, JSON_CONTENT_TYPE).await
}
