// src/pipeline/mirror.rs

//! Copies stored objects from one backend into another, usually the
//! object store into a local directory.

use crate::error::{Result, StageExt};
use crate::storage::{Storage, content_type_for};
use crate::utils::log::summary;

/// What a mirror run copied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorStats {
    pub listed: usize,
    pub copied: usize,
    pub failed: usize,
    pub bytes: u64,
}

/// Copy every object under `prefix` from `source` to `dest`, keeping keys.
///
/// A listing failure aborts; a single object that cannot be read or written
/// is logged and skipped.
pub async fn mirror_objects(
    source: &dyn Storage,
    dest: &dyn Storage,
    prefix: &str,
) -> Result<MirrorStats> {
    let keys = source.list_keys(prefix).await.stage("list objects")?;
    let mut stats = MirrorStats {
        listed: keys.len(),
        ..MirrorStats::default()
    };
    log::info!("Found {} objects under {}", keys.len(), source.location(prefix));

    for key in keys {
        log::info!("Downloading: {}", source.location(&key));
        let bytes = match source.read_bytes(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::warn!("Object {} vanished before download", source.location(&key));
                stats.failed += 1;
                continue;
            }
            Err(e) => {
                log::warn!("Failed to download {}: {}", source.location(&key), e);
                stats.failed += 1;
                continue;
            }
        };

        if let Err(e) = dest.write_bytes(&key, &bytes, content_type_for(&key)).await {
            log::warn!("Failed to write {}: {}", dest.location(&key), e);
            stats.failed += 1;
            continue;
        }
        stats.copied += 1;
        stats.bytes += bytes.len() as u64;
    }

    summary(
        "Mirror complete",
        &[
            ("Listed", stats.listed.to_string()),
            ("Copied", stats.copied.to_string()),
            ("Failed", stats.failed.to_string()),
            ("Bytes", stats.bytes.to_string()),
        ],
    );
    Ok(stats)
}
