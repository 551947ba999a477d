//! Sync pipeline.
//!
//! - `events`: pick and classify events newer than the watermark
//! - `borders`: fetch ranking logs as border records
//! - `persist`: merge records into storage and advance the watermark
//! - `sync`: the full run
//! - `mirror`: copy stored objects between backends

pub mod borders;
pub mod events;
pub mod mirror;
pub mod persist;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use borders::collect_border_records;
pub use events::{classify_event, collect_new_events};
pub use mirror::{MirrorStats, mirror_objects};
pub use persist::{IncrementalWriter, PersistOutcome, ShardStats};
pub use sync::{SyncReport, run_sync};
