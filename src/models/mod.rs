// src/models/mod.rs

//! Domain models for the sync job.
//!
//! - `event`: events as published by the remote API
//! - `ranking`: ranking borders and score logs
//! - `record`: rows persisted to the event log and border shards
//! - `watermark`: the persisted sync cursor
//! - `config`: application configuration

mod config;
mod event;
mod ranking;
mod record;
mod watermark;

// Re-export all public types
pub use config::{ApiConfig, Config, LoggingConfig, StorageConfig, StorageMode, SyncConfig};
pub use event::{
    Event, EventItem, EventOrder, EventSchedule, EventType, EventsQuery, InternalEventType,
};
pub use ranking::{
    IdolPointBorders, RankingBorders, RankingLog, RankingLogsOptions, RankingPoint, RankingType,
    covers,
};
pub use record::{BorderRecord, CollectedEvent, EventKind, EventRecord, ShardKey};
pub use watermark::Watermark;
