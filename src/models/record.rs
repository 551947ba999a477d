//! Rows written to the event log and border shards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::Event;
use super::ranking::RankingType;

/// How an event's rankings are collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// One event-point ranking for the whole event
    Normal,
    /// One idol-point ranking per participating idol
    Anniversary { idol_ids: Vec<u32> },
}

/// An event that passed the border whitelist checks.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedEvent {
    pub event: Event,
    pub kind: EventKind,
}

impl CollectedEvent {
    pub fn id(&self) -> u32 {
        self.event.id
    }
}

/// One row of `event_info_all.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: u32,
    pub event_type: u8,
    pub internal_event_type: u8,
    pub name: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub boost_at: Option<DateTime<Utc>>,
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.id,
            event_type: event.event_type.code(),
            internal_event_type: event.internal_type().code(),
            name: event.name.clone(),
            start_at: event.schedule.begin_at,
            end_at: event.schedule.end_at,
            boost_at: event.schedule.boost_begin_at,
        }
    }
}

/// Identifies the shard a border record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardKey {
    pub event_id: u32,
    pub border: u32,
    pub idol_id: Option<u32>,
}

/// One observed border score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderRecord {
    pub event_id: u32,
    pub border: u32,
    pub idol_id: Option<u32>,
    pub ranking_type: RankingType,
    pub aggregated_at: DateTime<Utc>,
    pub score: i64,
}

impl BorderRecord {
    pub fn shard_key(&self) -> ShardKey {
        ShardKey {
            event_id: self.event_id,
            border: self.border,
            idol_id: self.idol_id,
        }
    }
}
