// src/pipeline/persist.rs

//! Incremental writer for the event log, border shards and watermark.
//!
//! Every object is rewritten whole: an existing CSV object is decoded,
//! new rows are appended in memory and the result is encoded again with a
//! single header. Objects are never spliced as text.

use std::collections::{BTreeMap, HashSet};

use serde::{Serialize, de::DeserializeOwned};

use crate::error::{AppError, Result, StageExt};
use crate::models::{BorderRecord, CollectedEvent, EventRecord, ShardKey, Watermark};
use crate::storage::{CSV_CONTENT_TYPE, Layout, Storage, read_json, write_json};

/// What a border shard write did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardStats {
    pub created: usize,
    pub appended: usize,
    pub unchanged: usize,
    pub rows_written: usize,
    /// Rows of events older than the watermark event
    pub rows_dropped: usize,
}

/// Result of a successful persist.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistOutcome {
    pub watermark: Watermark,
    pub events_written: usize,
    pub shards: ShardStats,
}

/// Writes sync output through a storage backend.
pub struct IncrementalWriter<'a> {
    storage: &'a dyn Storage,
    layout: &'a Layout,
}

impl<'a> IncrementalWriter<'a> {
    pub fn new(storage: &'a dyn Storage, layout: &'a Layout) -> Self {
        Self { storage, layout }
    }

    /// Read the persisted watermark; a missing one is the empty watermark.
    pub async fn load_watermark(&self) -> Result<Watermark> {
        let key = self.layout.watermark_key();
        match read_json::<Watermark>(self.storage, &key).await? {
            Some(watermark) => {
                log::info!(
                    "Loaded watermark: event {} with {} borders from {}",
                    watermark.event_id,
                    watermark.last_aggregated_at_by_border.len(),
                    self.storage.location(&key)
                );
                Ok(watermark)
            }
            None => {
                log::info!("No watermark at {}, starting fresh", self.storage.location(&key));
                Ok(Watermark::default())
            }
        }
    }

    pub async fn save_watermark(&self, watermark: &Watermark) -> Result<()> {
        let key = self.layout.watermark_key();
        write_json(self.storage, &key, watermark).await?;
        log::info!(
            "Saved watermark: event {} to {}",
            watermark.event_id,
            self.storage.location(&key)
        );
        Ok(())
    }

    /// Append events to the event log, skipping ids it already holds.
    pub async fn save_events(&self, events: &[CollectedEvent]) -> Result<usize> {
        if events.is_empty() {
            log::info!("No new events to save");
            return Ok(0);
        }

        let key = self.layout.event_log_key();
        let rows: Vec<EventRecord> = events.iter().map(|e| EventRecord::from(&e.event)).collect();

        let (all_rows, written) = match self.storage.read_bytes(&key).await? {
            None => {
                log::info!(
                    "Saving {} event infos to {} for the first time",
                    rows.len(),
                    self.storage.location(&key)
                );
                let written = rows.len();
                (rows, written)
            }
            Some(bytes) => {
                let mut existing: Vec<EventRecord> = decode_csv(&bytes)?;
                let mut seen: HashSet<u32> = existing.iter().map(|r| r.event_id).collect();
                let fresh: Vec<EventRecord> =
                    rows.into_iter().filter(|r| seen.insert(r.event_id)).collect();
                if fresh.is_empty() {
                    log::info!("Event log already holds every new event");
                    return Ok(0);
                }
                log::info!(
                    "Appending {} event infos to {}",
                    fresh.len(),
                    self.storage.location(&key)
                );
                let written = fresh.len();
                existing.extend(fresh);
                (existing, written)
            }
        };

        self.storage
            .write_bytes(&key, &encode_csv(&all_rows)?, CSV_CONTENT_TYPE)
            .await?;
        Ok(written)
    }

    /// Merge border records into their shards.
    ///
    /// A shard that does not exist yet gets every collected row. An existing
    /// shard only gets rows it does not already hold; for the watermark event
    /// those must also be newer than the watermark timestamp of their border.
    /// Rows of events older than the watermark event are dropped.
    pub async fn save_border_records(
        &self,
        records: &[BorderRecord],
        watermark: &Watermark,
    ) -> Result<ShardStats> {
        let mut stats = ShardStats::default();
        if records.is_empty() {
            log::info!("No border records to save");
            return Ok(stats);
        }

        let mut groups: BTreeMap<ShardKey, Vec<&BorderRecord>> = BTreeMap::new();
        for record in records {
            groups.entry(record.shard_key()).or_default().push(record);
        }

        for (shard, rows) in groups {
            if shard.event_id < watermark.event_id {
                log::warn!(
                    "Skipping border info for event {}, older than watermark event {}",
                    shard.event_id,
                    watermark.event_id
                );
                stats.rows_dropped += rows.len();
                continue;
            }

            let key = self.layout.shard_key(&shard);
            let mut seen = HashSet::new();

            let (all_rows, written) = match self.storage.read_bytes(&key).await? {
                None => {
                    let fresh: Vec<BorderRecord> = rows
                        .into_iter()
                        .filter(|r| seen.insert(r.aggregated_at))
                        .cloned()
                        .collect();
                    stats.created += 1;
                    let written = fresh.len();
                    (fresh, written)
                }
                Some(bytes) => {
                    let mut existing: Vec<BorderRecord> = decode_csv(&bytes)?;
                    seen.extend(existing.iter().map(|r| r.aggregated_at));

                    let cutoff = if shard.event_id == watermark.event_id {
                        watermark.last_aggregated_at(shard.border)
                    } else {
                        None
                    };
                    let fresh: Vec<BorderRecord> = rows
                        .into_iter()
                        .filter(|r| cutoff.is_none_or(|at| r.aggregated_at > at))
                        .filter(|r| seen.insert(r.aggregated_at))
                        .cloned()
                        .collect();

                    if fresh.is_empty() {
                        log::debug!("No new rows for {}", self.storage.location(&key));
                        stats.unchanged += 1;
                        continue;
                    }
                    stats.appended += 1;
                    let written = fresh.len();
                    existing.extend(fresh);
                    (existing, written)
                }
            };

            log::info!(
                "Saving {} border infos for event {} border {}{} to {}",
                written,
                shard.event_id,
                shard.border,
                shard
                    .idol_id
                    .map(|idol| format!(" idol {idol}"))
                    .unwrap_or_default(),
                self.storage.location(&key)
            );
            self.storage
                .write_bytes(&key, &encode_csv(&all_rows)?, CSV_CONTENT_TYPE)
                .await?;
            stats.rows_written += written;
        }

        Ok(stats)
    }

    /// Write event log, then border shards, then the advanced watermark.
    ///
    /// A failure at any step returns before the watermark is written.
    pub async fn persist(
        &self,
        events: &[CollectedEvent],
        records: &[BorderRecord],
        watermark: &Watermark,
    ) -> Result<PersistOutcome> {
        let events_written = self.save_events(events).await.stage("save events")?;
        let shards = self
            .save_border_records(records, watermark)
            .await
            .stage("save borders")?;

        let next = watermark.advance(events, records);
        self.save_watermark(&next).await.stage("save watermark")?;

        Ok(PersistOutcome {
            watermark: next,
            events_written,
            shards,
        })
    }
}

fn encode_csv<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))
}

fn decode_csv<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
