// src/pipeline/sync.rs

//! One incremental sync run.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;

use crate::error::{Result, StageExt};
use crate::models::{SyncConfig, Watermark};
use crate::pipeline::borders::collect_border_records;
use crate::pipeline::events::collect_new_events;
use crate::pipeline::persist::{IncrementalWriter, PersistOutcome};
use crate::services::RankingSource;
use crate::storage::{Layout, Storage};
use crate::utils::log::{step, summary};

const TOTAL_STEPS: usize = 5;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub previous: Watermark,
    pub new_events: Vec<u32>,
    pub fetched_events: Vec<u32>,
    pub records_collected: usize,
    pub outcome: PersistOutcome,
}

impl SyncReport {
    pub fn watermark(&self) -> &Watermark {
        &self.outcome.watermark
    }
}

/// Run the sync: read the watermark, pick new events, fetch their border
/// logs together with the watermark event's, write everything and advance
/// the watermark.
///
/// Any error before the final write leaves the stored watermark untouched,
/// so the next run retries the same window.
pub async fn run_sync(
    source: &dyn RankingSource,
    storage: &dyn Storage,
    layout: &Layout,
    config: &SyncConfig,
) -> Result<SyncReport> {
    let start_time = Utc::now();
    let writer = IncrementalWriter::new(storage, layout);

    step(1, TOTAL_STEPS, "Loading watermark");
    let previous = writer.load_watermark().await.stage("fetch latest watermark")?;

    step(2, TOTAL_STEPS, "Listing events");
    let events = source
        .list_events(&config.events_query())
        .await
        .stage("get events")?;
    log::info!("Found {} events of the synced types", events.len());

    step(3, TOTAL_STEPS, "Classifying new events");
    let collected = collect_new_events(source, &events, previous.event_id, config)
        .await
        .stage("collect events")?;

    let mut event_ids: BTreeSet<u32> = collected.iter().map(|e| e.id()).collect();
    if !previous.is_empty() {
        // the watermark event may still be receiving samples
        event_ids.insert(previous.event_id);
    }
    let classified: HashMap<u32, _> = collected.iter().map(|e| (e.id(), e.clone())).collect();

    step(4, TOTAL_STEPS, "Fetching border logs");
    let records = collect_border_records(source, &event_ids, &classified, config).await;

    step(5, TOTAL_STEPS, "Saving results");
    let outcome = writer.persist(&collected, &records, &previous).await?;

    let elapsed = Utc::now() - start_time;
    summary(
        "Sync complete",
        &[
            ("New events", collected.len().to_string()),
            ("Events fetched", event_ids.len().to_string()),
            ("Border records", records.len().to_string()),
            ("Events written", outcome.events_written.to_string()),
            ("Shards created", outcome.shards.created.to_string()),
            ("Shards appended", outcome.shards.appended.to_string()),
            ("Rows written", outcome.shards.rows_written.to_string()),
            (
                "Watermark",
                format!("{} -> {}", previous.event_id, outcome.watermark.event_id),
            ),
            ("Elapsed", format!("{}ms", elapsed.num_milliseconds())),
        ],
    );

    Ok(SyncReport {
        previous,
        new_events: collected.iter().map(|e| e.id()).collect(),
        fetched_events: event_ids.into_iter().collect(),
        records_collected: records.len(),
        outcome,
    })
}
