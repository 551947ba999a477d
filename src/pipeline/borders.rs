// src/pipeline/borders.rs

//! Fetches ranking logs and flattens them into border records.

use std::collections::{BTreeSet, HashMap};

use crate::models::{BorderRecord, CollectedEvent, EventKind, RankingLog, RankingType, SyncConfig};
use crate::services::RankingSource;

/// Fetch border records for every event in `event_ids`.
///
/// Events classified as anniversary are fetched for their classified idols
/// on the anniversary borders; everything else, including the carried-over
/// watermark event, is fetched as an event-point ranking on the supported
/// borders. A failed fetch is logged and skipped.
pub async fn collect_border_records(
    source: &dyn RankingSource,
    event_ids: &BTreeSet<u32>,
    classified: &HashMap<u32, CollectedEvent>,
    config: &SyncConfig,
) -> Vec<BorderRecord> {
    let mut records = Vec::new();

    for &event_id in event_ids {
        let idol_ids = match classified.get(&event_id).map(|e| &e.kind) {
            Some(EventKind::Anniversary { idol_ids }) => Some(idol_ids.as_slice()),
            _ => None,
        };

        if let Some(idol_ids) = idol_ids {
            for &border in &config.anniversary_borders {
                match source
                    .get_idol_ranking_logs(event_id, border, idol_ids, None)
                    .await
                {
                    Ok(by_idol) => {
                        for (idol_id, logs) in &by_idol {
                            records.extend(flatten(
                                event_id,
                                border,
                                Some(*idol_id),
                                RankingType::IdolPoint,
                                logs,
                            ));
                        }
                    }
                    Err(e) => log::warn!(
                        "Failed to get idol ranking logs for event {} with border {}: {}",
                        event_id,
                        border,
                        e
                    ),
                }
            }
        } else {
            for &border in &config.supported_borders {
                match source
                    .get_ranking_logs(event_id, RankingType::EventPoint, border, None)
                    .await
                {
                    Ok(logs) => records.extend(flatten(
                        event_id,
                        border,
                        None,
                        RankingType::EventPoint,
                        &logs,
                    )),
                    Err(e) => log::warn!(
                        "Failed to get ranking logs for event {} with border {}: {}",
                        event_id,
                        border,
                        e
                    ),
                }
            }
        }
    }

    log::info!(
        "Collected {} border records for {} events",
        records.len(),
        event_ids.len()
    );
    records
}

fn flatten<'a>(
    event_id: u32,
    border: u32,
    idol_id: Option<u32>,
    ranking_type: RankingType,
    logs: &'a [RankingLog],
) -> impl Iterator<Item = BorderRecord> + 'a {
    logs.iter()
        .flat_map(|entry| entry.data.iter())
        .map(move |point| BorderRecord {
            event_id,
            border,
            idol_id,
            ranking_type,
            aggregated_at: point.aggregated_at,
            score: point.score,
        })
}
