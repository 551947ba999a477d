// src/pipeline/events.rs

//! Selects the events a run has to sync.

use crate::error::{AppError, Result};
use crate::models::{CollectedEvent, Event, EventKind, RankingBorders, SyncConfig, covers};
use crate::services::RankingSource;

/// Decide whether an event's exposed borders are supported.
///
/// Returns `Ok(None)` for unsupported events and an integrity error when an
/// anniversary event does not rank exactly the configured number of idols.
pub fn classify_event(
    event: &Event,
    borders: &RankingBorders,
    config: &SyncConfig,
) -> Result<Option<EventKind>> {
    if !event.event_type.is_anniversary() {
        let kind = covers(&borders.event_point, &config.supported_borders).then_some(EventKind::Normal);
        return Ok(kind);
    }

    if borders.idol_point.len() != config.anniversary_participants {
        return Err(AppError::integrity(format!(
            "anniversary event {} ranks {} idols, expected {}",
            event.id,
            borders.idol_point.len(),
            config.anniversary_participants
        )));
    }

    let supported = borders
        .idol_point
        .iter()
        .all(|idol| covers(&idol.borders, &config.anniversary_borders));

    Ok(supported.then(|| EventKind::Anniversary {
        idol_ids: borders.idol_point.iter().map(|idol| idol.idol_id).collect(),
    }))
}

/// Collect supported events newer than `last_event_id`, in input order.
///
/// A failed border lookup skips that event; an integrity violation aborts.
pub async fn collect_new_events(
    source: &dyn RankingSource,
    events: &[Event],
    last_event_id: u32,
    config: &SyncConfig,
) -> Result<Vec<CollectedEvent>> {
    let mut collected = Vec::new();

    for event in events.iter().filter(|e| e.id > last_event_id) {
        let borders = match source.get_ranking_borders(event.id).await {
            Ok(borders) => borders,
            Err(e) => {
                log::warn!("Failed to get borders for event {}: {}", event.id, e);
                continue;
            }
        };

        match classify_event(event, &borders, config)? {
            Some(kind) => {
                log::info!("Collected info for event {} ({})", event.id, event.name);
                collected.push(CollectedEvent {
                    event: event.clone(),
                    kind,
                });
            }
            None => log::info!("Skipped event {} with name: {}", event.id, event.name),
        }
    }

    Ok(collected)
}
