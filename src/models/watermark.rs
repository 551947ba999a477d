//! Persisted sync cursor.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{BorderRecord, CollectedEvent};

/// Last fully synced event and, per border, the newest persisted sample.
///
/// Read once when a run starts and written once after every other write
/// has succeeded. Both fields only ever move forward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watermark {
    #[serde(default)]
    pub event_id: u32,
    #[serde(default)]
    pub last_aggregated_at_by_border: BTreeMap<u32, DateTime<Utc>>,
}

impl Watermark {
    /// A watermark that has never been written.
    pub fn is_empty(&self) -> bool {
        self.event_id == 0
    }

    pub fn last_aggregated_at(&self, border: u32) -> Option<DateTime<Utc>> {
        self.last_aggregated_at_by_border.get(&border).copied()
    }

    /// The watermark after a run that collected `events` and `records`.
    ///
    /// Records of events older than the current watermark event are never
    /// persisted, so they do not move the per-border timestamps.
    pub fn advance(&self, events: &[CollectedEvent], records: &[BorderRecord]) -> Self {
        let event_id = events
            .iter()
            .map(CollectedEvent::id)
            .fold(self.event_id, u32::max);

        let mut by_border = self.last_aggregated_at_by_border.clone();
        for record in records.iter().filter(|r| r.event_id >= self.event_id) {
            by_border
                .entry(record.border)
                .and_modify(|at| *at = (*at).max(record.aggregated_at))
                .or_insert(record.aggregated_at);
        }

        Self {
            event_id,
            last_aggregated_at_by_border: by_border,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{Event, EventKind, EventSchedule, EventType, RankingType};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn event(id: u32) -> CollectedEvent {
        CollectedEvent {
            event: Event {
                id,
                event_type: EventType::Theater,
                appeal_type: 0,
                name: format!("event {id}"),
                schedule: EventSchedule {
                    begin_at: at(0),
                    end_at: at(23),
                    page_opened_at: None,
                    page_closed_at: None,
                    boost_begin_at: None,
                    boost_end_at: None,
                },
                item: None,
            },
            kind: EventKind::Normal,
        }
    }

    fn record(border: u32, hour: u32) -> BorderRecord {
        BorderRecord {
            event_id: 12,
            border,
            idol_id: None,
            ranking_type: RankingType::EventPoint,
            aggregated_at: at(hour),
            score: 1,
        }
    }

    #[test]
    fn test_advance_takes_maxima() {
        let previous = Watermark {
            event_id: 10,
            last_aggregated_at_by_border: BTreeMap::from([(100, at(5))]),
        };

        let next = previous.advance(
            &[event(11), event(12)],
            &[record(100, 7), record(100, 6), record(2500, 3)],
        );

        assert_eq!(next.event_id, 12);
        assert_eq!(next.last_aggregated_at(100), Some(at(7)));
        assert_eq!(next.last_aggregated_at(2500), Some(at(3)));
    }

    #[test]
    fn test_advance_never_regresses() {
        let previous = Watermark {
            event_id: 10,
            last_aggregated_at_by_border: BTreeMap::from([(100, at(9))]),
        };

        let next = previous.advance(&[event(3)], &[record(100, 2)]);

        assert_eq!(next.event_id, 10);
        assert_eq!(next.last_aggregated_at(100), Some(at(9)));
    }

    #[test]
    fn test_advance_ignores_records_of_older_events() {
        let previous = Watermark {
            event_id: 10,
            last_aggregated_at_by_border: BTreeMap::from([(100, at(5))]),
        };
        let mut stale = record(100, 20);
        stale.event_id = 9;

        let next = previous.advance(&[], &[stale]);

        assert_eq!(next, previous);
    }

    #[test]
    fn test_json_shape() {
        let watermark = Watermark {
            event_id: 7,
            last_aggregated_at_by_border: BTreeMap::from([(100, at(1))]),
        };

        let json = serde_json::to_value(&watermark).unwrap();
        assert_eq!(json["event_id"], 7);
        assert_eq!(
            json["last_aggregated_at_by_border"]["100"],
            "2024-05-01T01:00:00Z"
        );

        let back: Watermark = serde_json::from_value(json).unwrap();
        assert_eq!(back, watermark);
    }

    #[test]
    fn test_missing_fields_default() {
        let watermark: Watermark = serde_json::from_str("{}").unwrap();
        assert!(watermark.is_empty());
    }
}
