//! In-memory `RankingSource` for pipeline tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::error::{AppError, Result};
use crate::models::{
    Event, EventSchedule, EventType, EventsQuery, IdolPointBorders, RankingBorders, RankingLog,
    RankingLogsOptions, RankingPoint, RankingType,
};
use crate::services::RankingSource;

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(hour as i64)
}

pub fn event(id: u32, event_type: EventType) -> Event {
    Event {
        id,
        event_type,
        appeal_type: 0,
        name: format!("event {id}"),
        schedule: EventSchedule {
            begin_at: at(0),
            end_at: at(192),
            page_opened_at: None,
            page_closed_at: None,
            boost_begin_at: Some(at(96)),
            boost_end_at: None,
        },
        item: None,
    }
}

/// `(hour, score)` samples as a single ranking log.
pub fn log_of(border: u32, samples: &[(u32, i64)]) -> Vec<RankingLog> {
    vec![RankingLog {
        rank: border,
        data: samples
            .iter()
            .map(|&(hour, score)| RankingPoint {
                score,
                aggregated_at: at(hour),
            })
            .collect(),
    }]
}

#[derive(Default)]
pub struct FakeSource {
    events: Vec<Event>,
    borders: HashMap<u32, RankingBorders>,
    logs: HashMap<(u32, u32), Vec<RankingLog>>,
    idol_logs: HashMap<(u32, u32), BTreeMap<u32, Vec<RankingLog>>>,
    failing_logs: HashSet<(u32, u32)>,
    border_requests: Mutex<Vec<u32>>,
    log_requests: Mutex<Vec<(u32, RankingType, u32)>>,
    idol_requests: Mutex<Vec<(u32, u32, Vec<u32>)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }

    pub fn with_borders(mut self, event_id: u32, event_point: Vec<u32>) -> Self {
        self.borders.insert(
            event_id,
            RankingBorders {
                event_point,
                ..RankingBorders::default()
            },
        );
        self
    }

    pub fn with_idol_borders(mut self, event_id: u32, idol_point: Vec<IdolPointBorders>) -> Self {
        self.borders.insert(
            event_id,
            RankingBorders {
                idol_point,
                ..RankingBorders::default()
            },
        );
        self
    }

    pub fn with_logs(mut self, event_id: u32, border: u32, samples: &[(u32, i64)]) -> Self {
        self.logs.insert((event_id, border), log_of(border, samples));
        self
    }

    pub fn with_idol_logs(
        mut self,
        event_id: u32,
        border: u32,
        idol_id: u32,
        samples: &[(u32, i64)],
    ) -> Self {
        self.idol_logs
            .entry((event_id, border))
            .or_default()
            .insert(idol_id, log_of(border, samples));
        self
    }

    pub fn with_failing_logs(mut self, event_id: u32, border: u32) -> Self {
        self.failing_logs.insert((event_id, border));
        self
    }

    pub fn border_requests(&self) -> Vec<u32> {
        self.border_requests.lock().unwrap().clone()
    }

    pub fn log_requests(&self) -> Vec<(u32, RankingType, u32)> {
        self.log_requests.lock().unwrap().clone()
    }

    /// `(event, border, idol ids)` of every idol log request.
    pub fn idol_requests(&self) -> Vec<(u32, u32, Vec<u32>)> {
        self.idol_requests.lock().unwrap().clone()
    }

    fn not_found(path: String) -> AppError {
        AppError::Api {
            status: 404,
            url: path,
        }
    }
}

#[async_trait]
impl RankingSource for FakeSource {
    async fn list_events(&self, _query: &EventsQuery) -> Result<Vec<Event>> {
        Ok(self.events.clone())
    }

    async fn get_event(&self, event_id: u32) -> Result<Event> {
        self.events
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("/events/{event_id}")))
    }

    async fn get_ranking_borders(&self, event_id: u32) -> Result<RankingBorders> {
        self.border_requests.lock().unwrap().push(event_id);
        self.borders
            .get(&event_id)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("/events/{event_id}/rankings/borders")))
    }

    async fn get_ranking_logs(
        &self,
        event_id: u32,
        ranking_type: RankingType,
        border: u32,
        _options: Option<&RankingLogsOptions>,
    ) -> Result<Vec<RankingLog>> {
        self.log_requests
            .lock()
            .unwrap()
            .push((event_id, ranking_type, border));
        if self.failing_logs.contains(&(event_id, border)) {
            return Err(AppError::Api {
                status: 500,
                url: format!("/events/{event_id}/rankings/{ranking_type}/logs/{border}"),
            });
        }
        Ok(self.logs.get(&(event_id, border)).cloned().unwrap_or_default())
    }

    async fn get_idol_ranking_logs(
        &self,
        event_id: u32,
        border: u32,
        idol_ids: &[u32],
        _options: Option<&RankingLogsOptions>,
    ) -> Result<BTreeMap<u32, Vec<RankingLog>>> {
        self.log_requests
            .lock()
            .unwrap()
            .push((event_id, RankingType::IdolPoint, border));
        self.idol_requests
            .lock()
            .unwrap()
            .push((event_id, border, idol_ids.to_vec()));
        if self.failing_logs.contains(&(event_id, border)) {
            return Err(AppError::Api {
                status: 500,
                url: format!("/events/{event_id}/rankings/idolPoint/logs/{border}"),
            });
        }
        Ok(self
            .idol_logs
            .get(&(event_id, border))
            .map(|by_idol| {
                by_idol
                    .iter()
                    .filter(|(idol_id, _)| idol_ids.contains(idol_id))
                    .map(|(idol_id, logs)| (*idol_id, logs.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
