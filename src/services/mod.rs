//! Remote data source for events and ranking logs.
//!
//! - `RankingSource`: read-only view of the remote API used by the pipeline
//! - `MatsuriClient`: HTTP implementation with retry on transient failures

mod matsuri;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Event, EventsQuery, RankingBorders, RankingLog, RankingLogsOptions, RankingType};

pub use matsuri::MatsuriClient;

/// Read-only access to events and their ranking history.
#[async_trait]
pub trait RankingSource: Send + Sync {
    /// List events matching the query.
    async fn list_events(&self, query: &EventsQuery) -> Result<Vec<Event>>;

    /// Fetch a single event.
    async fn get_event(&self, event_id: u32) -> Result<Event>;

    /// Borders for which score logs are exposed.
    async fn get_ranking_borders(&self, event_id: u32) -> Result<RankingBorders>;

    /// Score logs of one event-wide ranking at one border.
    async fn get_ranking_logs(
        &self,
        event_id: u32,
        ranking_type: RankingType,
        border: u32,
        options: Option<&RankingLogsOptions>,
    ) -> Result<Vec<RankingLog>>;

    /// Idol-point score logs of `idol_ids` at one border, keyed by idol id.
    ///
    /// An idol whose log cannot be fetched is missing from the map.
    async fn get_idol_ranking_logs(
        &self,
        event_id: u32,
        border: u32,
        idol_ids: &[u32],
        options: Option<&RankingLogsOptions>,
    ) -> Result<BTreeMap<u32, Vec<RankingLog>>>;
}
