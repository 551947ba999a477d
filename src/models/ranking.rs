//! Ranking borders and ranking logs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ranking kind, as used in ranking log URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RankingType {
    EventPoint,
    HighScore,
    HighScore2,
    HighScoreTotal,
    LoungePoint,
    IdolPoint,
}

impl RankingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EventPoint => "eventPoint",
            Self::HighScore => "highScore",
            Self::HighScore2 => "highScore2",
            Self::HighScoreTotal => "highScoreTotal",
            Self::LoungePoint => "loungePoint",
            Self::IdolPoint => "idolPoint",
        }
    }
}

impl fmt::Display for RankingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borders exposed for one idol in an anniversary event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdolPointBorders {
    pub idol_id: u32,
    #[serde(default)]
    pub borders: Vec<u32>,
}

/// Response of `GET /events/{id}/rankings/borders`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingBorders {
    #[serde(default)]
    pub event_point: Vec<u32>,
    #[serde(default)]
    pub high_score: Vec<u32>,
    #[serde(default)]
    pub lounge_point: Vec<u32>,
    #[serde(default)]
    pub idol_point: Vec<IdolPointBorders>,
}

/// One aggregated score sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingPoint {
    pub score: i64,
    pub aggregated_at: DateTime<Utc>,
}

/// Score history for one rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingLog {
    pub rank: u32,
    #[serde(default)]
    pub data: Vec<RankingPoint>,
}

/// Optional filters for ranking log requests.
#[derive(Debug, Clone, Default)]
pub struct RankingLogsOptions {
    /// Only samples aggregated after this instant
    pub since: Option<DateTime<Utc>>,
    /// ETag of a previous response
    pub if_none_match: Option<String>,
}

/// Whether `available` contains every border in `required`.
pub fn covers(available: &[u32], required: &[u32]) -> bool {
    required.iter().all(|border| available.contains(border))
}
