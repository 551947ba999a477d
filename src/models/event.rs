//! Event data as published by the remote source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event category as numbered by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum EventType {
    ShowTime,
    MilliColle1,
    Theater,
    Tour,
    Anniversary,
    Working,
    AprilFool,
    GameCorner,
    MilliColle2,
    TwinStage1,
    Tune,
    TwinStage2,
    Tale,
    TalkParty,
    Other(u8),
}

impl EventType {
    pub fn code(self) -> u8 {
        match self {
            Self::ShowTime => 1,
            Self::MilliColle1 => 2,
            Self::Theater => 3,
            Self::Tour => 4,
            Self::Anniversary => 5,
            Self::Working => 6,
            Self::AprilFool => 7,
            Self::GameCorner => 8,
            Self::MilliColle2 => 9,
            Self::TwinStage1 => 10,
            Self::Tune => 11,
            Self::TwinStage2 => 12,
            Self::Tale => 13,
            Self::TalkParty => 14,
            Self::Other(code) => code,
        }
    }

    /// Anniversary events rank per idol instead of per event.
    pub fn is_anniversary(self) -> bool {
        self == Self::Anniversary
    }
}

impl From<u8> for EventType {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::ShowTime,
            2 => Self::MilliColle1,
            3 => Self::Theater,
            4 => Self::Tour,
            5 => Self::Anniversary,
            6 => Self::Working,
            7 => Self::AprilFool,
            8 => Self::GameCorner,
            9 => Self::MilliColle2,
            10 => Self::TwinStage1,
            11 => Self::Tune,
            12 => Self::TwinStage2,
            13 => Self::Tale,
            14 => Self::TalkParty,
            other => Self::Other(other),
        }
    }
}

impl From<EventType> for u8 {
    fn from(value: EventType) -> Self {
        value.code()
    }
}

/// Finer event category used in the event log.
///
/// The remote API groups several platinum-star formats under one type;
/// they are told apart by the event name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalEventType {
    Remote(EventType),
    TheaterSpecial,
    Tiara,
    Trust13,
    TrustBot,
    TrustSpecial,
    Trust,
    TourSpecial,
    TourBingoSpecial,
    TourBingo,
    Team,
    Time,
}

/// Longer prefixes first; "トラスト13" must win over "トラスト".
const THEATER_PREFIXES: &[(&str, InternalEventType)] = &[
    ("プラチナスターシアタースペシャル", InternalEventType::TheaterSpecial),
    ("プラチナスターティアラ", InternalEventType::Tiara),
    ("プラチナスタートラスト13", InternalEventType::Trust13),
    ("プラチナスタートラストBOT", InternalEventType::TrustBot),
    ("プラチナスタートラストスペシャル", InternalEventType::TrustSpecial),
    ("プラチナスタートラスト", InternalEventType::Trust),
];

const TOUR_PREFIXES: &[(&str, InternalEventType)] = &[
    ("プラチナスターツアースペシャル", InternalEventType::TourSpecial),
    ("プラチナスターツアービンゴスペシャル", InternalEventType::TourBingoSpecial),
    ("プラチナスターツアービンゴ", InternalEventType::TourBingo),
];

const TALE_PREFIXES: &[(&str, InternalEventType)] = &[
    ("プラチナスターチーム", InternalEventType::Team),
    ("プラチナスタータイム", InternalEventType::Time),
];

impl InternalEventType {
    /// Classify an event by its remote type and name.
    pub fn of(event_type: EventType, name: &str) -> Self {
        let prefixes = match event_type {
            EventType::Theater => THEATER_PREFIXES,
            EventType::Tour => TOUR_PREFIXES,
            EventType::Tale => TALE_PREFIXES,
            _ => &[],
        };

        prefixes
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map(|(_, internal)| *internal)
            .unwrap_or(Self::Remote(event_type))
    }

    /// Stable numeric code; remote types keep their own numbers.
    pub fn code(self) -> u8 {
        match self {
            Self::Remote(event_type) => event_type.code(),
            Self::TheaterSpecial => 15,
            Self::Tiara => 16,
            Self::Trust13 => 17,
            Self::TrustBot => 18,
            Self::TrustSpecial => 19,
            Self::Trust => 20,
            Self::TourSpecial => 21,
            Self::TourBingoSpecial => 22,
            Self::TourBingo => 23,
            Self::Team => 24,
            Self::Time => 25,
        }
    }
}

/// Event schedule timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSchedule {
    pub begin_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub page_opened_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub page_closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub boost_begin_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub boost_end_at: Option<DateTime<Utc>>,
}

/// Event item (currency) names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_name: String,
}

/// An event as returned by `GET /events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: u32,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub appeal_type: u8,
    pub name: String,
    pub schedule: EventSchedule,
    #[serde(default)]
    pub item: Option<EventItem>,
}

impl Event {
    pub fn internal_type(&self) -> InternalEventType {
        InternalEventType::of(self.event_type, &self.name)
    }
}

/// Sort key accepted by the `orderBy` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrder {
    IdAsc,
    IdDesc,
    TypeAsc,
    TypeDesc,
    BeginAtAsc,
    BeginAtDesc,
}

impl EventOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IdAsc => "id",
            Self::IdDesc => "id!",
            Self::TypeAsc => "type",
            Self::TypeDesc => "type!",
            Self::BeginAtAsc => "beginAt",
            Self::BeginAtDesc => "beginAt!",
        }
    }
}

/// Filter for `GET /events`.
#[derive(Debug, Clone, Default)]
pub struct EventsQuery {
    /// Only events running at this instant
    pub at: Option<DateTime<Utc>>,
    pub types: Vec<EventType>,
    pub order_by: Vec<EventOrder>,
}

impl EventsQuery {
    /// Query parameters in request order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(at) = self.at {
            params.push(("at", at.to_rfc3339()));
        }
        if !self.types.is_empty() {
            let types: Vec<String> = self.types.iter().map(|t| t.code().to_string()).collect();
            params.push(("type", types.join(",")));
        }
        if !self.order_by.is_empty() {
            let order: Vec<&str> = self.order_by.iter().map(|o| o.as_str()).collect();
            params.push(("orderBy", order.join(",")));
        }
        params
    }
}
