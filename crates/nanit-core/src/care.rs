//! Care records returned by the vendor and summaries over them.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::BabyUid;

/// Millilitres per US fluid ounce.
pub const ML_PER_OZ: f64 = 29.5735;

/// A baby registered on the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Baby {
    pub uid: BabyUid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<String>,
}

impl Baby {
    /// First and last name joined, or the uid when the vendor sent no name.
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if name.is_empty() {
            self.uid.to_string()
        } else {
            name
        }
    }
}

/// What a diaper change contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiaperKind {
    Pee,
    Poo,
    Mixed,
    Dry,
    /// A `change_type` this toolkit does not interpret, kept verbatim.
    Other(String),
}

impl DiaperKind {
    /// Parse the vendor's `change_type` value.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "pee" => Self::Pee,
            "poo" => Self::Poo,
            "mixed" => Self::Mixed,
            "dry" => Self::Dry,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pee => "pee",
            Self::Poo => "poo",
            Self::Mixed => "mixed",
            Self::Dry => "dry",
            Self::Other(raw) => raw,
        }
    }

    /// True for changes that include stool.
    pub fn is_dirty(&self) -> bool {
        matches!(self, Self::Poo | Self::Mixed)
    }
}

impl Serialize for DiaperKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// The kind of a logged care event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CareKind {
    DiaperChange { subtype: Option<DiaperKind> },
    BottleFeed { volume_ml: Option<f64> },
    /// An event type this toolkit does not interpret.
    Other { event_type: String },
}

impl CareKind {
    pub const DIAPER_CHANGE: &'static str = "diaper_change";
    pub const BOTTLE_FEED: &'static str = "bottle_feed";

    /// Build a kind from the vendor's flat `type`/`change_type`/`feed_amount` fields.
    pub fn from_wire(event_type: &str, change_type: Option<&str>, feed_amount: Option<f64>) -> Self {
        match event_type {
            Self::DIAPER_CHANGE => CareKind::DiaperChange {
                subtype: change_type.map(DiaperKind::from_wire),
            },
            Self::BOTTLE_FEED => CareKind::BottleFeed {
                volume_ml: feed_amount,
            },
            other => CareKind::Other {
                event_type: other.to_string(),
            },
        }
    }

    /// The vendor's `type` value for this kind.
    pub fn wire_type(&self) -> &str {
        match self {
            CareKind::DiaperChange { .. } => Self::DIAPER_CHANGE,
            CareKind::BottleFeed { .. } => Self::BOTTLE_FEED,
            CareKind::Other { event_type } => event_type,
        }
    }
}

/// An immutable care record from a calendar query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: CareKind,
}

impl CareEvent {
    pub fn is_feed(&self) -> bool {
        matches!(self.kind, CareKind::BottleFeed { .. })
    }

    pub fn is_diaper_change(&self) -> bool {
        matches!(self.kind, CareKind::DiaperChange { .. })
    }

    pub fn feed_volume_ml(&self) -> Option<f64> {
        match self.kind {
            CareKind::BottleFeed { volume_ml } => volume_ml,
            _ => None,
        }
    }

    pub fn diaper_kind(&self) -> Option<&DiaperKind> {
        match &self.kind {
            CareKind::DiaperChange { subtype } => subtype.as_ref(),
            _ => None,
        }
    }
}

/// Totals and recency over a window of care events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareSummary {
    pub feeds: usize,
    pub total_feed_ml: f64,
    pub diaper_changes: usize,
    pub last_feed: Option<DateTime<Utc>>,
    pub last_diaper_change: Option<DateTime<Utc>>,
    /// Most recent poo/mixed change within the last seven days of `now`.
    pub last_dirty_diaper: Option<DateTime<Utc>>,
    pub average_feed_interval_secs: Option<i64>,
    pub average_diaper_interval_secs: Option<i64>,
}

impl CareSummary {
    /// Summarise events that fall at or after `since`; recency fields look at
    /// every event passed in.
    pub fn from_events(events: &[CareEvent], since: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let mut feeds: Vec<&CareEvent> = events
            .iter()
            .filter(|e| e.is_feed() && e.timestamp >= since)
            .collect();
        let mut diapers: Vec<&CareEvent> = events
            .iter()
            .filter(|e| e.is_diaper_change() && e.timestamp >= since)
            .collect();
        feeds.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        diapers.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let last_feed = events
            .iter()
            .filter(|e| e.is_feed())
            .map(|e| e.timestamp)
            .max();

        let last_diaper_change = events
            .iter()
            .filter(|e| e.is_diaper_change())
            .map(|e| e.timestamp)
            .max();

        let week_ago = now - Duration::days(7);
        let last_dirty_diaper = events
            .iter()
            .filter(|e| e.diaper_kind().is_some_and(|k| k.is_dirty()))
            .map(|e| e.timestamp)
            .max()
            .filter(|t| *t >= week_ago);

        Self {
            feeds: feeds.len(),
            total_feed_ml: feeds.iter().filter_map(|e| e.feed_volume_ml()).sum(),
            diaper_changes: diapers.len(),
            last_feed,
            last_diaper_change,
            last_dirty_diaper,
            average_feed_interval_secs: average_interval_secs(&feeds),
            average_diaper_interval_secs: average_interval_secs(&diapers),
        }
    }

    pub fn total_feed_oz(&self) -> f64 {
        self.total_feed_ml / ML_PER_OZ
    }
}

// Expects events sorted newest first.
fn average_interval_secs(events: &[&CareEvent]) -> Option<i64> {
    if events.len() < 2 {
        return None;
    }
    let total: i64 = events
        .windows(2)
        .map(|pair| (pair[0].timestamp - pair[1].timestamp).num_seconds())
        .sum();
    Some(total / (events.len() as i64 - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn feed(id: &str, hour: u32, ml: Option<f64>) -> CareEvent {
        CareEvent {
            id: id.to_string(),
            timestamp: at(hour),
            kind: CareKind::BottleFeed { volume_ml: ml },
        }
    }

    fn diaper(id: &str, hour: u32, kind: DiaperKind) -> CareEvent {
        CareEvent {
            id: id.to_string(),
            timestamp: at(hour),
            kind: CareKind::DiaperChange {
                subtype: Some(kind),
            },
        }
    }

    #[test]
    fn parses_wire_kinds() {
        assert_eq!(
            CareKind::from_wire("diaper_change", Some("mixed"), None),
            CareKind::DiaperChange {
                subtype: Some(DiaperKind::Mixed)
            }
        );
        assert_eq!(
            CareKind::from_wire("bottle_feed", None, Some(120.0)),
            CareKind::BottleFeed {
                volume_ml: Some(120.0)
            }
        );
        let other = CareKind::from_wire("sleep", None, None);
        assert_eq!(other.wire_type(), "sleep");
    }

    #[test]
    fn unknown_change_type_is_kept() {
        let kind = CareKind::from_wire("diaper_change", Some("wet"), None);
        assert_eq!(
            kind,
            CareKind::DiaperChange {
                subtype: Some(DiaperKind::Other("wet".to_string()))
            }
        );
        assert_eq!(
            serde_json::to_value(&kind).unwrap(),
            serde_json::json!({ "type": "diaper_change", "subtype": "wet" })
        );
        assert!(!DiaperKind::from_wire("wet").is_dirty());
    }

    #[test]
    fn summary_counts_window_and_intervals() {
        let events = vec![
            feed("f1", 2, Some(90.0)),
            feed("f2", 5, Some(120.0)),
            feed("f3", 8, None),
            diaper("d1", 3, DiaperKind::Pee),
            diaper("d2", 7, DiaperKind::Poo),
        ];

        let summary = CareSummary::from_events(&events, at(4), at(9));

        assert_eq!(summary.feeds, 2);
        assert_eq!(summary.total_feed_ml, 120.0);
        assert_eq!(summary.diaper_changes, 1);
        assert_eq!(summary.last_feed, Some(at(8)));
        assert_eq!(summary.last_diaper_change, Some(at(7)));
        assert_eq!(summary.last_dirty_diaper, Some(at(7)));
        assert_eq!(summary.average_feed_interval_secs, Some(3 * 3600));
        assert_eq!(summary.average_diaper_interval_secs, None);
    }

    #[test]
    fn stale_dirty_diaper_is_not_reported() {
        let events = vec![diaper("d1", 1, DiaperKind::Mixed)];
        let now = at(1) + Duration::days(8);
        let summary = CareSummary::from_events(&events, at(0), now);
        assert_eq!(summary.last_dirty_diaper, None);
        assert_eq!(summary.last_diaper_change, Some(at(1)));
    }

    #[test]
    fn display_name_falls_back_to_uid() {
        let baby = Baby {
            uid: BabyUid::new("abc123").unwrap(),
            first_name: None,
            last_name: None,
            birthday: None,
        };
        assert_eq!(baby.display_name(), "abc123");

        let named = Baby {
            first_name: Some("Ada".to_string()),
            last_name: Some("L".to_string()),
            ..baby
        };
        assert_eq!(named.display_name(), "Ada L");
    }

    #[test]
    fn ounces_conversion() {
        let summary = CareSummary::from_events(&[feed("f", 1, Some(ML_PER_OZ * 4.0))], at(0), at(2));
        assert!((summary.total_feed_oz() - 4.0).abs() < 1e-9);
    }
}
