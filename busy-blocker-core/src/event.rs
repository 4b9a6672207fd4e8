//! Provider-neutral event types.
//!
//! Gateways convert their API responses into these types, and the
//! reconciler works exclusively with them.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Private, application-owned key/value tags stored on an event.
///
/// These are invisible to the calendar's users and are the only sync state
/// busy-blocker keeps.
pub type PrivateProperties = BTreeMap<String, String>;

/// A calendar event (provider-neutral)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Provider-assigned identifier, unique within its calendar.
    /// Empty for events that have not been inserted yet.
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,

    /// IANA zone the times were entered in, when the provider reports one.
    /// Instants in `start`/`end` are always UTC; this only affects display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,

    /// Provider display color (Google uses small numeric ids)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,

    #[serde(default, skip_serializing_if = "PrivateProperties::is_empty")]
    pub private_properties: PrivateProperties,

    /// Link back to the application that created the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<EventSource>,
}

impl CalendarEvent {
    /// Looks up a private tag value.
    pub fn private_property(&self, key: &str) -> Option<&str> {
        self.private_properties.get(key).map(String::as_str)
    }

    /// True if every pair in `filter` is present on this event.
    pub fn matches_private_properties(&self, filter: &PrivateProperties) -> bool {
        filter
            .iter()
            .all(|(key, value)| self.private_property(key) == Some(value.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSource {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    /// All-day events carry a calendar date only
    Date(NaiveDate),
}

impl EventTime {
    /// The instant this time refers to; all-day dates start at midnight UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(d) => d.and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }
}

impl std::fmt::Display for EventTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventTime::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event_with(props: &[(&str, &str)]) -> CalendarEvent {
        CalendarEvent {
            id: "evt".to_string(),
            summary: "Standup".to_string(),
            description: None,
            start: EventTime::DateTime(Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()),
            end: EventTime::DateTime(Utc.with_ymd_and_hms(2025, 3, 20, 9, 15, 0).unwrap()),
            time_zone: None,
            color_id: None,
            private_properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            source: None,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(event_with(&[]).matches_private_properties(&PrivateProperties::new()));
    }

    #[test]
    fn filter_requires_every_pair() {
        let event = event_with(&[("owner", "true"), ("link", "123")]);

        let mut filter = PrivateProperties::new();
        filter.insert("owner".into(), "true".into());
        assert!(event.matches_private_properties(&filter));

        filter.insert("link".into(), "999".into());
        assert!(!event.matches_private_properties(&filter));
    }

    #[test]
    fn all_day_date_starts_at_midnight_utc() {
        let time = EventTime::Date(NaiveDate::from_ymd_opt(2025, 3, 20).unwrap());
        assert_eq!(
            time.to_utc(),
            Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap()
        );
        assert_eq!(time.to_string(), "2025-03-20");
    }
}
