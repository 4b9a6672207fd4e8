//! Conversion between Calendar v3 events and core events.

use busy_blocker_core::{CalendarEvent, EventSource, EventTime, GatewayError, PrivateProperties};
use google_calendar::types::EventDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const STATUS_CANCELLED: &str = "cancelled";

pub trait FromGoogle {
    fn from_google(event: google_calendar::types::Event) -> Result<Self, GatewayError>
    where
        Self: Sized;
}

pub trait ToGoogle {
    fn to_google(&self) -> Result<google_calendar::types::Event, GatewayError>;
}

/// The parts of `extendedProperties` busy-blocker reads.
#[derive(Debug, Default, Deserialize)]
struct ExtendedProperties {
    #[serde(default)]
    private: Option<PrivateProperties>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Source {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

impl FromGoogle for CalendarEvent {
    fn from_google(event: google_calendar::types::Event) -> Result<Self, GatewayError> {
        let start = event_time(&event.start)
            .ok_or_else(|| GatewayError::Decode(format!("event {} has no start time", event.id)))?;
        let end = event_time(&event.end)
            .ok_or_else(|| GatewayError::Decode(format!("event {} has no end time", event.id)))?;

        let time_zone = event
            .start
            .as_ref()
            .map(|start| start.time_zone.clone())
            .filter(|zone| !zone.is_empty());

        let private_properties = match &event.extended_properties {
            Some(props) => reshape::<_, ExtendedProperties>(props)?
                .private
                .unwrap_or_default(),
            None => PrivateProperties::new(),
        };

        let source = match &event.source {
            Some(source) => {
                let source: Source = reshape(source)?;
                (!source.url.is_empty()).then(|| EventSource {
                    title: source.title,
                    url: source.url,
                })
            }
            None => None,
        };

        Ok(CalendarEvent {
            id: event.id,
            summary: event.summary,
            description: if event.description.is_empty() {
                None
            } else {
                Some(event.description)
            },
            start,
            end,
            time_zone,
            color_id: if event.color_id.is_empty() {
                None
            } else {
                Some(event.color_id)
            },
            private_properties,
            source,
        })
    }
}

impl ToGoogle for CalendarEvent {
    fn to_google(&self) -> Result<google_calendar::types::Event, GatewayError> {
        let extended_properties = if self.private_properties.is_empty() {
            None
        } else {
            reshape(&json!({ "private": self.private_properties }))?
        };

        let source = match &self.source {
            Some(source) => reshape(&Source {
                title: source.title.clone(),
                url: source.url.clone(),
            })?,
            None => None,
        };

        let zone = self.time_zone.as_deref().unwrap_or_default();

        Ok(google_calendar::types::Event {
            id: self.id.clone(),
            summary: self.summary.clone(),
            description: self.description.clone().unwrap_or_default(),
            start: Some(event_time_to_google(&self.start, zone)),
            end: Some(event_time_to_google(&self.end, zone)),
            color_id: self.color_id.clone().unwrap_or_default(),
            extended_properties,
            source,
            ..Default::default()
        })
    }
}

pub fn is_cancelled(event: &google_calendar::types::Event) -> bool {
    event.status == STATUS_CANCELLED
}

fn event_time(time: &Option<EventDateTime>) -> Option<EventTime> {
    let time = time.as_ref()?;
    match (time.date_time, time.date) {
        (Some(dt), _) => Some(EventTime::DateTime(dt)),
        (None, Some(d)) => Some(EventTime::Date(d)),
        (None, None) => None,
    }
}

fn event_time_to_google(time: &EventTime, zone: &str) -> EventDateTime {
    match time {
        EventTime::DateTime(dt) => EventDateTime {
            date: None,
            date_time: Some(*dt),
            time_zone: zone.to_string(),
        },
        EventTime::Date(d) => EventDateTime {
            date: Some(*d),
            date_time: None,
            time_zone: String::new(),
        },
    }
}

/// Move a value between the client's generated types and ours through its
/// JSON form. Used for the free-form maps the generated types model loosely.
fn reshape<T: Serialize, U: DeserializeOwned>(value: &T) -> Result<U, GatewayError> {
    serde_json::to_value(value)
        .and_then(serde_json::from_value::<U>)
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn google_time(dt: chrono::DateTime<Utc>, zone: &str) -> Option<EventDateTime> {
        Some(EventDateTime {
            date: None,
            date_time: Some(dt),
            time_zone: zone.to_string(),
        })
    }

    fn placeholder() -> CalendarEvent {
        let start = Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap();
        CalendarEvent {
            id: String::new(),
            summary: "Busy".into(),
            description: Some("Created with busy-blocker".into()),
            start: EventTime::DateTime(start),
            end: EventTime::DateTime(start + chrono::Duration::hours(1)),
            time_zone: Some("Europe/Berlin".into()),
            color_id: Some("4".into()),
            private_properties: PrivateProperties::from([
                ("busy-blocker".to_string(), "true".to_string()),
                ("busy-blocker-source-event-id".to_string(), "src-1".to_string()),
            ]),
            source: Some(EventSource {
                title: "busy-blocker".into(),
                url: "https://calendar.example.com/blocker".into(),
            }),
        }
    }

    #[test]
    fn decodes_timed_event() {
        let start = Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap();
        let google = google_calendar::types::Event {
            id: "abc123".into(),
            status: "confirmed".into(),
            summary: "Dentist".into(),
            color_id: "11".into(),
            start: google_time(start, "Europe/Berlin"),
            end: google_time(start + chrono::Duration::hours(1), "Europe/Berlin"),
            ..Default::default()
        };

        let event = CalendarEvent::from_google(google).unwrap();

        assert_eq!(event.id, "abc123");
        assert_eq!(event.start, EventTime::DateTime(start));
        assert_eq!(event.time_zone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(event.color_id.as_deref(), Some("11"));
        assert_eq!(event.description, None);
        assert!(event.private_properties.is_empty());
        assert_eq!(event.source, None);
    }

    #[test]
    fn decodes_all_day_event() {
        let google = google_calendar::types::Event {
            id: "holiday".into(),
            start: Some(EventDateTime {
                date: NaiveDate::from_ymd_opt(2025, 12, 25),
                date_time: None,
                time_zone: String::new(),
            }),
            end: Some(EventDateTime {
                date: NaiveDate::from_ymd_opt(2025, 12, 26),
                date_time: None,
                time_zone: String::new(),
            }),
            ..Default::default()
        };

        let event = CalendarEvent::from_google(google).unwrap();

        assert_eq!(event.summary, "");
        assert_eq!(
            event.end,
            EventTime::Date(NaiveDate::from_ymd_opt(2025, 12, 26).unwrap())
        );
        assert_eq!(event.time_zone, None);
        assert_eq!(event.color_id, None);
    }

    #[test]
    fn missing_times_are_a_decode_error() {
        let google = google_calendar::types::Event {
            id: "broken".into(),
            ..Default::default()
        };
        let err = CalendarEvent::from_google(google).unwrap_err();
        assert!(matches!(err, GatewayError::Decode(msg) if msg.contains("broken")));
    }

    #[test]
    fn placeholder_survives_the_trip_through_google() {
        let placeholder = placeholder();

        let mut google = placeholder.to_google().unwrap();
        assert_eq!(google.id, "");
        assert_eq!(google.color_id, "4");
        let start = google.start.as_ref().unwrap();
        assert_eq!(start.time_zone, "Europe/Berlin");
        assert_eq!(start.date, None);

        // Google assigns the id on insert
        google.id = "created-1".into();
        let created = CalendarEvent::from_google(google).unwrap();

        assert_eq!(created.id, "created-1");
        assert_eq!(created.start, placeholder.start);
        assert_eq!(created.end, placeholder.end);
        assert_eq!(created.time_zone, placeholder.time_zone);
        assert_eq!(created.private_properties, placeholder.private_properties);
        assert_eq!(created.source, placeholder.source);
        assert_eq!(created.description, placeholder.description);
    }

    #[test]
    fn sends_private_properties_in_api_shape() {
        let google = placeholder().to_google().unwrap();
        let value = serde_json::to_value(&google).unwrap();

        assert_eq!(value["extendedProperties"]["private"]["busy-blocker"], "true");
        assert_eq!(
            value["extendedProperties"]["private"]["busy-blocker-source-event-id"],
            "src-1"
        );
        assert_eq!(value["source"]["title"], "busy-blocker");
    }

    #[test]
    fn untagged_event_has_no_extended_properties() {
        let mut event = placeholder();
        event.private_properties.clear();
        event.source = None;

        let google = event.to_google().unwrap();
        assert!(google.extended_properties.is_none());
        assert!(google.source.is_none());
    }

    #[test]
    fn cancelled_status_is_detected() {
        let google = google_calendar::types::Event {
            status: STATUS_CANCELLED.into(),
            ..Default::default()
        };
        assert!(is_cancelled(&google));
        assert!(!is_cancelled(&google_calendar::types::Event::default()));
    }
}
