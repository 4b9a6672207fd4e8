//! Shaping of destination placeholders.

use crate::event::{CalendarEvent, EventSource, PrivateProperties};
use crate::settings::SyncSettings;

impl SyncSettings {
    /// Build the busy block standing in for `source` in the destination
    /// calendar.
    ///
    /// Only the time span is copied. Title, description, attendees and
    /// location of the source event never leave the source calendar.
    pub fn placeholder_for(&self, source: &CalendarEvent) -> CalendarEvent {
        let tags = &self.tags;
        let style = &self.placeholder;

        let mut private_properties = PrivateProperties::new();
        private_properties.insert(tags.ownership_key.clone(), tags.ownership_value.clone());
        private_properties.insert(tags.link_key.clone(), source.id.clone());
        if let Some(key) = &tags.source_calendar_key {
            private_properties.insert(key.clone(), self.source_calendar_id.clone());
        }

        CalendarEvent {
            // Let the destination assign the id
            id: String::new(),
            summary: style.title.clone(),
            description: Some(style.description.clone()),
            start: source.start.clone(),
            end: source.end.clone(),
            time_zone: source.time_zone.clone(),
            color_id: Some(style.color_id.clone()),
            private_properties,
            source: style.source_url.as_ref().map(|url| EventSource {
                title: style.source_title.clone(),
                url: url.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTime;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn dentist() -> CalendarEvent {
        CalendarEvent {
            id: "src-42".to_string(),
            summary: "Dentist".to_string(),
            description: Some("Root canal, bring insurance card".to_string()),
            start: EventTime::DateTime(Utc.with_ymd_and_hms(2025, 5, 2, 14, 0, 0).unwrap()),
            end: EventTime::DateTime(Utc.with_ymd_and_hms(2025, 5, 2, 15, 30, 0).unwrap()),
            time_zone: None,
            color_id: Some("11".to_string()),
            private_properties: PrivateProperties::from([(
                "personal".to_string(),
                "secret".to_string(),
            )]),
            source: None,
        }
    }

    #[test]
    fn copies_only_the_time_span() {
        let settings = SyncSettings::default();
        let source = dentist();
        let placeholder = settings.placeholder_for(&source);

        assert_eq!(placeholder.id, "");
        assert_eq!(placeholder.summary, "Busy");
        assert_eq!(placeholder.start, source.start);
        assert_eq!(placeholder.end, source.end);
        assert_eq!(placeholder.color_id.as_deref(), Some("4"));

        let description = placeholder.description.clone().unwrap();
        assert!(description.starts_with("Created with busy-blocker"));
        assert!(!description.contains("Root canal"));
        assert!(placeholder.private_property("personal").is_none());
        assert!(placeholder.source.is_none());
    }

    #[test]
    fn sets_reserved_tags() {
        let settings = SyncSettings::default();
        let placeholder = settings.placeholder_for(&dentist());

        assert!(settings.tags.is_owned(&placeholder));
        assert_eq!(settings.tags.linked_source_id(&placeholder), "src-42");
        assert_eq!(
            placeholder.private_property("busy-blocker-source-calendar-id"),
            Some("primary")
        );
    }

    #[test]
    fn uses_configured_style_and_keys() {
        let mut settings = SyncSettings::default();
        settings.tags.ownership_key = "mirror".into();
        settings.tags.source_calendar_key = None;
        settings.placeholder.title = "Unavailable".into();
        settings.placeholder.source_url = Some("https://example.com/mirror".into());

        let placeholder = settings.placeholder_for(&dentist());

        assert_eq!(placeholder.summary, "Unavailable");
        assert_eq!(placeholder.private_property("mirror"), Some("true"));
        assert_eq!(placeholder.private_properties.len(), 2);
        assert_eq!(
            placeholder.source,
            Some(EventSource {
                title: "busy-blocker".into(),
                url: "https://example.com/mirror".into(),
            })
        );
    }

    #[test]
    fn keeps_the_source_time_zone() {
        let mut source = dentist();
        source.time_zone = Some("Europe/Berlin".to_string());

        let placeholder = SyncSettings::default().placeholder_for(&source);
        assert_eq!(placeholder.time_zone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(placeholder.start, source.start);
    }

    #[test]
    fn keeps_all_day_dates() {
        let mut source = dentist();
        source.start = EventTime::Date(NaiveDate::from_ymd_opt(2025, 5, 2).unwrap());
        source.end = EventTime::Date(NaiveDate::from_ymd_opt(2025, 5, 3).unwrap());

        let placeholder = SyncSettings::default().placeholder_for(&source);
        assert_eq!(placeholder.start, source.start);
        assert_eq!(placeholder.end, source.end);
    }
}
