//! In-memory calendar gateway that records every call.
//!
//! Used to exercise the reconciler without network access. Failures can be
//! injected per operation, and filtering can be switched off to simulate a
//! backend that ignores the private-property filter.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{GatewayError, Operation};
use crate::event::CalendarEvent;
use crate::gateway::{CalendarGateway, ListQuery};

/// A recorded gateway call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List {
        calendar_id: String,
        query: ListQuery,
    },
    Insert {
        calendar_id: String,
        event: CalendarEvent,
    },
    Delete {
        calendar_id: String,
        event_id: String,
    },
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::List { .. } => Operation::List,
            Call::Insert { .. } => Operation::Insert,
            Call::Delete { .. } => Operation::Delete,
        }
    }
}

#[derive(Default)]
struct State {
    calendars: HashMap<String, Vec<CalendarEvent>>,
    calls: Vec<Call>,
    next_id: u64,
    /// Remaining successful calls before an operation starts failing
    failures: HashMap<Operation, usize>,
}

#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
    ignore_filters: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a calendar with existing events. Their ids are kept as given.
    pub fn with_events(self, calendar_id: &str, events: Vec<CalendarEvent>) -> Self {
        self.lock()
            .calendars
            .entry(calendar_id.to_string())
            .or_default()
            .extend(events);
        self
    }

    /// Return every event of the calendar from `list_events`, ignoring both
    /// the window and the private-property filter.
    pub fn ignoring_filters(mut self) -> Self {
        self.ignore_filters = true;
        self
    }

    /// Let `successes` calls of `operation` through, then fail every
    /// following one with a transport error.
    pub fn fail_after(self, operation: Operation, successes: usize) -> Self {
        self.lock().failures.insert(operation, successes);
        self
    }

    pub fn events(&self, calendar_id: &str) -> Vec<CalendarEvent> {
        self.lock()
            .calendars
            .get(calendar_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn inserted(&self) -> Vec<CalendarEvent> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Insert { event, .. } => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Delete { event_id, .. } => Some(event_id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of insert and delete calls made so far.
    pub fn mutation_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| !matches!(call, Call::List { .. }))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    fn check_failure(&mut self, operation: Operation) -> Result<(), GatewayError> {
        match self.failures.get_mut(&operation) {
            Some(0) => Err(GatewayError::Transport(format!(
                "injected {operation} failure"
            ))),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl CalendarGateway for MemoryGateway {
    async fn list_events(
        &self,
        calendar_id: &str,
        query: &ListQuery,
    ) -> Result<Vec<CalendarEvent>, GatewayError> {
        let mut state = self.lock();
        state.calls.push(Call::List {
            calendar_id: calendar_id.to_string(),
            query: query.clone(),
        });
        state.check_failure(Operation::List)?;

        let events = state.calendars.get(calendar_id).cloned().unwrap_or_default();
        if self.ignore_filters {
            return Ok(events);
        }

        Ok(events
            .into_iter()
            .filter(|event| query.window.intersects(event))
            .filter(|event| event.matches_private_properties(&query.private_properties))
            .collect())
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent, GatewayError> {
        let mut state = self.lock();
        state.calls.push(Call::Insert {
            calendar_id: calendar_id.to_string(),
            event: event.clone(),
        });
        state.check_failure(Operation::Insert)?;

        state.next_id += 1;
        let mut stored = event.clone();
        stored.id = format!("mem-{}", state.next_id);

        state
            .calendars
            .entry(calendar_id.to_string())
            .or_default()
            .push(stored.clone());

        Ok(stored)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.calls.push(Call::Delete {
            calendar_id: calendar_id.to_string(),
            event_id: event_id.to_string(),
        });
        state.check_failure(Operation::Delete)?;

        let events = state.calendars.entry(calendar_id.to_string()).or_default();
        let before = events.len();
        events.retain(|event| event.id != event_id);

        if events.len() == before {
            return Err(GatewayError::Http {
                status: 404,
                message: format!("event {event_id} not found"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventTime, PrivateProperties};
    use crate::window::SyncWindow;
    use chrono::{Duration, TimeZone, Utc};

    fn event(id: &str, props: &[(&str, &str)]) -> CalendarEvent {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        CalendarEvent {
            id: id.to_string(),
            summary: id.to_string(),
            description: None,
            start: EventTime::DateTime(start),
            end: EventTime::DateTime(start + Duration::hours(1)),
            time_zone: None,
            color_id: None,
            private_properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            source: None,
        }
    }

    #[tokio::test]
    async fn list_applies_property_filter() {
        let gateway = MemoryGateway::new().with_events(
            "cal",
            vec![event("a", &[("owner", "true")]), event("b", &[])],
        );
        let query = ListQuery::new(SyncWindow::unbounded()).with_private_properties(
            PrivateProperties::from([("owner".to_string(), "true".to_string())]),
        );

        let listed = gateway.list_events("cal", &query).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "a");
    }

    #[tokio::test]
    async fn ignoring_filters_returns_everything() {
        let gateway = MemoryGateway::new()
            .with_events("cal", vec![event("a", &[("owner", "true")]), event("b", &[])])
            .ignoring_filters();
        let query = ListQuery::new(SyncWindow::unbounded()).with_private_properties(
            PrivateProperties::from([("owner".to_string(), "true".to_string())]),
        );

        assert_eq!(gateway.list_events("cal", &query).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_delete_removes() {
        let gateway = MemoryGateway::new();
        let stored = gateway.insert_event("cal", &event("", &[])).await.unwrap();
        assert_eq!(stored.id, "mem-1");
        assert_eq!(gateway.events("cal").len(), 1);

        gateway.delete_event("cal", "mem-1").await.unwrap();
        assert!(gateway.events("cal").is_empty());
        assert_eq!(gateway.deleted(), vec!["mem-1".to_string()]);
        assert_eq!(gateway.mutation_count(), 2);
    }

    #[tokio::test]
    async fn delete_of_unknown_event_fails() {
        let gateway = MemoryGateway::new();
        let err = gateway.delete_event("cal", "nope").await.unwrap_err();
        assert!(matches!(err, GatewayError::Http { status: 404, .. }));
    }

    #[tokio::test]
    async fn injected_failure_after_successes() {
        let gateway = MemoryGateway::new().fail_after(Operation::Insert, 1);
        assert!(gateway.insert_event("cal", &event("", &[])).await.is_ok());
        assert!(matches!(
            gateway.insert_event("cal", &event("", &[])).await,
            Err(GatewayError::Transport(_))
        ));
        // Failed calls are still recorded
        assert_eq!(gateway.inserted().len(), 2);
        assert_eq!(gateway.events("cal").len(), 1);
    }
}
