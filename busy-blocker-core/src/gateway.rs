//! The capability the reconciler needs from a calendar backend.
//!
//! Implemented by the Google Calendar adapter and by [`crate::memory::MemoryGateway`]
//! for tests. The reconciler never talks to the network itself.

use crate::error::GatewayError;
use crate::event::{CalendarEvent, PrivateProperties};
use crate::window::SyncWindow;

/// Parameters for listing events.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub window: SyncWindow,
    /// Only events whose private properties contain all of these pairs.
    /// Empty means no filtering.
    pub private_properties: PrivateProperties,
}

impl ListQuery {
    pub fn new(window: SyncWindow) -> Self {
        ListQuery {
            window,
            private_properties: PrivateProperties::new(),
        }
    }

    pub fn with_private_properties(mut self, filter: PrivateProperties) -> Self {
        self.private_properties = filter;
        self
    }
}

/// List, insert and delete events in a calendar.
///
/// Result ordering of `list_events` carries no meaning.
#[allow(async_fn_in_trait)]
pub trait CalendarGateway {
    async fn list_events(
        &self,
        calendar_id: &str,
        query: &ListQuery,
    ) -> Result<Vec<CalendarEvent>, GatewayError>;

    /// Returns the stored event, including its newly assigned id.
    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent, GatewayError>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), GatewayError>;
}

impl<G: CalendarGateway> CalendarGateway for &G {
    async fn list_events(
        &self,
        calendar_id: &str,
        query: &ListQuery,
    ) -> Result<Vec<CalendarEvent>, GatewayError> {
        (**self).list_events(calendar_id, query).await
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent, GatewayError> {
        (**self).insert_event(calendar_id, event).await
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), GatewayError> {
        (**self).delete_event(calendar_id, event_id).await
    }
}
