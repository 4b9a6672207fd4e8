//! [`CalendarGateway`] backed by the Google Calendar v3 API.

use busy_blocker_core::{CalendarEvent, CalendarGateway, GatewayError, ListQuery};
use google_calendar::Client;
use google_calendar::types::{OrderBy, SendUpdates};
use tracing::debug;

use crate::google_event::{FromGoogle, ToGoogle, is_cancelled};
use crate::session::{Role, Session};

pub struct GoogleCalendarGateway {
    client: Client,
}

impl GoogleCalendarGateway {
    pub fn new(client: Client) -> Self {
        GoogleCalendarGateway { client }
    }

    /// Load (and refresh if needed) the stored session for `role`.
    pub async fn connect(role: Role) -> anyhow::Result<Self> {
        let session = Session::load_valid(role).await?;
        Ok(Self::new(session.client()?))
    }
}

impl CalendarGateway for GoogleCalendarGateway {
    async fn list_events(
        &self,
        calendar_id: &str,
        query: &ListQuery,
    ) -> Result<Vec<CalendarEvent>, GatewayError> {
        let private_filter = private_extended_properties(query);
        let time_min = query.window.from_rfc3339().unwrap_or_default();
        let time_max = query.window.to_rfc3339().unwrap_or_default();

        debug!(calendar_id, %time_min, %time_max, ?private_filter, "Listing events");

        let response = self
            .client
            .events()
            .list_all(
                calendar_id,
                "",                  // i_cal_uid
                0,                   // max_attendees
                OrderBy::StartTime,  // order_by
                &private_filter,     // private_extended_property
                "",                  // q (search query)
                &[],                 // shared_extended_property
                false,               // show_deleted
                false,               // show_hidden_invitations
                true,                // single_events
                &time_max,
                &time_min,
                "",                  // time_zone
                "",                  // updated_min
            )
            .await
            .map_err(classify)?;

        response
            .body
            .into_iter()
            .filter(|event| !is_cancelled(event))
            .map(CalendarEvent::from_google)
            .collect()
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent, GatewayError> {
        let google_event = event.to_google()?;
        debug!(calendar_id, summary = %google_event.summary, "Inserting event");

        let response = self
            .client
            .events()
            .insert(
                calendar_id,
                0,                 // conference_data_version
                0,                 // max_attendees
                false,             // send_notifications
                SendUpdates::None, // send_updates
                false,             // supports_attachments
                &google_event,
            )
            .await
            .map_err(classify)?;

        CalendarEvent::from_google(response.body)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), GatewayError> {
        debug!(calendar_id, event_id, "Deleting event");

        let result = self
            .client
            .events()
            .delete(calendar_id, event_id, false, SendUpdates::None)
            .await;

        match result.map_err(classify) {
            Ok(_) => Ok(()),
            // Already deleted
            Err(GatewayError::Http { status: 410, .. }) => {
                debug!(event_id, "Event was already deleted");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// `key=value` pairs for the `privateExtendedProperty` parameter.
fn private_extended_properties(query: &ListQuery) -> Vec<String> {
    query
        .private_properties
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect()
}

/// Map a client error to a gateway error by the HTTP status it reports.
fn classify(err: impl std::fmt::Display) -> GatewayError {
    let message = err.to_string();

    match http_status(&message) {
        Some(401 | 403) => GatewayError::Unauthorized(message),
        Some(status) => GatewayError::Http { status, message },
        None => GatewayError::Transport(message),
    }
}

/// First standalone 4xx/5xx number in an error message.
fn http_status(message: &str) -> Option<u16> {
    message
        .split(|c: char| !c.is_ascii_digit())
        .filter(|token| token.len() == 3)
        .filter_map(|token| token.parse::<u16>().ok())
        .find(|status| (400..600).contains(status))
}
