//! Error types for busy-blocker.

use std::fmt;

use thiserror::Error;

/// The gateway call that was in flight when something failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Insert,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::List => write!(f, "list"),
            Operation::Insert => write!(f, "insert"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Errors reported by a calendar gateway implementation.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Calendar API returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Could not decode response: {0}")]
    Decode(String),
}

/// Errors that abort a reconciliation run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to {operation} on calendar '{calendar}'{}: {source}", event_suffix(.event_id))]
    Gateway {
        operation: Operation,
        calendar: String,
        event_id: Option<String>,
        #[source]
        source: GatewayError,
    },

    #[error("Aborting, refusing to delete an event busy-blocker does not own! Event ID = {event_id}")]
    NotOwned { event_id: String },

    #[error("Could not render dry-run preview: {0}")]
    Preview(#[from] serde_json::Error),
}

fn event_suffix(event_id: &Option<String>) -> String {
    match event_id {
        Some(id) => format!(" (event {id})"),
        None => String::new(),
    }
}

impl SyncError {
    pub(crate) fn gateway(
        operation: Operation,
        calendar: &str,
        event_id: Option<&str>,
    ) -> impl FnOnce(GatewayError) -> SyncError {
        let calendar = calendar.to_string();
        let event_id = event_id.map(str::to_string);
        move |source| SyncError::Gateway {
            operation,
            calendar,
            event_id,
            source,
        }
    }
}

/// Errors while loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

/// Result type alias for reconciliation.
pub type SyncResult<T> = Result<T, SyncError>;
