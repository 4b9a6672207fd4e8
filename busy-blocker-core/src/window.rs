//! Time windows for listing events.

use chrono::{DateTime, Duration, Utc};

use crate::error::ConfigError;
use crate::event::CalendarEvent;

/// Half-open time interval `[from, to)`.
/// None values mean unbounded in that direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl SyncWindow {
    /// `[now, now + days_ahead)`
    ///
    /// Fails if the upper bound lies past the last date chrono can represent.
    pub fn days_ahead(now: DateTime<Utc>, days_ahead: u32) -> Result<Self, ConfigError> {
        let to = Duration::try_days(i64::from(days_ahead))
            .and_then(|ahead| now.checked_add_signed(ahead))
            .ok_or_else(|| {
                ConfigError::Invalid(format!("days_ahead {days_ahead} is out of range"))
            })?;

        Ok(SyncWindow {
            from: Some(now),
            to: Some(to),
        })
    }

    /// No bounds at all.
    pub fn unbounded() -> Self {
        SyncWindow {
            from: None,
            to: None,
        }
    }

    /// Same upper bound, but reaching back to the beginning of time.
    ///
    /// Placeholders whose source event moved before `from` are only found
    /// by looking further back than the sync window itself.
    pub fn with_unbounded_start(&self) -> Self {
        SyncWindow {
            from: None,
            to: self.to,
        }
    }

    /// True if the event's `[start, end)` overlaps this window.
    /// Zero-length events count when their instant lies inside the window.
    pub fn intersects(&self, event: &CalendarEvent) -> bool {
        let start = event.start.to_utc();
        let end = event.end.to_utc().max(start);

        let after_from = match self.from {
            Some(from) => end > from || (end == start && start >= from),
            None => true,
        };
        let before_to = match self.to {
            Some(to) => start < to,
            None => true,
        };

        after_from && before_to
    }

    /// `from` as RFC3339, if bounded.
    pub fn from_rfc3339(&self) -> Option<String> {
        self.from.map(|dt| dt.to_rfc3339())
    }

    /// `to` as RFC3339, if bounded.
    pub fn to_rfc3339(&self) -> Option<String> {
        self.to.map(|dt| dt.to_rfc3339())
    }
}

impl std::fmt::Display for SyncWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let from = self.from_rfc3339().unwrap_or_else(|| "the beginning".into());
        let to = self.to_rfc3339().unwrap_or_else(|| "the end".into());
        write!(f, "{from} to {to}")
    }
}
