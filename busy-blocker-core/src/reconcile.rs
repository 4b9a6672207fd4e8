//! Reconciliation of destination placeholders against source events.
//!
//! The only sync state is the pair of private tags on every placeholder:
//! the ownership marker and the link to the source event id. [`plan`] is the
//! pure diff; [`Reconciler`] fetches both snapshots, applies the plan through
//! the gateways and reports what it did.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, warn};

use crate::error::{Operation, SyncError, SyncResult};
use crate::event::CalendarEvent;
use crate::gateway::{CalendarGateway, ListQuery};
use crate::settings::{SyncSettings, TagKeys};
use crate::window::SyncWindow;

/// Actions needed to make the destination mirror the source.
#[derive(Debug, Default, PartialEq)]
pub struct SyncPlan<'a> {
    /// Source events without a placeholder
    pub to_create: Vec<&'a CalendarEvent>,
    /// Destination events whose linked source event is gone
    pub to_delete: Vec<&'a CalendarEvent>,
    /// Source events that already have a placeholder
    pub skipped: usize,
}

/// Diff source events against fetched destination events.
///
/// Matching is by source id only; a moved source event keeps its
/// placeholder. Destination events sharing a link to a live source event
/// are all kept. Every destination event passed in is a delete candidate,
/// so callers must only pass events fetched with the ownership filter.
pub fn plan<'a>(
    source: &'a [CalendarEvent],
    destination: &'a [CalendarEvent],
    tags: &TagKeys,
) -> SyncPlan<'a> {
    let linked: HashSet<&str> = destination
        .iter()
        .map(|event| tags.linked_source_id(event))
        .filter(|id| !id.is_empty())
        .collect();
    let live: HashSet<&str> = source.iter().map(|event| event.id.as_str()).collect();

    let (already_synced, to_create): (Vec<_>, Vec<_>) = source
        .iter()
        .partition(|event| linked.contains(event.id.as_str()));

    let to_delete = destination
        .iter()
        .filter(|event| !live.contains(tags.linked_source_id(event)))
        .collect();

    SyncPlan {
        to_create,
        to_delete,
        skipped: already_synced.len(),
    }
}

/// Counters for one run. In a dry run, `created` and `deleted` count the
/// actions that would have been taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub scanned: usize,
    pub skipped: usize,
    pub created: usize,
    pub deleted: usize,
    pub dry_run: bool,
}

impl SyncReport {
    fn new(dry_run: bool) -> Self {
        SyncReport {
            dry_run,
            ..Default::default()
        }
    }

    pub fn has_changes(&self) -> bool {
        self.created > 0 || self.deleted > 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (created, deleted) = if self.dry_run {
            ("would be created", "would be deleted")
        } else {
            ("created", "deleted")
        };
        write!(
            f,
            "{} scanned, {} already synced, {} {}, {} {}",
            self.scanned, self.skipped, self.created, created, self.deleted, deleted
        )
    }
}

/// Drives one sync between a source and a destination gateway.
///
/// `clean` only touches the destination, so any value (e.g. `()`) can
/// stand in for the source when no source gateway is available.
pub struct Reconciler<'a, S, D> {
    source: S,
    destination: D,
    settings: &'a SyncSettings,
}

impl<'a, S, D> Reconciler<'a, S, D> {
    pub fn new(source: S, destination: D, settings: &'a SyncSettings) -> Self {
        Reconciler {
            source,
            destination,
            settings,
        }
    }
}

impl<S: CalendarGateway, D: CalendarGateway> Reconciler<'_, S, D> {
    /// Create placeholders for new source events in `window` and delete
    /// placeholders whose source event no longer exists.
    ///
    /// Stops at the first failure. Actions already taken stay in effect.
    pub async fn run(&self, window: &SyncWindow, dry_run: bool) -> SyncResult<SyncReport> {
        let settings = self.settings;
        let mut report = SyncReport::new(dry_run);

        if dry_run {
            warn!("Dry run, no events will be created or deleted");
        }
        info!(
            calendar = %settings.source_calendar_id,
            %window,
            "Fetching events from source calendar"
        );

        let source_events = self
            .source
            .list_events(&settings.source_calendar_id, &ListQuery::new(*window))
            .await
            .map_err(SyncError::gateway(
                Operation::List,
                &settings.source_calendar_id,
                None,
            ))?;

        if source_events.is_empty() {
            info!("No upcoming events found in source calendar");
            return Ok(report);
        }

        report.scanned = source_events.len();
        info!("Found {} events in source calendar", source_events.len());

        // Reach back past the window so placeholders of moved or vanished
        // source events are found too
        let destination_events = self
            .owned_destination_events(window.with_unbounded_start())
            .await?;

        let plan = plan(&source_events, &destination_events, &settings.tags);
        report.skipped = plan.skipped;

        debug!(
            skipped = plan.skipped,
            to_create = plan.to_create.len(),
            to_delete = plan.to_delete.len(),
            "Planned sync"
        );

        for source_event in plan.to_create {
            self.create_placeholder(source_event, dry_run).await?;
            report.created += 1;
        }

        for stale in plan.to_delete {
            self.delete_placeholder(stale, dry_run).await?;
            report.deleted += 1;
        }

        info!(%report, "Sync completed successfully");
        Ok(report)
    }

    async fn create_placeholder(
        &self,
        source_event: &CalendarEvent,
        dry_run: bool,
    ) -> SyncResult<()> {
        let calendar = &self.settings.destination_calendar_id;
        let placeholder = self.settings.placeholder_for(source_event);

        if dry_run {
            let preview = serde_json::to_string_pretty(&placeholder)?;
            info!(source_event_id = %source_event.id, "Would create placeholder:\n{preview}");
            return Ok(());
        }

        info!(
            source_event_id = %source_event.id,
            start = %placeholder.start,
            end = %placeholder.end,
            "Creating placeholder"
        );
        let created = self
            .destination
            .insert_event(calendar, &placeholder)
            .await
            .map_err(SyncError::gateway(
                Operation::Insert,
                calendar,
                Some(source_event.id.as_str()),
            ))?;
        debug!(event_id = %created.id, "Placeholder created");

        Ok(())
    }
}

impl<S, D: CalendarGateway> Reconciler<'_, S, D> {
    /// Delete every placeholder in the destination calendar, regardless of
    /// time.
    pub async fn clean(&self, dry_run: bool) -> SyncResult<SyncReport> {
        let mut report = SyncReport::new(dry_run);

        if dry_run {
            warn!("Dry run, no events will be deleted");
        }

        let owned = self
            .owned_destination_events(SyncWindow::unbounded())
            .await?;
        info!("Found {} placeholders in destination calendar", owned.len());

        for event in &owned {
            self.delete_placeholder(event, dry_run).await?;
            report.deleted += 1;
        }

        info!(%report, "Clean completed successfully");
        Ok(report)
    }

    async fn owned_destination_events(&self, window: SyncWindow) -> SyncResult<Vec<CalendarEvent>> {
        let calendar = &self.settings.destination_calendar_id;
        let query = ListQuery::new(window)
            .with_private_properties(self.settings.tags.ownership_filter());

        info!(calendar = %calendar, %window, "Fetching placeholders from destination calendar");

        self.destination
            .list_events(calendar, &query)
            .await
            .map_err(SyncError::gateway(Operation::List, calendar, None))
    }

    /// Deletes a placeholder after re-checking the ownership marker.
    /// The check also runs in dry-run mode.
    async fn delete_placeholder(&self, event: &CalendarEvent, dry_run: bool) -> SyncResult<()> {
        if !self.settings.tags.is_owned(event) {
            return Err(SyncError::NotOwned {
                event_id: event.id.clone(),
            });
        }

        if dry_run {
            info!(
                event_id = %event.id,
                start = %event.start,
                end = %event.end,
                "Would delete placeholder"
            );
            return Ok(());
        }

        info!(event_id = %event.id, start = %event.start, end = %event.end, "Deleting placeholder");

        let calendar = &self.settings.destination_calendar_id;
        self.destination
            .delete_event(calendar, &event.id)
            .await
            .map_err(SyncError::gateway(Operation::Delete, calendar, Some(event.id.as_str())))
    }
}
