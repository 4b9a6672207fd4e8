use anyhow::{Context, Result};
use busy_blocker_core::{Reconciler, SyncSettings, SyncWindow};
use busy_blocker_google::{GoogleCalendarGateway, Role};
use chrono::Utc;

pub async fn run(days_ahead: Option<u32>, dry_run: bool) -> Result<()> {
    let settings = SyncSettings::load().context("Failed to load config.toml")?;
    let days_ahead = days_ahead.unwrap_or(settings.days_ahead);
    let window = SyncWindow::days_ahead(Utc::now(), days_ahead)?;

    let source = GoogleCalendarGateway::connect(Role::Source)
        .await
        .context("Unable to connect to the source calendar")?;
    let destination = GoogleCalendarGateway::connect(Role::Destination)
        .await
        .context("Unable to connect to the destination calendar")?;

    println!("Syncing {window}");

    let report = Reconciler::new(&source, &destination, &settings)
        .run(&window, dry_run)
        .await?;

    println!("\n{report}");
    if report.dry_run && report.has_changes() {
        println!("Dry run, nothing was changed.");
    }

    Ok(())
}
