use anyhow::{Context, Result};
use busy_blocker_core::{Reconciler, SyncSettings};
use busy_blocker_google::{GoogleCalendarGateway, Role};

pub async fn run(dry_run: bool) -> Result<()> {
    let settings = SyncSettings::load().context("Failed to load config.toml")?;

    let destination = GoogleCalendarGateway::connect(Role::Destination)
        .await
        .context("Unable to connect to the destination calendar")?;

    // Only the destination is touched
    let report = Reconciler::new((), &destination, &settings)
        .clean(dry_run)
        .await?;

    if report.deleted == 0 {
        println!("No placeholders found.");
    } else if report.dry_run {
        println!("{} placeholders would be deleted.", report.deleted);
    } else {
        println!("Deleted {} placeholders.", report.deleted);
    }

    Ok(())
}
