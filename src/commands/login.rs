use anyhow::Result;
use busy_blocker_google::{Role, login};

pub async fn run(role: Role) -> Result<()> {
    println!("Authorizing the {role} calendar...");

    let calendar_id = login::login(role).await?;

    println!("\nAuthorized {role} calendar: {calendar_id}");

    match role {
        Role::Source => println!("\nNext, run `busy-blocker login destination`."),
        Role::Destination => println!("\nRun `busy-blocker sync --dry-run` to preview a sync."),
    }

    Ok(())
}
