use std::path::Path;

use anyhow::Result;
use busy_blocker_google::OAuthCredentials;

pub fn run(path: &Path) -> Result<()> {
    let installed = OAuthCredentials::install_from(path)?;

    println!("OAuth credentials saved to {}", installed.display());
    println!("\nNext, run `busy-blocker login source`.");

    Ok(())
}
