//! Google Calendar backend for busy-blocker.
//!
//! OAuth client credentials and per-role sessions live under
//! ~/.config/busy-blocker/google/. Events are read and written through the
//! `google-calendar` client by [`GoogleCalendarGateway`].

pub mod credentials;
pub mod gateway;
pub mod google_event;
pub mod login;
pub mod session;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use credentials::OAuthCredentials;
pub use gateway::GoogleCalendarGateway;
pub use session::{Role, Session};

/// ~/.config/busy-blocker/google
pub fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("busy-blocker")
        .join("google"))
}

/// Write a file readable by the owner only (0600 on unix), creating parent
/// directories as needed.
pub(crate) fn write_private_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}
