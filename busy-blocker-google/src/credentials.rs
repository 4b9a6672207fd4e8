//! OAuth client credentials from the Google Cloud console.
//!
//! Stored at ~/.config/busy-blocker/google/credentials.json. The console's
//! download is accepted as-is (`{"installed": {...}}` or `{"web": {...}}`),
//! as is a flat `{"client_id": ..., "client_secret": ...}` object.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{base_dir, write_private_file};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CredentialsFile {
    Installed { installed: OAuthCredentials },
    Web { web: OAuthCredentials },
    Flat(OAuthCredentials),
}

impl OAuthCredentials {
    pub fn path() -> Result<PathBuf> {
        Ok(base_dir()?.join("credentials.json"))
    }

    pub fn parse(json: &str) -> Result<Self> {
        let file: CredentialsFile = serde_json::from_str(json)
            .context("Expected an OAuth client JSON with client_id and client_secret")?;

        let creds = match file {
            CredentialsFile::Installed { installed } => installed,
            CredentialsFile::Web { web } => web,
            CredentialsFile::Flat(creds) => creds,
        };

        if creds.client_id.is_empty() || creds.client_secret.is_empty() {
            anyhow::bail!("OAuth client JSON has an empty client_id or client_secret");
        }

        Ok(creds)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Google OAuth credentials not found at {}.\n\n\
                Create an OAuth client ID (type \"Desktop app\") at\n\
                https://console.cloud.google.com/apis/credentials\n\
                and install the downloaded JSON with:\n\n\
                busy-blocker set-oauth-credentials --path <file>",
                path.display()
            );
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse credentials from {}", path.display()))
    }

    /// Validate the JSON at `source` and copy it to the credentials path.
    pub fn install_from(source: &Path) -> Result<PathBuf> {
        let destination = Self::path()?;
        Self::install(source, &destination)?;
        Ok(destination)
    }

    fn install(source: &Path, destination: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;

        let creds = Self::parse(&contents)
            .with_context(|| format!("{} is not a valid OAuth client file", source.display()))?;

        write_private_file(destination, &contents)?;

        Ok(creds)
    }
}
