//! Per-role Google sessions (access + refresh token).
//!
//! The source account is only ever read, so it is authorized with read-only
//! scopes; the destination account needs full calendar access to write
//! placeholders.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use google_calendar::{AccessToken, Client};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::credentials::OAuthCredentials;
use crate::{base_dir, write_private_file};

const READONLY_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar.readonly",
    "https://www.googleapis.com/auth/calendar.events.readonly",
];
const FULL_SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

/// Refresh this long before the token actually expires
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Which side of the sync an account plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Destination,
}

impl Role {
    pub fn scopes(&self) -> Vec<String> {
        let scopes = match self {
            Role::Source => READONLY_SCOPES,
            Role::Destination => FULL_SCOPES,
        };
        scopes.iter().map(|s| s.to_string()).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Destination => "destination",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Session {
    role: Role,
    data: SessionData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SessionData {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
    /// Primary calendar id of the account, recorded at login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account: Option<String>,
}

impl SessionData {
    fn from_tokens(tokens: &AccessToken, previous_refresh_token: &str) -> Self {
        Self::new(
            &tokens.access_token,
            &tokens.refresh_token,
            tokens.expires_in,
            previous_refresh_token,
        )
    }

    /// `previous_refresh_token` is kept when Google omits a new one, which it
    /// usually does on refresh.
    fn new(
        access_token: &str,
        refresh_token: &str,
        expires_in: i64,
        previous_refresh_token: &str,
    ) -> Self {
        let refresh_token = if refresh_token.is_empty() {
            previous_refresh_token
        } else {
            refresh_token
        };

        SessionData {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at: Utc::now() + Duration::seconds(expires_in),
            account: None,
        }
    }
}

impl Session {
    pub fn from_tokens(role: Role, tokens: &AccessToken, account: Option<String>) -> Self {
        let mut data = SessionData::from_tokens(tokens, "");
        data.account = account;
        Session { role, data }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn access_token(&self) -> &str {
        &self.data.access_token
    }

    pub fn account(&self) -> Option<&str> {
        self.data.account.as_deref()
    }

    /// Calendar API client authorized with this session's tokens.
    pub fn client(&self) -> Result<Client> {
        let creds = OAuthCredentials::load()?;

        Ok(Client::new(
            creds.client_id,
            creds.client_secret,
            String::new(),
            self.data.access_token.clone(),
            self.data.refresh_token.clone(),
        ))
    }

    pub fn path(role: Role) -> Result<PathBuf> {
        Ok(base_dir()?
            .join("session")
            .join(format!("{}.toml", role.as_str())))
    }

    /// Load the session for `role`, refreshing the access token if it has
    /// expired.
    pub async fn load_valid(role: Role) -> Result<Self> {
        let path = Self::path(role)?;
        let mut session = Self::load_from(role, &path)?;

        if session.is_expired() {
            warn!(%role, "Access token expired, refreshing");
            session.refresh().await?;
            session.save_to(&path)?;
        }

        Ok(session)
    }

    fn load_from(role: Role, path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "No Google session for the {role} calendar.\n\
                Run `busy-blocker login {role}` first."
            );
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read Google session from {}", path.display()))?;

        let data: SessionData = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse Google session from {}", path.display()))?;

        Ok(Session { role, data })
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path(self.role)?;
        self.save_to(&path)?;
        Ok(path)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        let contents =
            toml::to_string_pretty(&self.data).context("Failed to serialize session")?;

        // Contains OAuth tokens, owner-only
        write_private_file(path, &contents)
    }

    fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECONDS) >= self.data.expires_at
    }

    async fn refresh(&mut self) -> Result<()> {
        let tokens = self
            .client()?
            .refresh_access_token()
            .await
            .with_context(|| format!("Failed to refresh the {} session", self.role))?;

        let account = self.data.account.take();
        self.data = SessionData::from_tokens(&tokens, &self.data.refresh_token);
        self.data.account = account;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: Role, expires_at: DateTime<Utc>) -> Session {
        Session {
            role,
            data: SessionData {
                access_token: "ya29.access".into(),
                refresh_token: "1//refresh".into(),
                expires_at,
                account: Some("me@example.com".into()),
            },
        }
    }

    #[test]
    fn scopes_depend_on_role() {
        assert!(Role::Source.scopes().iter().all(|s| s.ends_with("readonly")));
        assert_eq!(
            Role::Destination.scopes(),
            vec!["https://www.googleapis.com/auth/calendar".to_string()]
        );
    }

    #[test]
    fn sessions_are_stored_per_role() {
        let source = Session::path(Role::Source).unwrap();
        let destination = Session::path(Role::Destination).unwrap();
        assert!(source.ends_with("session/source.toml"));
        assert!(destination.ends_with("session/destination.toml"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("destination.toml");
        let original = session(Role::Destination, Utc::now() + Duration::hours(1));

        original.save_to(&path).unwrap();
        let loaded = Session::load_from(Role::Destination, &path).unwrap();

        assert_eq!(loaded.data, original.data);
        assert_eq!(loaded.account(), Some("me@example.com"));
        assert!(!loaded.is_expired());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn missing_session_points_to_login() {
        let dir = tempfile::tempdir().unwrap();
        let err = Session::load_from(Role::Source, &dir.path().join("source.toml"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("busy-blocker login source"));
    }

    #[test]
    fn expiry_has_a_margin() {
        assert!(session(Role::Source, Utc::now()).is_expired());
        assert!(session(Role::Source, Utc::now() + Duration::seconds(30)).is_expired());
        assert!(!session(Role::Source, Utc::now() + Duration::minutes(10)).is_expired());
    }

    #[test]
    fn keeps_refresh_token_when_google_omits_it() {
        let data = SessionData::new("new", "", 3600, "1//old");
        assert_eq!(data.access_token, "new");
        assert_eq!(data.refresh_token, "1//old");
        assert!(data.expires_at > Utc::now() + Duration::minutes(59));

        let rotated = SessionData::new("new", "1//rotated", 3600, "1//old");
        assert_eq!(rotated.refresh_token, "1//rotated");
    }
}
