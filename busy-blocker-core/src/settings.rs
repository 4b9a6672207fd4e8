//! Sync settings: calendar ids, reserved tag keys and placeholder style.
//!
//! Read from ~/.config/busy-blocker/config.toml, with `BUSY_BLOCKER_*`
//! environment variables taking precedence (`__` separates nested keys,
//! e.g. `BUSY_BLOCKER_PLACEHOLDER__TITLE`).

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::event::{CalendarEvent, PrivateProperties};

/// Google's alias for the user's main calendar
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_DAYS_AHEAD: u32 = 30;
/// Roughly ten years
pub const MAX_DAYS_AHEAD: u32 = 3650;

const APP_NAME: &str = "busy-blocker";

/// Everything the reconciler needs to know besides the two calendars.
///
/// Changing the tag keys orphans placeholders created under the old keys,
/// so they should stay stable once a destination calendar has been synced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub source_calendar_id: String,
    pub destination_calendar_id: String,
    pub days_ahead: u32,
    pub tags: TagKeys,
    pub placeholder: PlaceholderStyle,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            source_calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            destination_calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            days_ahead: DEFAULT_DAYS_AHEAD,
            tags: TagKeys::default(),
            placeholder: PlaceholderStyle::default(),
        }
    }
}

/// Reserved private-property keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagKeys {
    /// Marks an event as created by busy-blocker
    pub ownership_key: String,
    pub ownership_value: String,
    /// Holds the id of the source event a placeholder stands in for
    pub link_key: String,
    /// Records which source calendar the linked event lives in.
    /// Informational only, never used for matching.
    pub source_calendar_key: Option<String>,
}

impl Default for TagKeys {
    fn default() -> Self {
        TagKeys {
            ownership_key: APP_NAME.to_string(),
            ownership_value: "true".to_string(),
            link_key: format!("{APP_NAME}-source-event-id"),
            source_calendar_key: Some(format!("{APP_NAME}-source-calendar-id")),
        }
    }
}

impl TagKeys {
    /// Filter selecting only events we created.
    pub fn ownership_filter(&self) -> PrivateProperties {
        PrivateProperties::from([(self.ownership_key.clone(), self.ownership_value.clone())])
    }

    pub fn is_owned(&self, event: &CalendarEvent) -> bool {
        event.private_property(&self.ownership_key) == Some(self.ownership_value.as_str())
    }

    /// Source event id a placeholder points at; empty when the tag is missing.
    pub fn linked_source_id<'a>(&self, event: &'a CalendarEvent) -> &'a str {
        event.private_property(&self.link_key).unwrap_or_default()
    }
}

/// How placeholders look in the destination calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderStyle {
    pub title: String,
    pub description: String,
    pub color_id: String,
    pub source_title: String,
    /// Google only shows the source link when a http(s) url is set
    pub source_url: Option<String>,
}

impl Default for PlaceholderStyle {
    fn default() -> Self {
        PlaceholderStyle {
            title: "Busy".to_string(),
            description: format!(
                "Created with {APP_NAME}. \
                User has a personal commitment and is busy at this time. \
                Please find another time to avoid scheduling conflicts."
            ),
            color_id: "4".to_string(),
            source_title: APP_NAME.to_string(),
            source_url: None,
        }
    }
}

impl SyncSettings {
    /// ~/.config/busy-blocker
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        Ok(dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join(APP_NAME))
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load settings from the default location, writing a commented-out
    /// config file on first use.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if !path.exists() {
            Self::create_default_config(&path)?;
        }

        Self::load_from(Some(&path))
    }

    /// Load settings from an optional file plus the environment.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings: SyncSettings = builder
            .add_source(
                Environment::with_prefix("BUSY_BLOCKER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tags.ownership_key.is_empty() || self.tags.link_key.is_empty() {
            return Err(ConfigError::Invalid("tag keys must not be empty".into()));
        }
        if self.tags.ownership_key == self.tags.link_key {
            return Err(ConfigError::Invalid(
                "tags.ownership_key and tags.link_key must differ".into(),
            ));
        }
        if self.tags.source_calendar_key.as_deref() == Some(self.tags.ownership_key.as_str())
            || self.tags.source_calendar_key.as_deref() == Some(self.tags.link_key.as_str())
        {
            return Err(ConfigError::Invalid(
                "tags.source_calendar_key must not reuse another tag key".into(),
            ));
        }
        if !(1..=MAX_DAYS_AHEAD).contains(&self.days_ahead) {
            return Err(ConfigError::Invalid(format!(
                "days_ahead must be between 1 and {MAX_DAYS_AHEAD}"
            )));
        }
        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let contents = format!(
            "\
# busy-blocker configuration

# Calendars to read from and write placeholders to:
# source_calendar_id = \"{DEFAULT_CALENDAR_ID}\"
# destination_calendar_id = \"{DEFAULT_CALENDAR_ID}\"

# How far ahead `busy-blocker sync` looks (at most {MAX_DAYS_AHEAD}):
# days_ahead = {DEFAULT_DAYS_AHEAD}

# [placeholder]
# title = \"Busy\"
# color_id = \"4\"
# Link shown on each placeholder, omitted unless set:
# source_url = \"https://...\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Invalid(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Invalid(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
