//! User settings for shelf
//!
//! Manages user preferences including loan defaults, the off-site backup
//! location and the backup retention policy.

use std::path::PathBuf;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::paths::ShelfPaths;
use crate::error::ShelfError;
use crate::models::MAX_LOAN_DAYS;

/// Backup retention policy
///
/// Every field is required in the settings file. A snapshot is kept when any
/// of the three rules selects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionPolicy {
    /// Always keep this many of the newest snapshots
    pub keep_last_n: u32,
    /// Keep the newest snapshot of each month, this many months back
    pub keep_monthly_for: u32,
    /// Keep the newest snapshot of each day, for this many days
    pub keep_daily_for: u32,
}

impl RetentionPolicy {
    /// Create a new policy
    pub fn new(keep_last_n: u32, keep_monthly_for: u32, keep_daily_for: u32) -> Self {
        Self {
            keep_last_n,
            keep_monthly_for,
            keep_daily_for,
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_last_n: 3,
            keep_monthly_for: 6,
            keep_daily_for: 7,
        }
    }
}

/// Off-site backup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSettings {
    /// Folder acting as the remote store (a mounted share or a synced folder).
    /// Backups are disabled while this is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_dir: Option<PathBuf>,

    /// IANA time zone the "one snapshot per day" check runs in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Run the synchronizer once when a record command starts
    #[serde(default = "default_auto_sync")]
    pub auto_sync: bool,

    /// Retention policy
    pub retention: RetentionPolicy,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_auto_sync() -> bool {
    true
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            remote_dir: None,
            timezone: default_timezone(),
            auto_sync: default_auto_sync(),
            retention: RetentionPolicy::default(),
        }
    }
}

impl BackupSettings {
    /// Parse the configured time zone
    pub fn tz(&self) -> Result<Tz, ShelfError> {
        self.timezone.parse::<Tz>().map_err(|_| {
            ShelfError::Config(format!("Unknown backup time zone: '{}'", self.timezone))
        })
    }

    /// Whether a remote store has been configured
    pub fn is_enabled(&self) -> bool {
        self.remote_dir.is_some()
    }
}

/// User settings for shelf
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Default loan length in days
    #[serde(default = "default_loan_days")]
    pub default_loan_days: u32,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Off-site backup settings
    #[serde(default)]
    pub backup: BackupSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_loan_days() -> u32 {
    7
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_loan_days: default_loan_days(),
            date_format: default_date_format(),
            backup: BackupSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    ///
    /// Invalid settings are rejected here, before anything touches the
    /// remote store.
    pub fn load_or_create(paths: &ShelfPaths) -> Result<Self, ShelfError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| ShelfError::Io(format!("Failed to read settings file: {}", e)))?;

            Self::from_json(&contents)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Parse and validate settings from a JSON document
    pub fn from_json(contents: &str) -> Result<Self, ShelfError> {
        let settings: Settings = serde_json::from_str(contents)
            .map_err(|e| ShelfError::Config(format!("Failed to parse settings file: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<(), ShelfError> {
        self.backup.tz()?;

        if self.default_loan_days == 0 || self.default_loan_days > MAX_LOAN_DAYS {
            return Err(ShelfError::Config(format!(
                "default_loan_days must be between 1 and {}",
                MAX_LOAN_DAYS
            )));
        }

        if let Some(dir) = &self.backup.remote_dir {
            if dir.as_os_str().is_empty() {
                return Err(ShelfError::Config("backup.remote_dir is empty".into()));
            }
        }

        Ok(())
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ShelfPaths) -> Result<(), ShelfError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ShelfError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(&settings_path, contents)
            .map_err(|e| ShelfError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_loan_days, 7);
        assert!(!settings.backup.is_enabled());
        assert_eq!(settings.backup.tz().unwrap(), chrono_tz::UTC);
        assert_eq!(settings.backup.retention, RetentionPolicy::new(3, 6, 7));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ShelfPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.backup.remote_dir = Some(temp_dir.path().join("remote"));
        settings.backup.timezone = "America/Sao_Paulo".into();
        settings.backup.retention = RetentionPolicy::new(1, 2, 3);

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert!(loaded.backup.is_enabled());
        assert_eq!(loaded.backup.tz().unwrap(), chrono_tz::America::Sao_Paulo);
        assert_eq!(loaded.backup.retention, RetentionPolicy::new(1, 2, 3));
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings.backup.retention, RetentionPolicy::default());
    }

    #[test]
    fn test_missing_retention_field_is_config_error() {
        let json = r#"{"backup": {"retention": {"keep_last_n": 2, "keep_daily_for": 3}}}"#;
        let err = Settings::from_json(json).unwrap_err();
        assert!(matches!(err, ShelfError::Config(_)));
        assert!(err.to_string().contains("keep_monthly_for"));
    }

    #[test]
    fn test_negative_retention_value_is_config_error() {
        let json = r#"{"backup": {"retention": {"keep_last_n": -1, "keep_monthly_for": 1, "keep_daily_for": 1}}}"#;
        let err = Settings::from_json(json).unwrap_err();
        assert!(matches!(err, ShelfError::Config(_)));
    }

    #[test]
    fn test_non_integer_retention_value_is_config_error() {
        let json = r#"{"backup": {"retention": {"keep_last_n": "three", "keep_monthly_for": 1, "keep_daily_for": 1}}}"#;
        assert!(matches!(
            Settings::from_json(json),
            Err(ShelfError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_timezone_is_config_error() {
        let json = r#"{"backup": {"timezone": "Mars/Olympus", "retention": {"keep_last_n": 1, "keep_monthly_for": 1, "keep_daily_for": 1}}}"#;
        let err = Settings::from_json(json).unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn test_loan_length_out_of_range_is_config_error() {
        for days in [0, MAX_LOAN_DAYS + 1, u32::MAX] {
            let json = format!(r#"{{"default_loan_days": {}}}"#, days);
            assert!(matches!(
                Settings::from_json(&json),
                Err(ShelfError::Config(_))
            ));
        }
        assert!(Settings::from_json(r#"{"default_loan_days": 3650}"#).is_ok());
    }
}
