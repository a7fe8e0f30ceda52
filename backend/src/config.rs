//! Calendar configuration file support.
//!
//! Configuration is read from a TOML file (`calendar.toml`) and then
//! overridden by environment variables for the server binary:
//!
//! ```toml
//! [repository]
//! type = "local"
//!
//! [generation]
//! max_range_days = 31
//! fallback_topic = "Topic will be set by the teacher in class"
//! room_severity = "warning"
//!
//! [holidays]
//! dates = ["2025-11-04", "2025-12-31"]
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! ```
//!
//! Every section is optional; missing values fall back to the defaults above.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::algorithms::clustering::{Severity, SeverityPolicy};
use crate::db::factory::RepositoryType;
use crate::db::repository::RepositoryError;
use crate::services::expander::FixedHolidays;
use crate::services::generator::GenerationSettings;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "CALENDAR_CONFIG";

/// Topic title given to lessons that no curriculum entry could be bound to.
pub const DEFAULT_FALLBACK_TOPIC: &str = "Topic will be set by the teacher in class";

/// Widest generation window accepted by default, in days.
pub const DEFAULT_MAX_RANGE_DAYS: i64 = 31;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub generation: GenerationSection,
    #[serde(default)]
    pub holidays: HolidaySection,
    #[serde(default)]
    pub server: ServerSection,
}

/// Repository type settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
        }
    }
}

/// Generator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSection {
    #[serde(default = "default_max_range_days")]
    pub max_range_days: i64,
    #[serde(default = "default_fallback_topic")]
    pub fallback_topic: String,
    #[serde(default = "default_room_severity")]
    pub room_severity: String,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            max_range_days: default_max_range_days(),
            fallback_topic: default_fallback_topic(),
            room_severity: default_room_severity(),
        }
    }
}

/// Days off skipped by the template expander.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolidaySection {
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
}

/// Bind address of the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_repo_type() -> String {
    "local".to_string()
}

fn default_max_range_days() -> i64 {
    DEFAULT_MAX_RANGE_DAYS
}

fn default_fallback_topic() -> String {
    DEFAULT_FALLBACK_TOPIC.to_string()
}

fn default_room_severity() -> String {
    "warning".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl CalendarConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(CalendarConfig)` if successful
    /// * `Err(RepositoryError)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, RepositoryError> {
        let config: CalendarConfig = toml::from_str(content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `calendar.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        let search_paths = [
            PathBuf::from("calendar.toml"),
            PathBuf::from("backend/calendar.toml"),
            PathBuf::from("../calendar.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(RepositoryError::configuration(
            "No calendar.toml found in standard locations".to_string(),
        ))
    }

    /// Resolve configuration the way the server does.
    ///
    /// `CALENDAR_CONFIG` wins when set; otherwise the default locations are
    /// searched, and built-in defaults are used when no file exists. Environment
    /// overrides are applied last.
    pub fn load() -> Result<Self, RepositoryError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => match Self::from_default_location() {
                Ok(config) => config,
                Err(e) => {
                    log::debug!("Using default configuration: {}", e);
                    Self::default()
                }
            },
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `REPOSITORY_TYPE`, `HOST` and `PORT` from the environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), RepositoryError> {
        if let Ok(repo_type) = std::env::var("REPOSITORY_TYPE") {
            self.repository.repo_type = repo_type;
        }
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port.trim().parse().map_err(|e| {
                RepositoryError::configuration(format!("Invalid PORT '{}': {}", port, e))
            })?;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), RepositoryError> {
        self.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        if self.generation.max_range_days < 1 {
            return Err(RepositoryError::configuration(format!(
                "generation.max_range_days must be positive, got {}",
                self.generation.max_range_days
            )));
        }
        self.room_severity()?;
        Ok(())
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repository.repo_type)
    }

    pub fn room_severity(&self) -> Result<Severity, RepositoryError> {
        self.generation.room_severity.parse().map_err(|e| {
            RepositoryError::configuration(format!("Invalid generation.room_severity: {}", e))
        })
    }

    /// Severity policy with the configured room severity.
    pub fn severity_policy(&self) -> Result<SeverityPolicy, RepositoryError> {
        Ok(SeverityPolicy {
            room: self.room_severity()?,
            ..SeverityPolicy::default()
        })
    }

    pub fn generation_settings(&self) -> Result<GenerationSettings, RepositoryError> {
        Ok(GenerationSettings {
            max_range_days: self.generation.max_range_days,
            fallback_topic: self.generation.fallback_topic.clone(),
            severity: self.severity_policy()?,
        })
    }

    pub fn holiday_calendar(&self) -> FixedHolidays {
        FixedHolidays::new(self.holidays.dates.iter().copied().collect::<BTreeSet<_>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let config = CalendarConfig::from_toml_str(
            r#"
[repository]
type = "local"
"#,
        )
        .unwrap();
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
        assert_eq!(config.generation.max_range_days, 31);
        assert_eq!(config.generation.fallback_topic, DEFAULT_FALLBACK_TOPIC);
        assert_eq!(config.room_severity().unwrap(), Severity::Warning);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_parse_full_config() {
        let config = CalendarConfig::from_toml_str(
            r#"
[repository]
type = "local"

[generation]
max_range_days = 14
fallback_topic = "TBD"
room_severity = "error"

[holidays]
dates = ["2025-11-04"]

[server]
host = "127.0.0.1"
port = 9000
"#,
        )
        .unwrap();

        let settings = config.generation_settings().unwrap();
        assert_eq!(settings.max_range_days, 14);
        assert_eq!(settings.fallback_topic, "TBD");
        assert_eq!(settings.severity.room, Severity::Error);

        let holiday = NaiveDate::from_ymd_opt(2025, 11, 4).unwrap();
        assert_eq!(config.holidays.dates, vec![holiday]);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_rejects_unknown_repository_type() {
        let result = CalendarConfig::from_toml_str(
            r#"
[repository]
type = "oracle"
"#,
        );
        assert!(matches!(
            result,
            Err(RepositoryError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_room_severity() {
        let result = CalendarConfig::from_toml_str(
            r#"
[generation]
room_severity = "fatal"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_non_positive_range() {
        let result = CalendarConfig::from_toml_str(
            r#"
[generation]
max_range_days = 0
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_reads_tempfile() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[generation]\nfallback_topic = \"From file\"").unwrap();

        let config = CalendarConfig::from_file(file.path()).unwrap();
        assert_eq!(config.generation.fallback_topic, "From file");
    }

    #[test]
    fn test_from_file_missing_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = CalendarConfig::from_file(dir.path().join("missing.toml"));
        assert!(matches!(
            result,
            Err(RepositoryError::ConfigurationError { .. })
        ));
    }
}
