//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::CalendarConfig;
use crate::db::repository::{FullRepository, RepositoryResult};
use crate::services::expander::FixedHolidays;
use crate::services::generator::GenerationSettings;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for storage operations
    pub repository: Arc<dyn FullRepository>,
    /// Generation limits, fallback topic and severity policy
    pub settings: Arc<GenerationSettings>,
    /// Days off skipped by expansion and date distribution
    pub holidays: Arc<FixedHolidays>,
}

impl AppState {
    /// Create a new application state with default settings and no holidays.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self {
            repository,
            settings: Arc::new(GenerationSettings::default()),
            holidays: Arc::new(FixedHolidays::default()),
        }
    }

    /// Create the state from a loaded configuration.
    pub fn from_config(
        repository: Arc<dyn FullRepository>,
        config: &CalendarConfig,
    ) -> RepositoryResult<Self> {
        Ok(Self {
            repository,
            settings: Arc::new(config.generation_settings()?),
            holidays: Arc::new(config.holiday_calendar()),
        })
    }
}
