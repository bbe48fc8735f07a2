//! Window and tolerance settings shared by every engine computation.
//!
//! All of the time constants the engine depends on live here so that a
//! report never hard-codes its own idea of "nearby" or "recent".

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

const DEFAULT_MATCH_TOLERANCE_HOURS: u32 = 6;
const DEFAULT_RETENTION_DAYS: u32 = 90;
const DEFAULT_IMPACT_BEFORE_HOURS: u32 = 24;
const DEFAULT_IMPACT_AFTER_HOURS: u32 = 24;
const DEFAULT_PUBLICATION_GAIN_DAYS: u32 = 7;
const DEFAULT_SEMANTICS_TOLERANCE: u32 = 2;

/// Upper bound for any configured window, roughly ten years.
const MAX_WINDOW_DAYS: u32 = 3_650;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Half-width of the nearest-sample search window.
    pub match_tolerance_hours: u32,
    /// Trailing coverage of the incremental (daily) analytics stream.
    pub retention_days: u32,
    pub impact_before_hours: u32,
    pub impact_after_hours: u32,
    /// How long after publication a follower gain is still credited to the article.
    pub publication_gain_days: u32,
    /// Absolute slack when comparing a lifetime counter against MAX/SUM of daily values.
    pub semantics_tolerance: u32,
    /// Omit entities with non-positive deltas from attribution output.
    pub attribution_floor_negative: bool,
    pub author_username: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_tolerance_hours: DEFAULT_MATCH_TOLERANCE_HOURS,
            retention_days: DEFAULT_RETENTION_DAYS,
            impact_before_hours: DEFAULT_IMPACT_BEFORE_HOURS,
            impact_after_hours: DEFAULT_IMPACT_AFTER_HOURS,
            publication_gain_days: DEFAULT_PUBLICATION_GAIN_DAYS,
            semantics_tolerance: DEFAULT_SEMANTICS_TOLERANCE,
            attribution_floor_negative: true,
            author_username: None,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn match_tolerance(&self) -> Duration {
        Duration::hours(i64::from(self.match_tolerance_hours))
    }

    #[must_use]
    pub fn retention_window(&self) -> Duration {
        Duration::days(i64::from(self.retention_days))
    }

    #[must_use]
    pub fn impact_before(&self) -> Duration {
        Duration::hours(i64::from(self.impact_before_hours))
    }

    #[must_use]
    pub fn impact_after(&self) -> Duration {
        Duration::hours(i64::from(self.impact_after_hours))
    }

    #[must_use]
    pub fn publication_gain_window(&self) -> Duration {
        Duration::days(i64::from(self.publication_gain_days))
    }

    #[must_use]
    pub fn semantics_tolerance(&self) -> i64 {
        i64::from(self.semantics_tolerance)
    }

    /// Replace the configured author when `author` is `Some`.
    ///
    /// The environment wins over the file so one config file can be shared
    /// between accounts.
    #[must_use]
    pub fn with_author_override(mut self, author: Option<String>) -> Self {
        if author.is_some() {
            self.author_username = author;
        }
        self
    }

    /// Check every window against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_hours = MAX_WINDOW_DAYS * 24;

        if self.match_tolerance_hours > max_hours {
            return Err(ConfigError::Validation(format!(
                "match_tolerance_hours must be at most {max_hours}, got {}",
                self.match_tolerance_hours
            )));
        }

        for (name, value, max) in [
            ("retention_days", self.retention_days, MAX_WINDOW_DAYS),
            ("impact_before_hours", self.impact_before_hours, max_hours),
            ("impact_after_hours", self.impact_after_hours, max_hours),
            (
                "publication_gain_days",
                self.publication_gain_days,
                MAX_WINDOW_DAYS,
            ),
        ] {
            if value == 0 || value > max {
                return Err(ConfigError::Validation(format!(
                    "{name} must be between 1 and {max}, got {value}"
                )));
            }
        }

        if let Some(author) = &self.author_username {
            if author.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "author_username must be non-empty when set".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Load and validate the engine configuration from a YAML file.
///
/// Missing keys fall back to their defaults; unknown keys are rejected so a
/// typo does not silently leave a window at its default.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::EngineFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_engine_config(&content)
}

fn parse_engine_config(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = if content.trim().is_empty() {
        EngineConfig::default()
    } else {
        serde_yaml::from_str(content)?
    };
    config.validate()?;
    Ok(config)
}
