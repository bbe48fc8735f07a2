//! Shared domain model and configuration for devpulse.
//!
//! Everything here is plain data: snapshot records as the store hands them
//! over, the milestone event taxonomy, and the two configuration layers
//! (process environment and engine windows).

pub mod app_config;
pub mod config;
pub mod engine_config;
pub mod event;
pub mod model;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use engine_config::{load_engine_config, EngineConfig};
pub use event::{EventType, MilestoneEvent};
pub use model::{
    counters, ArticleInfo, CommentRecord, ContentVersion, EntityId, FollowerSnapshot,
    IncrementalRecord, MetricSnapshot, ReferrerCount,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read engine config file {path}: {source}")]
    EngineFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse engine config: {0}")]
    EngineFileParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid event type: {0}")]
    InvalidEventType(String),
}
