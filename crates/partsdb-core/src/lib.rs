pub mod app_config;
pub mod config;
pub mod record;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, ScraperSettings};
pub use config::{load_app_config, load_app_config_from_env};
pub use record::{
    Appliance, InsertOutcome, PartRecord, PartStore, PartType, DEFAULT_SUPPORT_PHONE,
    NOT_AVAILABLE, NO_DESCRIPTION, PLACEHOLDER_IMAGE, PRICE_NOT_LISTED, SUPPORT_PHONE_KEY,
    ZERO_RATING,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown part type: {0}")]
    UnknownPartType(String),

    #[error("unknown appliance: {0}")]
    UnknownAppliance(String),
}
