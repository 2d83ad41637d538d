use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MedbotError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to initialize database: {0}")]
    DatabaseInitializationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid {field}: {value:?} is not a whole number")]
    InputParse { field: &'static str, value: String },
}

impl From<toml::de::Error> for MedbotError {
    fn from(err: toml::de::Error) -> Self {
        MedbotError::ConfigError(err.to_string())
    }
}
