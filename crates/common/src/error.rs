//! Error types for ShopCheck

use thiserror::Error;

/// Result type alias using ShopCheck Error
pub type Result<T> = std::result::Result<T, Error>;

/// ShopCheck configuration errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown user type: {tag}. Available: {}", available.join(", "))]
    UnknownUserType { tag: String, available: Vec<String> },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
