use thiserror::Error;

/// Top-level error type for tabletalk.
///
/// Subsystem crates define their own error types and convert into or out of
/// this one at crate seams so that `?` works across them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TabletalkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Frame error: {0}")]
    Frame(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for TabletalkError {
    fn from(err: toml::de::Error) -> Self {
        TabletalkError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TabletalkError {
    fn from(err: toml::ser::Error) -> Self {
        TabletalkError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for TabletalkError {
    fn from(err: serde_yaml::Error) -> Self {
        TabletalkError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for tabletalk operations.
pub type Result<T> = std::result::Result<T, TabletalkError>;
