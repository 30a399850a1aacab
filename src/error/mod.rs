use crate::config::ConfigError;
use crate::storage::StorageError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Usage(String),
    #[error("unknown theme preference: {0}")]
    UnknownPreference(String),
    #[cfg(feature = "gtk")]
    #[error("failed to initialise GTK: {0}")]
    Gtk(String),
}
