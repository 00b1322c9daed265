use thiserror::Error;

use crate::core::config::SettingsError;

/// Fatal startup failures; the process does not begin serving when any of
/// these occur.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("configuration error: {0}")]
    Config(#[from] SettingsError),
    #[error("vector store error: {0}")]
    VectorStore(String),
}
