//! Domain errors surfaced to callers of the store

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{what} name must not be empty")]
    EmptyName { what: &'static str },

    #[error("folder '{0}' is protected and cannot be deleted")]
    ProtectedFolder(String),

    #[error("folder '{0}' does not exist")]
    UnknownFolder(String),

    #[error("language '{0}' is not supported")]
    UnsupportedLanguage(String),
}
