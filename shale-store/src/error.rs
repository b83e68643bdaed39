//! Storage-layer errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// No adapter is registered for the shape or any of its ancestors, and
    /// no default adapter exists. Reported as a rejected call result; the
    /// router never panics over configuration gaps.
    #[error("no storage adapter is configured for shape '{shape}'")]
    NoAdapter { shape: String },

    /// The routed adapter does not implement this optional operation.
    #[error("storage adapter does not support {op}")]
    Unsupported { op: &'static str },

    /// Schema lookup failed while routing.
    #[error(transparent)]
    Schema(#[from] shale_schema::SchemaError),

    /// Backend-reported failure, opaque to the router.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
