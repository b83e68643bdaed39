//! Error type for the Shale API facade.

use thiserror::Error;

/// API error wrapping errors from the underlying crates.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Schema registration or lookup errors.
    #[error("schema error: {0}")]
    Schema(#[from] shale_schema::SchemaError),

    /// Query or mutation compilation errors.
    #[error("query error: {0}")]
    Query(#[from] shale_query::QueryError),

    /// Routing or adapter errors.
    #[error("store error: {0}")]
    Store(#[from] shale_store::StoreError),

    /// A checked execution whose result payload does not match the
    /// compiled query's expected structure.
    #[error("result payload does not match the query compiled against shape '{shape}'")]
    ResultShapeMismatch { shape: String },
}

pub type Result<T> = std::result::Result<T, ApiError>;
