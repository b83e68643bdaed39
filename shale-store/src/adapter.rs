//! Storage adapter traits.
//!
//! Adapters execute compiled query objects against whatever holds the
//! data. The traits are runtime-agnostic and use `async_trait`; this crate
//! ships no backend, only the contract and the routing in front of it.
//!
//! ## Traits
//!
//! - `QuadStore`: executes compiled select/create/update/delete queries;
//!   only `select_query` is mandatory, mutations are optional capabilities
//! - `FileStore`: blob storage a graph store may collaborate with (file
//!   uploads referenced from graph nodes)
//!
//! ## Implementations
//!
//! Applications provide their own: a database client, an HTTP bridge to a
//! query service, or an in-memory fixture in tests. An adapter that only
//! answers reads simply leaves the mutation methods defaulted; the router
//! surfaces [`StoreError::Unsupported`] when a caller reaches for them.

use crate::error::{Result, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use shale_query::{CreateQuery, DeleteQuery, DeleteResult, SelectQuery, UpdateQuery};
use std::fmt::Debug;

// ============================================================================
// Graph store
// ============================================================================

/// Executes compiled queries against a graph data source.
#[async_trait]
pub trait QuadStore: Debug + Send + Sync {
    /// One-time setup, called when the adapter is registered with a
    /// router. The default does nothing.
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Execute a compiled select and return one JSON value per result
    /// node, shaped by the query's selection.
    async fn select_query(&self, query: &SelectQuery) -> Result<Vec<Value>>;

    /// Execute a compiled create. Optional; the default rejects.
    async fn create_query(&self, query: &CreateQuery) -> Result<Value> {
        let _ = query;
        Err(StoreError::Unsupported { op: "create" })
    }

    /// Execute a compiled update. Optional; the default rejects.
    async fn update_query(&self, query: &UpdateQuery) -> Result<Value> {
        let _ = query;
        Err(StoreError::Unsupported { op: "update" })
    }

    /// Execute a compiled delete. Optional; the default rejects.
    async fn delete_query(&self, query: &DeleteQuery) -> Result<DeleteResult> {
        let _ = query;
        Err(StoreError::Unsupported { op: "delete" })
    }
}

// ============================================================================
// File store
// ============================================================================

/// Blob storage for files referenced from graph nodes.
///
/// Kept separate from [`QuadStore`]: file content does not flow through
/// query compilation, but applications that store upload references in the
/// graph need both behind one boundary.
#[async_trait]
pub trait FileStore: Debug + Send + Sync {
    /// One-time setup, called when the store is attached. The default does
    /// nothing.
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Public URL under which `name` can be fetched.
    async fn access_url(&self, name: &str) -> Result<String>;

    async fn save_file(&self, name: &str, bytes: &[u8]) -> Result<()>;

    async fn get_file(&self, name: &str) -> Result<Vec<u8>>;

    /// Delete `name`. Deleting a missing file succeeds; only actual
    /// failures error.
    async fn delete_file(&self, name: &str) -> Result<()>;

    async fn file_exists(&self, name: &str) -> Result<bool>;

    /// List stored names under a prefix. May be expensive on large
    /// prefixes.
    async fn list_files(&self, prefix: &str) -> Result<Vec<String>>;
}
