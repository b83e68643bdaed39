//! Query and mutation compilers.
//!
//! This crate turns property accesses on placeholder values into
//! serializable query objects. Callers never write query syntax: a select
//! callback receives a placeholder standing for a result node, reads
//! properties off it as if it were data, and the crate records every read
//! into paths, filters, and projections that compile to a wire-format
//! query. Mutations take plain JSON payloads and compile them against the
//! same shape metadata.
//!
//! # Architecture
//!
//! - [`trace`]: the placeholder value ([`QueryValue`]) and the recorded
//!   access chains behind it, plus filter construction ([`Evaluation`])
//! - [`select`]: [`SelectQueryBuilder`], the lazy read-side entry point
//! - [`describe`]: conversion of mutation payloads into typed
//!   [`NodeDescription`] records
//! - [`mutate`]: create/update/delete builders over [`describe`]
//! - [`context`]: named per-request values resolved into filter arguments
//! - [`path`] / [`filter`] / [`wire`]: the serializable query model
//! - [`result_shape`]: structural descriptors derived from compiled
//!   queries, for checking adapter results
//!
//! # Design
//!
//! Tracing is pure bookkeeping: no storage is touched and nothing
//! executes until a builder's `query_object` runs the callbacks against
//! fresh placeholder roots. Placeholder chains are immutable and shared
//! (`Arc` links), so branching off one placeholder several times is safe
//! and each branch records its own steps. Errors inside a callback poison
//! the placeholder instead of panicking; compilation surfaces the first
//! recorded error.

pub mod context;
pub mod describe;
pub mod error;
pub mod filter;
pub mod mutate;
pub mod path;
pub mod result_shape;
pub mod select;
pub mod trace;
pub mod wire;

#[cfg(test)]
mod testutil;

pub use context::{ContextValue, QueryContext};
pub use describe::{Field, FieldValue, NodeDescription, SetModification};
pub use error::{QueryError, Result};
pub use filter::{WhereArg, WhereEvaluation, WhereMethod, WherePath};
pub use mutate::{CreateQueryBuilder, DeleteQueryBuilder, DeleteTargets, UpdateQueryBuilder};
pub use path::{CustomSelect, PropertyRef, QueryPath, QuerySelect, QueryStep};
pub use result_shape::ResultShape;
pub use select::{SelectQueryBuilder, Selection};
pub use trace::{Evaluation, FilterArg, QueryValue};
pub use wire::{
    CreateQuery, DeleteQuery, DeleteResult, QueryType, SelectQuery, SortDirection, SortSpec,
    UpdateQuery,
};
