//! Storage adapter traits and shape-based routing.
//!
//! Shale compiles queries; adapters execute them. This crate defines the
//! execution boundary ([`QuadStore`], [`FileStore`]) and the router that
//! picks an adapter per query from the query's shape.
//!
//! # Design
//!
//! Routing follows the shape hierarchy: a query against `Employee` runs on
//! the adapter registered for `Employee`, else `Person`, else `Agent`,
//! else the default adapter. A missing adapter is an error result, never a
//! panic: adapter wiring is runtime configuration, discovered at call
//! time. Decisions are memoized per shape with a TTL so the hierarchy walk
//! does not repeat per query, while adapters registered after the first
//! lookup still take over once the memo ages out.

pub mod adapter;
pub mod error;
pub mod router;

pub use adapter::{FileStore, QuadStore};
pub use error::{Result, StoreError};
pub use router::StoreRouter;
