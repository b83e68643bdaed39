//! Core types shared across the Shale workspace.
//!
//! This crate holds the small vocabulary every other layer speaks:
//!
//! - [`Iri`]: interned identifier for shapes, properties, and classes
//! - [`Literal`] / [`LiteralKind`]: the primitive values a property can carry
//! - [`NodeRef`]: an `{id}` pointer to an existing graph node
//! - [`MemoCache`] / [`CachePolicy`]: string-keyed memoization with
//!   time-boxed entries
//!
//! # Design
//!
//! Everything here is deliberately dependency-light and synchronous. The
//! schema registry, query tracer, and storage router all build on these
//! types, so they avoid async machinery and heavy allocation: identifiers
//! are `Arc<str>` backed and clone by pointer, literals are a flat enum,
//! and the cache is a `parking_lot` map guarded for short critical
//! sections only.

pub mod cache;
pub mod iri;
pub mod node_ref;
pub mod value;

pub use cache::{CachePolicy, MemoCache};
pub use iri::Iri;
pub use node_ref::NodeRef;
pub use value::{Literal, LiteralKind};
