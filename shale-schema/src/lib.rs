//! Shape registry and hierarchy resolution.
//!
//! This crate is the metadata backbone of Shale: it stores SHACL-style
//! shape descriptions of application data and answers the structural
//! questions the query and mutation compilers ask while they run.
//!
//! # Architecture
//!
//! - [`shape`]: the stored records ([`NodeShape`], [`PropertyShape`]) and
//!   the declaration inputs used to register them
//! - [`registry`]: [`ShapeRegistry`], an arena of shapes addressed by
//!   copyable [`ShapeId`] handles, with registration, override merging,
//!   and property resolution
//! - [`hierarchy`]: transitive sub/super-shape queries over the `extends`
//!   chain, cached and invalidated by registry version
//! - [`dispatch`]: per-shape accessor tables mapping property labels to
//!   resolved definitions plus a value-kind classification
//!
//! # Design
//!
//! Shapes form a single-inheritance forest: a shape's parent is fixed at
//! registration and must already exist, so the hierarchy is acyclic by
//! construction. All derived views (transitive closures, dispatch tables,
//! specificity filters) are computed lazily and cached against a version
//! counter that every mutation bumps; readers never observe a stale view,
//! and registration never does recomputation work itself.

pub mod datatype;
pub mod dispatch;
pub mod error;
pub mod hierarchy;
pub mod registry;
pub mod shape;

pub use dispatch::{DispatchTable, PropertyResolution, ValueKind};
pub use error::{Result, SchemaError};
pub use registry::ShapeRegistry;
pub use shape::{
    NodeKind, NodeShape, NodeShapeConfig, PropertyShape, PropertyShapeConfig, ShapeId,
};
