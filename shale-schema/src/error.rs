//! Schema error types.

use crate::shape::ShapeId;
use thiserror::Error;

/// Errors raised by shape registration and resolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A handle that does not index into this registry's arena.
    #[error("unknown shape handle {0:?}")]
    UnknownShape(ShapeId),

    /// Shape declared with an `extends` target the registry has never seen.
    #[error("shape '{label}' extends an unknown parent shape")]
    UnknownParent { label: String },

    /// Property declaration rejected before any merge took place.
    #[error("property '{label}' on shape '{shape}' is malformed: {reason}")]
    MalformedProperty {
        shape: String,
        label: String,
        reason: String,
    },

    /// Override attempted to loosen a constraint inherited from an ancestor.
    #[error(
        "incompatible override of '{label}' on shape '{shape}': \
         {field} may only {rule} (inherited {previous}, declared {attempted})"
    )]
    IncompatibleOverride {
        shape: String,
        label: String,
        field: &'static str,
        rule: &'static str,
        previous: String,
        attempted: String,
    },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
