//! Query and mutation compiler errors.
//!
//! Trace errors are recorded on the placeholder where they happen and
//! surface from serialization, so every variant here is `Clone`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error(transparent)]
    Schema(#[from] shale_schema::SchemaError),

    /// Property access that no visible declaration answers.
    #[error("property '{property}' is not registered on shape '{shape}'")]
    UnknownProperty { shape: String, property: String },

    /// Object-valued property used where its value shape is needed but was
    /// never resolved.
    #[error("property '{property}' has no resolved value shape")]
    UnresolvedValueShape { property: String },

    /// Operation applied to a placeholder kind that does not support it.
    #[error("{op}() is not applicable here: {detail}")]
    InvalidOperation { op: &'static str, detail: String },

    /// `where` nested inside a filter callback.
    #[error("where() may not be called inside a filter callback; use some() or every()")]
    WhereInsideWhere,

    /// Mutation payload that is not an object, or carries a malformed
    /// metadata key.
    #[error("invalid description for shape '{shape}': {detail}")]
    InvalidDescription { shape: String, detail: String },

    /// Arrays of arrays have no graph representation.
    #[error("property '{property}': nested arrays are not representable")]
    NestedArray { property: String },

    /// Set removal entry that is not a node reference.
    #[error("property '{property}': {detail}")]
    InvalidRemoveValue { property: String, detail: String },

    /// `{add}`/`{remove}` applied to a single-valued property.
    #[error("property '{property}' is single-valued and cannot take set modifications")]
    SetModificationOnSingle { property: String },

    /// Date-typed field whose string value failed RFC 3339 parsing.
    #[error("property '{property}': '{value}' is not a valid date: {detail}")]
    InvalidDate {
        property: String,
        value: String,
        detail: String,
    },

    #[error("property '{property}' requires at least {min} value(s), {supplied} supplied")]
    CardinalityBelowMin {
        property: String,
        min: u32,
        supplied: usize,
    },

    #[error("property '{property}' admits at most {max} value(s), {supplied} supplied")]
    CardinalityAboveMax {
        property: String,
        max: u32,
        supplied: usize,
    },
}

pub type Result<T> = std::result::Result<T, QueryError>;
