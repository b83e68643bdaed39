//! Serialized filter conditions.
//!
//! A [`WherePath`] is the wire form of one filter: a first evaluation plus
//! an ordered and/or chain. There is no operator precedence; entries apply
//! left to right in the order the filter was built. Arguments are literals,
//! relative paths, subject references (externally supplied nodes, `null`
//! when the context value was missing), or nested filters carried by the
//! `some`/`every` quantifiers.

use crate::path::QueryPath;
use serde::Serialize;
use shale_core::Literal;

/// A compiled filter: first evaluation plus its and/or chain.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WherePath {
    pub first_path: WhereEvaluation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub and_or: Vec<AndOrEntry>,
}

/// One chained condition, tagged with its conjunction.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AndOrEntry {
    And(WherePath),
    Or(WherePath),
}

/// A single condition: the filtered path, the method, and its arguments.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WhereEvaluation {
    pub path: QueryPath,
    pub method: WhereMethod,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<WhereArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WhereMethod {
    Equals,
    Some,
    Every,
}

/// A filter argument in wire form.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WhereArg {
    /// Plain literal comparison value.
    Literal(Literal),
    /// Another traced path, relative to the same root as the filtered path.
    Path { path: QueryPath },
    /// An externally supplied subject; `null` when the context value was
    /// missing at build time.
    Subject { subject: Option<String> },
    /// Nested condition carried by `some`/`every`.
    Filter(Box<WherePath>),
}
