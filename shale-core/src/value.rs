//! Literal values.
//!
//! [`Literal`] covers the primitive values a traced property can stand for
//! and a mutation field can carry: strings, 64-bit integers, doubles,
//! booleans, UTC date-times, and the null placeholder used for unset values
//! and missing context entries.
//!
//! Serialization is untagged: a `Literal` lands in compiled query objects as
//! the bare JSON value (`"Moa"`, `42`, `true`, `null`), with date-times as
//! RFC 3339 strings. Literals are serialize-only; inbound JSON is interpreted
//! against the owning property's declared datatype by the conversion layer,
//! not by blind deserialization.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A primitive value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Boolean(bool),
    Long(i64),
    Double(f64),
    DateTime(DateTime<Utc>),
    String(String),
    /// Unset / absent. Serializes as JSON `null`.
    Null,
}

impl Literal {
    /// The kind tag for this literal, or `None` for [`Literal::Null`].
    pub fn kind(&self) -> Option<LiteralKind> {
        match self {
            Literal::Boolean(_) => Some(LiteralKind::Boolean),
            Literal::Long(_) | Literal::Double(_) => Some(LiteralKind::Number),
            Literal::DateTime(_) => Some(LiteralKind::DateTime),
            Literal::String(_) => Some(LiteralKind::String),
            Literal::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Long(n) => write!(f, "{n}"),
            Literal::Double(n) => write!(f, "{n}"),
            Literal::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Literal::String(s) => write!(f, "{s}"),
            Literal::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Long(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Long(n as i64)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Double(n)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(dt: DateTime<Utc>) -> Self {
        Literal::DateTime(dt)
    }
}

/// Kind tag for literal-valued properties.
///
/// Drives which placeholder kind a property access produces during tracing:
/// a `xsd:string`-typed property yields a string placeholder, a
/// `xsd:dateTime`-typed one a date placeholder, and so on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    String,
    Number,
    Boolean,
    DateTime,
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LiteralKind::String => "string",
            LiteralKind::Number => "number",
            LiteralKind::Boolean => "boolean",
            LiteralKind::DateTime => "dateTime",
        };
        f.write_str(name)
    }
}
