//! Node references.
//!
//! A [`NodeRef`] is an `{id}` pointer to an existing graph node: identity
//! only, no data. Mutation compilers emit them for already-stored values,
//! and set-removal lists accept nothing else.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to an existing node by identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: String,
}

impl NodeRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl From<&str> for NodeRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeRef {
    fn from(id: String) -> Self {
        Self { id }
    }
}
