//! Compiled query objects.
//!
//! These are the serializable records handed to storage adapters. They
//! carry no behavior beyond serialization and result-shape derivation; a
//! compiled query can cross a process boundary and still mean the same
//! thing.

use crate::describe::NodeDescription;
use crate::filter::WherePath;
use crate::path::{QueryPath, QuerySelect};
use serde::{Deserialize, Serialize};
use shale_core::{Iri, NodeRef};

/// Discriminator for the four query kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Select,
    Create,
    Update,
    Delete,
}

/// A compiled read query.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectQuery {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    pub select: QuerySelect,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_path: Option<WherePath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortSpec>,
    /// Bound subject; set by `exec_for` / a subject-scoped build.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    /// Identifier of the shape the query was built against.
    pub shape: Iri,
    /// True when the caller asked for a single node (`one()` or a bound
    /// subject) rather than a result list.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub single_result: bool,
}

/// Sort instruction: one or more paths and a shared direction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SortSpec {
    pub paths: Vec<QueryPath>,
    pub direction: SortDirection,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

/// A compiled node creation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreateQuery {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    pub shape: Iri,
    pub description: NodeDescription,
}

/// A compiled update of one existing node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpdateQuery {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    /// Identifier of the node being updated.
    pub id: String,
    pub shape: Iri,
    pub updates: NodeDescription,
}

/// A compiled removal of one or more nodes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeleteQuery {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    pub shape: Iri,
    pub ids: Vec<NodeRef>,
}

/// Adapter report for a delete: which nodes went away and which failed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub deleted: Vec<NodeRef>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<NodeRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}
