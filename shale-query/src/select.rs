//! Select-query construction.
//!
//! [`SelectQueryBuilder`] is the lazy entry point for reads: callers attach
//! a select callback, optional filter, sort, and pagination, and nothing
//! runs until [`query_object`](SelectQueryBuilder::query_object) traces the
//! callbacks against placeholder roots and serializes the result. Builders
//! are templates: `exec_for` clones one with a different bound subject and
//! the callbacks re-trace on compilation.

use crate::error::{QueryError, Result};
use crate::path::{CustomSelect, QuerySelect};
use crate::trace::{Evaluation, QueryValue};
use crate::wire::{QueryType, SelectQuery, SortDirection, SortSpec};
use shale_core::NodeRef;
use shale_schema::{ShapeId, ShapeRegistry};
use std::fmt;
use std::sync::Arc;

type BuildFn = Arc<dyn Fn(&QueryValue) -> Selection + Send + Sync>;
type FilterFn = Arc<dyn Fn(&QueryValue) -> Evaluation + Send + Sync>;

/// What a select callback picked: one traced value, several, or a custom
/// object whose keys name the values.
#[derive(Clone)]
pub enum Selection {
    One(QueryValue),
    Many(Vec<QueryValue>),
    Named(Vec<(String, QueryValue)>),
}

impl Selection {
    pub(crate) fn to_query_select(&self) -> Result<QuerySelect> {
        match self {
            Selection::One(value) => Ok(QuerySelect::Paths(vec![value.query_path()?])),
            Selection::Many(values) => Ok(QuerySelect::Paths(
                values
                    .iter()
                    .map(QueryValue::query_path)
                    .collect::<Result<Vec<_>>>()?,
            )),
            Selection::Named(pairs) => Ok(QuerySelect::Custom(CustomSelect(
                pairs
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), value.query_path()?)))
                    .collect::<Result<Vec<_>>>()?,
            ))),
        }
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::One(_) => f.write_str("Selection::One"),
            Selection::Many(v) => write!(f, "Selection::Many({})", v.len()),
            Selection::Named(v) => write!(f, "Selection::Named({})", v.len()),
        }
    }
}

impl From<QueryValue> for Selection {
    fn from(value: QueryValue) -> Self {
        Selection::One(value)
    }
}

impl From<Vec<QueryValue>> for Selection {
    fn from(values: Vec<QueryValue>) -> Self {
        Selection::Many(values)
    }
}

impl<const N: usize> From<[QueryValue; N]> for Selection {
    fn from(values: [QueryValue; N]) -> Self {
        Selection::Many(values.into())
    }
}

impl From<Vec<(String, QueryValue)>> for Selection {
    fn from(pairs: Vec<(String, QueryValue)>) -> Self {
        Selection::Named(pairs)
    }
}

impl<const N: usize> From<[(&str, QueryValue); N]> for Selection {
    fn from(pairs: [(&str, QueryValue); N]) -> Self {
        Selection::Named(
            pairs
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )
    }
}

/// Lazy builder for select queries.
///
/// Setters are infallible and chain; all tracing and validation happens in
/// the terminal [`query_object`](Self::query_object).
#[derive(Clone)]
pub struct SelectQueryBuilder {
    registry: ShapeRegistry,
    shape: ShapeId,
    subject: Option<NodeRef>,
    build: Option<BuildFn>,
    filter: Option<FilterFn>,
    sort: Option<(BuildFn, SortDirection)>,
    limit: Option<usize>,
    offset: Option<usize>,
    single: bool,
}

impl SelectQueryBuilder {
    pub fn new(registry: &ShapeRegistry, shape: ShapeId) -> Self {
        Self {
            registry: registry.clone(),
            shape,
            subject: None,
            build: None,
            filter: None,
            sort: None,
            limit: None,
            offset: None,
            single: false,
        }
    }

    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    /// Choose what each result node carries. The callback receives a
    /// placeholder root and its property reads become the selection.
    pub fn select<S, F>(mut self, build: F) -> Self
    where
        S: Into<Selection>,
        F: Fn(&QueryValue) -> S + Send + Sync + 'static,
    {
        self.build = Some(Arc::new(move |root| build(root).into()));
        self
    }

    /// Restrict results to nodes matching the built condition.
    pub fn where_<F>(mut self, build: F) -> Self
    where
        F: Fn(&QueryValue) -> Evaluation + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(build));
        self
    }

    /// Sort results by the traced path(s), all in one direction.
    pub fn sort_by<S, F>(mut self, build: F, direction: SortDirection) -> Self
    where
        S: Into<Selection>,
        F: Fn(&QueryValue) -> S + Send + Sync + 'static,
    {
        self.sort = Some((Arc::new(move |root| build(root).into()), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Ask for a single node rather than a result list.
    pub fn one(mut self) -> Self {
        self.single = true;
        self
    }

    /// Bind the query to one subject. Implies a single result.
    pub fn subject(mut self, subject: impl Into<NodeRef>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Clone this builder as a template bound to a different subject. The
    /// callbacks re-trace when the clone compiles.
    pub fn exec_for(&self, subject: impl Into<NodeRef>) -> Self {
        let mut cloned = self.clone();
        cloned.subject = Some(subject.into());
        cloned
    }

    /// Trace the callbacks and compile the serializable query object.
    pub fn query_object(&self) -> Result<SelectQuery> {
        let select = match &self.build {
            Some(build) => {
                let root = QueryValue::root(self.registry.clone(), self.shape, false);
                build(&root).to_query_select()?
            }
            None => QuerySelect::Paths(Vec::new()),
        };

        let where_path = match &self.filter {
            Some(filter) => {
                let root = QueryValue::root(self.registry.clone(), self.shape, true);
                Some(filter(&root).to_where_path()?)
            }
            None => None,
        };

        let sort_by = match &self.sort {
            Some((build, direction)) => {
                let root = QueryValue::root(self.registry.clone(), self.shape, false);
                match build(&root).to_query_select()? {
                    QuerySelect::Paths(paths) => Some(SortSpec {
                        paths,
                        direction: *direction,
                    }),
                    QuerySelect::Custom(_) => {
                        return Err(QueryError::InvalidOperation {
                            op: "sortBy",
                            detail: "sort selections must be plain paths".to_string(),
                        })
                    }
                }
            }
            None => None,
        };

        Ok(SelectQuery {
            query_type: QueryType::Select,
            select,
            where_path,
            sort_by,
            subject: self.subject.as_ref().map(|s| s.id.clone()),
            limit: self.limit,
            offset: self.offset,
            shape: self.registry.iri_of(self.shape)?,
            single_result: self.single || self.subject.is_some(),
        })
    }

    /// Compile and structurally check a result payload against the query.
    pub fn is_valid_result(&self, value: &serde_json::Value) -> Result<bool> {
        Ok(self.query_object()?.is_valid_result(value))
    }
}

impl fmt::Debug for SelectQueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectQueryBuilder")
            .field("shape", &self.shape)
            .field("subject", &self.subject)
            .field("has_select", &self.build.is_some())
            .field("has_where", &self.filter.is_some())
            .field("single", &self.single)
            .finish()
    }
}
