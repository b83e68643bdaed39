//! Execution handles for the [`Shale`](crate::Shale) facade.
//!
//! A handle pairs a compiler builder with the facade that can execute its
//! output. Chainable setters configure the query; nothing touches storage
//! until a terminal `execute*` runs. Each terminal awaits the facade's
//! readiness gate, compiles, routes by the query's shape, and calls the
//! adapter.

use crate::error::{ApiError, Result};
use crate::Shale;
use serde_json::Value;
use shale_core::NodeRef;
use shale_query::{
    CreateQuery, CreateQueryBuilder, DeleteQuery, DeleteQueryBuilder, DeleteResult, DeleteTargets,
    Evaluation, QueryValue, SelectQuery, SelectQueryBuilder, Selection, SortDirection,
    UpdateQuery, UpdateQueryBuilder,
};
use shale_schema::ShapeId;

// ============================================================================
// Select
// ============================================================================

/// Chainable read query against one shape.
#[derive(Clone, Debug)]
pub struct SelectHandle<'a> {
    shale: &'a Shale,
    builder: SelectQueryBuilder,
}

impl<'a> SelectHandle<'a> {
    pub(crate) fn new(shale: &'a Shale, shape: ShapeId) -> Self {
        Self {
            shale,
            builder: SelectQueryBuilder::new(shale.registry(), shape),
        }
    }

    // --- Chainable setters ---

    pub fn select<S, F>(mut self, build: F) -> Self
    where
        S: Into<Selection>,
        F: Fn(&QueryValue) -> S + Send + Sync + 'static,
    {
        self.builder = self.builder.select(build);
        self
    }

    pub fn where_<F>(mut self, build: F) -> Self
    where
        F: Fn(&QueryValue) -> Evaluation + Send + Sync + 'static,
    {
        self.builder = self.builder.where_(build);
        self
    }

    pub fn sort_by<S, F>(mut self, build: F, direction: SortDirection) -> Self
    where
        S: Into<Selection>,
        F: Fn(&QueryValue) -> S + Send + Sync + 'static,
    {
        self.builder = self.builder.sort_by(build, direction);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.builder = self.builder.limit(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.builder = self.builder.offset(offset);
        self
    }

    /// Ask for a single node rather than a result list.
    pub fn one(mut self) -> Self {
        self.builder = self.builder.one();
        self
    }

    /// Bind the query to one subject. Implies a single result.
    pub fn subject(mut self, subject: impl Into<NodeRef>) -> Self {
        self.builder = self.builder.subject(subject);
        self
    }

    /// Clone this handle as a template bound to a different subject.
    pub fn exec_for(&self, subject: impl Into<NodeRef>) -> Self {
        Self {
            shale: self.shale,
            builder: self.builder.exec_for(subject),
        }
    }

    // --- Terminal operations ---

    /// Compile without executing.
    pub fn query_object(&self) -> Result<SelectQuery> {
        Ok(self.builder.query_object()?)
    }

    /// Await readiness, compile, route, and run the query.
    pub async fn execute(&self) -> Result<Vec<Value>> {
        self.shale.await_readiness().await;
        let query = self.builder.query_object()?;
        let store = self.shale.router().store_for(self.builder.shape())?;
        Ok(store.select_query(&query).await?)
    }

    /// [`execute`](Self::execute), then check the payload against the
    /// query's expected structure.
    pub async fn execute_checked(&self) -> Result<Vec<Value>> {
        self.shale.await_readiness().await;
        let query = self.builder.query_object()?;
        let store = self.shale.router().store_for(self.builder.shape())?;
        let rows = store.select_query(&query).await?;

        let payload = if query.single_result {
            rows.first().cloned().unwrap_or(Value::Null)
        } else {
            Value::Array(rows.clone())
        };
        if !query.is_valid_result(&payload) {
            return Err(ApiError::ResultShapeMismatch {
                shape: query.shape.to_string(),
            });
        }
        Ok(rows)
    }
}

// ============================================================================
// Create / Update / Delete
// ============================================================================

/// Pending node creation.
#[derive(Clone, Debug)]
pub struct CreateHandle<'a> {
    shale: &'a Shale,
    builder: CreateQueryBuilder<'a>,
}

impl<'a> CreateHandle<'a> {
    pub(crate) fn new(shale: &'a Shale, shape: ShapeId, description: &'a Value) -> Self {
        Self {
            shale,
            builder: CreateQueryBuilder::new(shale.registry(), shape, description),
        }
    }

    /// Compile without executing.
    pub fn query_object(&self) -> Result<CreateQuery> {
        Ok(self.builder.query_object()?)
    }

    /// Await readiness, compile, route, and run the creation.
    pub async fn execute(&self) -> Result<Value> {
        self.shale.await_readiness().await;
        let query = self.builder.query_object()?;
        let store = self.shale.router().store_for(self.builder.shape())?;
        Ok(store.create_query(&query).await?)
    }
}

/// Pending update of one existing node.
#[derive(Clone, Debug)]
pub struct UpdateHandle<'a> {
    shale: &'a Shale,
    builder: UpdateQueryBuilder<'a>,
}

impl<'a> UpdateHandle<'a> {
    pub(crate) fn new(
        shale: &'a Shale,
        shape: ShapeId,
        target: impl Into<NodeRef>,
        updates: &'a Value,
    ) -> Self {
        Self {
            shale,
            builder: UpdateQueryBuilder::new(shale.registry(), shape, target, updates),
        }
    }

    /// Compile without executing.
    pub fn query_object(&self) -> Result<UpdateQuery> {
        Ok(self.builder.query_object()?)
    }

    /// Await readiness, compile, route, and run the update.
    pub async fn execute(&self) -> Result<Value> {
        self.shale.await_readiness().await;
        let query = self.builder.query_object()?;
        let store = self.shale.router().store_for(self.builder.shape())?;
        Ok(store.update_query(&query).await?)
    }
}

/// Pending removal of one or more nodes.
#[derive(Clone, Debug)]
pub struct DeleteHandle<'a> {
    shale: &'a Shale,
    builder: DeleteQueryBuilder,
}

impl<'a> DeleteHandle<'a> {
    pub(crate) fn new(shale: &'a Shale, shape: ShapeId, targets: impl Into<DeleteTargets>) -> Self {
        Self {
            shale,
            builder: DeleteQueryBuilder::new(shale.registry(), shape, targets),
        }
    }

    /// Compile without executing.
    pub fn query_object(&self) -> Result<DeleteQuery> {
        Ok(self.builder.query_object()?)
    }

    /// Await readiness, compile, route, and run the delete.
    pub async fn execute(&self) -> Result<DeleteResult> {
        self.shale.await_readiness().await;
        let query = self.builder.query_object()?;
        let store = self.shale.router().store_for(self.builder.shape())?;
        Ok(store.delete_query(&query).await?)
    }
}
