//! Mutation-query construction.
//!
//! Creates, updates, and deletes follow the select builder's contract:
//! constructing a builder does nothing, and `query_object` compiles the
//! payload into a serializable record. Create and update borrow their JSON
//! payload so a caller can compile the same value against several shapes
//! without cloning it.

use crate::describe::describe;
use crate::error::Result;
use crate::wire::{CreateQuery, DeleteQuery, QueryType, UpdateQuery};
use serde_json::Value;
use shale_core::NodeRef;
use shale_schema::{ShapeId, ShapeRegistry};

/// Lazy builder for node creation.
#[derive(Clone, Debug)]
pub struct CreateQueryBuilder<'a> {
    registry: ShapeRegistry,
    shape: ShapeId,
    description: &'a Value,
}

impl<'a> CreateQueryBuilder<'a> {
    pub fn new(registry: &ShapeRegistry, shape: ShapeId, description: &'a Value) -> Self {
        Self {
            registry: registry.clone(),
            shape,
            description,
        }
    }

    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    /// Convert the payload and compile the serializable query object.
    pub fn query_object(&self) -> Result<CreateQuery> {
        Ok(CreateQuery {
            query_type: QueryType::Create,
            shape: self.registry.iri_of(self.shape)?,
            description: describe(&self.registry, self.shape, self.description)?,
        })
    }
}

/// Lazy builder for updating one existing node.
#[derive(Clone, Debug)]
pub struct UpdateQueryBuilder<'a> {
    registry: ShapeRegistry,
    shape: ShapeId,
    target: NodeRef,
    updates: &'a Value,
}

impl<'a> UpdateQueryBuilder<'a> {
    pub fn new(
        registry: &ShapeRegistry,
        shape: ShapeId,
        target: impl Into<NodeRef>,
        updates: &'a Value,
    ) -> Self {
        Self {
            registry: registry.clone(),
            shape,
            target: target.into(),
            updates,
        }
    }

    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    pub fn target(&self) -> &NodeRef {
        &self.target
    }

    /// Convert the payload and compile the serializable query object.
    pub fn query_object(&self) -> Result<UpdateQuery> {
        Ok(UpdateQuery {
            query_type: QueryType::Update,
            id: self.target.id.clone(),
            shape: self.registry.iri_of(self.shape)?,
            updates: describe(&self.registry, self.shape, self.updates)?,
        })
    }
}

/// Delete input: a single reference or a list, normalized to a list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteTargets(pub Vec<NodeRef>);

impl From<NodeRef> for DeleteTargets {
    fn from(target: NodeRef) -> Self {
        Self(vec![target])
    }
}

impl From<&str> for DeleteTargets {
    fn from(id: &str) -> Self {
        Self(vec![NodeRef::new(id)])
    }
}

impl From<String> for DeleteTargets {
    fn from(id: String) -> Self {
        Self(vec![NodeRef::new(id)])
    }
}

impl From<Vec<NodeRef>> for DeleteTargets {
    fn from(targets: Vec<NodeRef>) -> Self {
        Self(targets)
    }
}

impl<const N: usize> From<[NodeRef; N]> for DeleteTargets {
    fn from(targets: [NodeRef; N]) -> Self {
        Self(targets.into())
    }
}

impl From<Vec<&str>> for DeleteTargets {
    fn from(ids: Vec<&str>) -> Self {
        Self(ids.into_iter().map(NodeRef::new).collect())
    }
}

impl<const N: usize> From<[&str; N]> for DeleteTargets {
    fn from(ids: [&str; N]) -> Self {
        Self(ids.into_iter().map(NodeRef::new).collect())
    }
}

/// Lazy builder for removing nodes.
#[derive(Clone, Debug)]
pub struct DeleteQueryBuilder {
    registry: ShapeRegistry,
    shape: ShapeId,
    targets: Vec<NodeRef>,
}

impl DeleteQueryBuilder {
    pub fn new(registry: &ShapeRegistry, shape: ShapeId, targets: impl Into<DeleteTargets>) -> Self {
        Self {
            registry: registry.clone(),
            shape,
            targets: targets.into().0,
        }
    }

    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    pub fn targets(&self) -> &[NodeRef] {
        &self.targets
    }

    pub fn query_object(&self) -> Result<DeleteQuery> {
        Ok(DeleteQuery {
            query_type: QueryType::Delete,
            shape: self.registry.iri_of(self.shape)?,
            ids: self.targets.clone(),
        })
    }
}
