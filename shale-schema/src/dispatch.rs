//! Per-shape accessor dispatch tables.
//!
//! A [`DispatchTable`] maps every property label visible on a shape to its
//! winning definition (own declaration first, then nearest ancestor) plus a
//! [`ValueKind`] classification that tells the tracer which placeholder
//! kind the accessor produces. Tables are built once per shape per registry
//! version and shared behind `Arc`.

use crate::datatype;
use crate::shape::{PropertyShape, ShapeId};
use rustc_hash::FxHashMap;
use shale_core::LiteralKind;

/// What reading a property off a single node yields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// Single literal of the given kind.
    Literal(LiteralKind),
    /// Set of literals of the given kind.
    LiteralSet(LiteralKind),
    /// Single nested node.
    Node,
    /// Set of nodes.
    NodeSet,
}

impl ValueKind {
    pub fn is_set(self) -> bool {
        matches!(self, ValueKind::LiteralSet(_) | ValueKind::NodeSet)
    }

    pub fn is_object(self) -> bool {
        matches!(self, ValueKind::Node | ValueKind::NodeSet)
    }
}

/// A resolved accessor: the winning property definition and its kind.
#[derive(Clone, Debug)]
pub struct PropertyResolution {
    pub property: PropertyShape,
    pub kind: ValueKind,
}

/// Label-to-resolution table for one shape.
#[derive(Debug)]
pub struct DispatchTable {
    shape: ShapeId,
    entries: FxHashMap<String, PropertyResolution>,
}

impl DispatchTable {
    /// Build from the shape's visible properties (already deduplicated,
    /// closest declaration winning).
    pub(crate) fn build(shape: ShapeId, properties: Vec<PropertyShape>) -> Self {
        let entries = properties
            .into_iter()
            .map(|property| {
                let kind = classify(&property);
                (property.label.clone(), PropertyResolution { property, kind })
            })
            .collect();
        Self { shape, entries }
    }

    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    pub fn resolve(&self, label: &str) -> Option<&PropertyResolution> {
        self.entries.get(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Classify a property as literal- or object-valued, single or set.
///
/// Object-valued means a value shape or class constraint is declared, or
/// the node kind rules literals out. Otherwise the property is literal
/// valued with a kind taken from the datatype, defaulting to string.
fn classify(p: &PropertyShape) -> ValueKind {
    let object = p.value_shape.is_some()
        || p.class.is_some()
        || p.node_kind.map_or(false, |k| !k.admits_literal());
    if object {
        if p.is_multi_valued() {
            ValueKind::NodeSet
        } else {
            ValueKind::Node
        }
    } else {
        let kind = p
            .datatype
            .as_ref()
            .map(|d| datatype::literal_kind_of(d.as_str()))
            .unwrap_or(LiteralKind::String);
        if p.is_multi_valued() {
            ValueKind::LiteralSet(kind)
        } else {
            ValueKind::Literal(kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::{XSD_DATE_TIME, XSD_INTEGER, XSD_STRING};
    use crate::registry::ShapeRegistry;
    use crate::shape::{NodeKind, NodeShapeConfig, PropertyShapeConfig};

    #[test]
    fn classifies_literal_and_object_properties() {
        let r = ShapeRegistry::new();
        let person = r.register(NodeShapeConfig::new("Person")).unwrap();
        r.register_property(
            person,
            "name",
            PropertyShapeConfig::new("http://schema.org/name")
                .datatype(XSD_STRING)
                .max_count(1),
        )
        .unwrap();
        r.register_property(
            person,
            "age",
            PropertyShapeConfig::new("http://schema.org/age")
                .datatype(XSD_INTEGER)
                .max_count(1),
        )
        .unwrap();
        r.register_property(
            person,
            "born",
            PropertyShapeConfig::new("http://schema.org/birthDate")
                .datatype(XSD_DATE_TIME)
                .max_count(1),
        )
        .unwrap();
        r.register_property(
            person,
            "nicknames",
            PropertyShapeConfig::new("http://example.org/nickname").datatype(XSD_STRING),
        )
        .unwrap();
        r.register_property(
            person,
            "spouse",
            PropertyShapeConfig::new("http://schema.org/spouse")
                .value_shape(person)
                .max_count(1),
        )
        .unwrap();
        r.register_property(
            person,
            "friends",
            PropertyShapeConfig::new("http://schema.org/knows").value_shape(person),
        )
        .unwrap();

        let table = r.dispatch_table(person).unwrap();
        assert_eq!(table.len(), 6);
        let kind = |label: &str| table.resolve(label).unwrap().kind;
        assert_eq!(kind("name"), ValueKind::Literal(LiteralKind::String));
        assert_eq!(kind("age"), ValueKind::Literal(LiteralKind::Number));
        assert_eq!(kind("born"), ValueKind::Literal(LiteralKind::DateTime));
        assert_eq!(kind("nicknames"), ValueKind::LiteralSet(LiteralKind::String));
        assert_eq!(kind("spouse"), ValueKind::Node);
        assert_eq!(kind("friends"), ValueKind::NodeSet);
        assert!(table.resolve("unknown").is_none());
    }

    #[test]
    fn node_kind_alone_can_force_object_classification() {
        let r = ShapeRegistry::new();
        let s = r.register(NodeShapeConfig::new("Resource")).unwrap();
        r.register_property(
            s,
            "seeAlso",
            PropertyShapeConfig::new("http://www.w3.org/2000/01/rdf-schema#seeAlso")
                .node_kind(NodeKind::Iri)
                .max_count(1),
        )
        .unwrap();

        let table = r.dispatch_table(s).unwrap();
        assert_eq!(table.resolve("seeAlso").unwrap().kind, ValueKind::Node);
    }

    #[test]
    fn table_reflects_overrides_after_rebuild() {
        let r = ShapeRegistry::new();
        let person = r.register(NodeShapeConfig::new("Person")).unwrap();
        r.register_property(
            person,
            "pets",
            PropertyShapeConfig::new("http://example.org/pet").datatype(XSD_STRING),
        )
        .unwrap();

        let before = r.dispatch_table(person).unwrap();
        assert_eq!(
            before.resolve("pets").unwrap().kind,
            ValueKind::LiteralSet(LiteralKind::String)
        );

        // Tightening to a single value changes the classification.
        r.register_property(
            person,
            "pets",
            PropertyShapeConfig::override_only().max_count(1),
        )
        .unwrap();
        let after = r.dispatch_table(person).unwrap();
        assert_eq!(
            after.resolve("pets").unwrap().kind,
            ValueKind::Literal(LiteralKind::String)
        );
    }
}
