//! Shape records and declaration inputs.
//!
//! [`NodeShape`] and [`PropertyShape`] are the records the registry stores.
//! The `*Config` structs are the declaration side: what a caller hands to
//! [`ShapeRegistry::register`](crate::ShapeRegistry::register) and
//! [`ShapeRegistry::register_property`](crate::ShapeRegistry::register_property).
//! Config fields are all optional so that property overrides can mention
//! only the constraints they tighten; omitted fields inherit the ancestor's
//! values during the merge.

use shale_core::{Iri, Literal};

/// Arena handle for a registered shape.
///
/// Handles are `Copy`, order by registration, and index the owning
/// registry's arena. They are only meaningful against the registry that
/// issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub(crate) u32);

impl ShapeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// SHACL-style node kind: which categories of node a property value may be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    BlankNode,
    Iri,
    Literal,
    BlankNodeOrIri,
    BlankNodeOrLiteral,
    IriOrLiteral,
}

impl NodeKind {
    const BLANK: u8 = 0b001;
    const IRI: u8 = 0b010;
    const LITERAL: u8 = 0b100;

    fn mask(self) -> u8 {
        match self {
            NodeKind::BlankNode => Self::BLANK,
            NodeKind::Iri => Self::IRI,
            NodeKind::Literal => Self::LITERAL,
            NodeKind::BlankNodeOrIri => Self::BLANK | Self::IRI,
            NodeKind::BlankNodeOrLiteral => Self::BLANK | Self::LITERAL,
            NodeKind::IriOrLiteral => Self::IRI | Self::LITERAL,
        }
    }

    /// True when `self` admits a subset of the node categories `other`
    /// admits. Equal kinds narrow each other.
    pub fn narrows(self, other: NodeKind) -> bool {
        self.mask() & !other.mask() == 0
    }

    /// True when values of this kind can be literals.
    pub fn admits_literal(self) -> bool {
        self.mask() & Self::LITERAL != 0
    }

    /// True when values of this kind can be IRIs or blank nodes.
    pub fn admits_node(self) -> bool {
        self.mask() & (Self::BLANK | Self::IRI) != 0
    }
}

/// A registered node shape: the schema description of one class of node.
#[derive(Clone, Debug)]
pub struct NodeShape {
    /// Stable identifier, unique within the registry.
    pub id: Iri,
    /// Accessor-friendly name (typically the class name).
    pub label: String,
    pub description: Option<String>,
    /// The class of nodes this shape targets.
    pub target_class: Option<Iri>,
    /// Parent shape in the single-inheritance chain.
    pub extends: Option<ShapeId>,
    /// Own property declarations, in registration order. Inherited
    /// properties are resolved through the registry, not stored here.
    pub(crate) properties: Vec<PropertyShape>,
}

impl NodeShape {
    /// This shape's own property declarations, in registration order.
    pub fn properties(&self) -> &[PropertyShape] {
        &self.properties
    }

    /// This shape's own declaration for `label`, if any.
    pub fn property(&self, label: &str) -> Option<&PropertyShape> {
        self.properties.iter().find(|p| p.label == label)
    }
}

/// A registered property shape: one property declaration on one node shape.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyShape {
    /// Stable identifier, derived from the owner and label when not given.
    pub id: Iri,
    /// Accessor name, unique among the owner's own declarations.
    pub label: String,
    /// Reference identifiers naming the stored property. Usually one; more
    /// than one means the accessor reads through a property sequence.
    pub path: Vec<Iri>,
    pub node_kind: Option<NodeKind>,
    /// Datatype IRI for literal-valued properties.
    pub datatype: Option<Iri>,
    pub min_count: Option<u32>,
    /// Maximum cardinality. `None` means unbounded; an explicit `Some(0)`
    /// is legal and distinct from unset.
    pub max_count: Option<u32>,
    /// Shape of the property's values, for object-valued properties.
    pub value_shape: Option<ShapeId>,
    /// Class constraint on the property's values.
    pub class: Option<Iri>,
    /// Enumerated allowed values.
    pub in_values: Option<Vec<Literal>>,
    /// Values must equal the values of this other property.
    pub equals: Option<Iri>,
    /// Values must be disjoint with the values of this other property.
    pub disjoint: Option<Iri>,
    /// A value that must be present.
    pub has_value: Option<Literal>,
    pub default_value: Option<Literal>,
    /// Property label of the value shape to sort set members by.
    pub sort_by: Option<String>,
    /// The shape this declaration belongs to.
    pub owner: ShapeId,
}

impl PropertyShape {
    /// True when more than one value is admitted (`maxCount` unset or > 1).
    pub fn is_multi_valued(&self) -> bool {
        self.max_count.map_or(true, |m| m > 1)
    }

    /// The first (usually only) reference identifier of the path.
    pub fn primary_path(&self) -> &Iri {
        &self.path[0]
    }
}

/// Declaration input for [`ShapeRegistry::register`](crate::ShapeRegistry::register).
#[derive(Clone, Debug, Default)]
pub struct NodeShapeConfig {
    pub label: String,
    pub id: Option<Iri>,
    pub description: Option<String>,
    pub target_class: Option<Iri>,
    pub extends: Option<ShapeId>,
}

impl NodeShapeConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<Iri>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn target_class(mut self, class: impl Into<Iri>) -> Self {
        self.target_class = Some(class.into());
        self
    }

    pub fn extends(mut self, parent: ShapeId) -> Self {
        self.extends = Some(parent);
        self
    }
}

/// Declaration input for
/// [`ShapeRegistry::register_property`](crate::ShapeRegistry::register_property).
///
/// Every field is optional. For a fresh declaration, `path` is required and
/// everything else defaults to unconstrained. For an override of an
/// ancestor's property, any omitted field silently inherits the ancestor's
/// value and supplied count/kind fields must tighten it.
#[derive(Clone, Debug, Default)]
pub struct PropertyShapeConfig {
    pub id: Option<Iri>,
    pub path: Vec<Iri>,
    pub node_kind: Option<NodeKind>,
    pub datatype: Option<Iri>,
    pub min_count: Option<u32>,
    pub max_count: Option<u32>,
    pub value_shape: Option<ShapeId>,
    pub class: Option<Iri>,
    pub in_values: Option<Vec<Literal>>,
    pub equals: Option<Iri>,
    pub disjoint: Option<Iri>,
    pub has_value: Option<Literal>,
    pub default_value: Option<Literal>,
    pub sort_by: Option<String>,
}

impl PropertyShapeConfig {
    pub fn new(path: impl Into<Iri>) -> Self {
        Self {
            path: vec![path.into()],
            ..Self::default()
        }
    }

    /// An override that only tightens constraints, leaving the path to be
    /// inherited from the ancestor's declaration.
    pub fn override_only() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<Iri>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append a further reference identifier, making the path a sequence.
    pub fn then(mut self, path: impl Into<Iri>) -> Self {
        self.path.push(path.into());
        self
    }

    pub fn node_kind(mut self, kind: NodeKind) -> Self {
        self.node_kind = Some(kind);
        self
    }

    pub fn datatype(mut self, datatype: impl Into<Iri>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }

    pub fn min_count(mut self, count: u32) -> Self {
        self.min_count = Some(count);
        self
    }

    pub fn max_count(mut self, count: u32) -> Self {
        self.max_count = Some(count);
        self
    }

    pub fn value_shape(mut self, shape: ShapeId) -> Self {
        self.value_shape = Some(shape);
        self
    }

    pub fn class(mut self, class: impl Into<Iri>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn in_values(mut self, values: Vec<Literal>) -> Self {
        self.in_values = Some(values);
        self
    }

    pub fn equals(mut self, property: impl Into<Iri>) -> Self {
        self.equals = Some(property.into());
        self
    }

    pub fn disjoint(mut self, property: impl Into<Iri>) -> Self {
        self.disjoint = Some(property.into());
        self
    }

    pub fn has_value(mut self, value: impl Into<Literal>) -> Self {
        self.has_value = Some(value.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Literal>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn sort_by(mut self, label: impl Into<String>) -> Self {
        self.sort_by = Some(label.into());
        self
    }
}
