//! Mutation payload conversion.
//!
//! Create and update builders accept plain JSON objects keyed by accessor
//! label. [`describe`] converts such a payload into a [`NodeDescription`]:
//! an ordered field list pairing each property reference with a converted
//! value. Conversion resolves every key against the shape, types literals
//! against the declared datatype, classifies objects as references, set
//! modifications, or nested descriptions, and enforces declared
//! cardinality on the supplied values.
//!
//! The same routine backs create and update; delete carries no payload.

use crate::error::{QueryError, Result};
use crate::path::PropertyRef;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use shale_core::{Iri, Literal, NodeRef};
use shale_schema::{datatype, PropertyShape, ShapeId, ShapeRegistry};

/// Key carrying a caller-chosen identifier for a node to be created.
const ID_KEY: &str = "__id";
/// Key naming the shape of a nested description when the property does not
/// declare one. Stripped before compilation.
const SHAPE_KEY: &str = "shape";

/// Compiled description of one node: what to store, field by field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeDescription {
    pub shape: Iri,
    pub fields: Vec<Field>,
    #[serde(rename = "__id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// One converted field: property reference plus value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Field {
    pub prop: PropertyRef,
    pub val: FieldValue,
}

/// A converted field value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Literal(Literal),
    /// Explicit null: unset the property.
    Unset,
    /// Reference to an existing node.
    Reference(NodeRef),
    /// Description of a nested node to create alongside.
    Node(NodeDescription),
    Many(Vec<FieldValue>),
    SetModification(SetModification),
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldValue::Literal(literal) => literal.serialize(serializer),
            FieldValue::Unset => serializer.serialize_unit(),
            FieldValue::Reference(node) => node.serialize(serializer),
            FieldValue::Node(description) => description.serialize(serializer),
            FieldValue::Many(items) => items.serialize(serializer),
            FieldValue::SetModification(m) => m.serialize(serializer),
        }
    }
}

/// Incremental change to a multi-valued property.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SetModification {
    #[serde(rename = "$add", skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<FieldValue>,
    #[serde(rename = "$remove", skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<NodeRef>,
}

/// Convert a JSON payload into a node description against `shape`.
pub fn describe(registry: &ShapeRegistry, shape: ShapeId, value: &Value) -> Result<NodeDescription> {
    let Some(map) = value.as_object() else {
        return Err(QueryError::InvalidDescription {
            shape: registry.label_of(shape)?,
            detail: format!("expected an object, got {}", json_kind(value)),
        });
    };
    describe_object(registry, shape, map)
}

fn describe_object(
    registry: &ShapeRegistry,
    shape: ShapeId,
    map: &Map<String, Value>,
) -> Result<NodeDescription> {
    let shape_label = registry.label_of(shape)?;
    let mut fields = Vec::with_capacity(map.len());
    let mut id = None;

    for (key, value) in map {
        if key == ID_KEY {
            match value.as_str() {
                Some(s) => id = Some(s.to_string()),
                None => {
                    return Err(QueryError::InvalidDescription {
                        shape: shape_label,
                        detail: format!("{ID_KEY} must be a string"),
                    })
                }
            }
            continue;
        }
        let Some(property) = registry.find_property(shape, key)? else {
            return Err(QueryError::UnknownProperty {
                shape: shape_label,
                property: key.clone(),
            });
        };
        let converted = convert_field(registry, &property, value, false)?;
        check_new_count(&property, &converted)?;
        fields.push(Field {
            prop: PropertyRef::from(&property),
            val: converted,
        });
    }

    Ok(NodeDescription {
        shape: registry.iri_of(shape)?,
        fields,
        id,
    })
}

/// Convert one field value. `inside_array` guards against arrays of
/// arrays, which have no graph representation.
fn convert_field(
    registry: &ShapeRegistry,
    property: &PropertyShape,
    value: &Value,
    inside_array: bool,
) -> Result<FieldValue> {
    match value {
        Value::Null => Ok(FieldValue::Unset),
        Value::Bool(b) => Ok(FieldValue::Literal(Literal::Boolean(*b))),
        Value::Number(n) => Ok(FieldValue::Literal(number_literal(n))),
        Value::String(s) => literal_from_string(property, s).map(FieldValue::Literal),
        Value::Array(items) => {
            if inside_array {
                return Err(QueryError::NestedArray {
                    property: property.label.clone(),
                });
            }
            let converted = items
                .iter()
                .map(|item| convert_field(registry, property, item, true))
                .collect::<Result<Vec<_>>>()?;
            Ok(FieldValue::Many(converted))
        }
        Value::Object(map) => convert_object(registry, property, map),
    }
}

fn convert_object(
    registry: &ShapeRegistry,
    property: &PropertyShape,
    map: &Map<String, Value>,
) -> Result<FieldValue> {
    // An object carrying nothing but a string id is a reference, not data.
    if map.len() == 1 {
        if let Some(id) = map.get("id").and_then(Value::as_str) {
            return Ok(FieldValue::Reference(NodeRef::new(id)));
        }
    }

    // {add}/{remove} keys mean an incremental set change.
    if !map.is_empty() && map.keys().all(|k| k == "add" || k == "remove") {
        return convert_set_modification(registry, property, map);
    }

    // Anything else describes a nested node.
    let nested_shape = match property.value_shape {
        Some(shape) => shape,
        None => {
            let named = map.get(SHAPE_KEY).and_then(|v| v.as_str()).ok_or_else(|| {
                QueryError::UnresolvedValueShape {
                    property: property.label.clone(),
                }
            })?;
            registry
                .resolve(named)
                .ok_or_else(|| QueryError::UnresolvedValueShape {
                    property: property.label.clone(),
                })?
        }
    };

    // The shape key is routing metadata, not node data.
    if map.get(SHAPE_KEY).is_some_and(Value::is_string) {
        let mut stripped = map.clone();
        stripped.remove(SHAPE_KEY);
        describe_object(registry, nested_shape, &stripped).map(FieldValue::Node)
    } else {
        describe_object(registry, nested_shape, map).map(FieldValue::Node)
    }
}

fn convert_set_modification(
    registry: &ShapeRegistry,
    property: &PropertyShape,
    map: &Map<String, Value>,
) -> Result<FieldValue> {
    if !property.is_multi_valued() {
        return Err(QueryError::SetModificationOnSingle {
            property: property.label.clone(),
        });
    }

    let mut add = Vec::new();
    if let Some(value) = map.get("add") {
        for item in as_list(value) {
            add.push(convert_field(registry, property, item, true)?);
        }
    }
    let mut remove = Vec::new();
    if let Some(value) = map.get("remove") {
        for item in as_list(value) {
            remove.push(require_reference(property, item)?);
        }
    }

    // Only the additions are checkable against maxCount here; the final
    // count depends on stored state.
    if let Some(max) = property.max_count {
        if add.len() > max as usize {
            return Err(QueryError::CardinalityAboveMax {
                property: property.label.clone(),
                max,
                supplied: add.len(),
            });
        }
    }

    Ok(FieldValue::SetModification(SetModification { add, remove }))
}

/// Enforce declared cardinality on a converted value.
pub(crate) fn check_new_count(property: &PropertyShape, value: &FieldValue) -> Result<()> {
    let supplied = match value {
        FieldValue::Unset => 0,
        FieldValue::Many(items) => items.len(),
        // Checked against maxCount during conversion instead.
        FieldValue::SetModification(_) => return Ok(()),
        _ => 1,
    };
    if let Some(min) = property.min_count {
        if supplied < min as usize {
            return Err(QueryError::CardinalityBelowMin {
                property: property.label.clone(),
                min,
                supplied,
            });
        }
    }
    if let Some(max) = property.max_count {
        if supplied > max as usize {
            return Err(QueryError::CardinalityAboveMax {
                property: property.label.clone(),
                max,
                supplied,
            });
        }
    }
    Ok(())
}

fn literal_from_string(property: &PropertyShape, s: &str) -> Result<Literal> {
    let is_date = property
        .datatype
        .as_ref()
        .is_some_and(|d| datatype::is_date_datatype(d.as_str()));
    if !is_date {
        return Ok(Literal::String(s.to_string()));
    }
    let parsed = DateTime::parse_from_rfc3339(s).map_err(|e| QueryError::InvalidDate {
        property: property.label.clone(),
        value: s.to_string(),
        detail: e.to_string(),
    })?;
    Ok(Literal::DateTime(parsed.with_timezone(&Utc)))
}

fn number_literal(n: &serde_json::Number) -> Literal {
    match n.as_i64() {
        Some(i) => Literal::Long(i),
        None => Literal::Double(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn as_list(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

fn require_reference(property: &PropertyShape, value: &Value) -> Result<NodeRef> {
    value
        .as_object()
        .filter(|m| m.len() == 1)
        .and_then(|m| m.get("id"))
        .and_then(Value::as_str)
        .map(NodeRef::new)
        .ok_or_else(|| QueryError::InvalidRemoveValue {
            property: property.label.clone(),
            detail: "set removal accepts node references ({\"id\": ...}) only".to_string(),
        })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
