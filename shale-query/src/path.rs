//! Serialized property paths.
//!
//! A [`QueryPath`] is the wire record of one access chain: one
//! [`QueryStep`] per property read, in order. Steps carry the property
//! reference (label plus reference identifiers) and, where the traced
//! placeholder had them, an attached filter, a nested sub-selection, and
//! the count flag produced by `size()`.

use crate::filter::WherePath;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use shale_core::Iri;
use shale_schema::PropertyShape;

/// Wire reference to a property: accessor label plus path identifiers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PropertyRef {
    pub label: String,
    pub path: Vec<Iri>,
}

impl From<&PropertyShape> for PropertyRef {
    fn from(p: &PropertyShape) -> Self {
        Self {
            label: p.label.clone(),
            path: p.path.clone(),
        }
    }
}

/// One property access in a serialized path.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryStep {
    pub property: PropertyRef,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_path: Option<WherePath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<QuerySelect>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub count: bool,
}

impl QueryStep {
    pub fn new(property: PropertyRef) -> Self {
        Self {
            property,
            where_path: None,
            select: None,
            count: false,
        }
    }
}

/// An access chain, one step per property read.
pub type QueryPath = Vec<QueryStep>;

/// A compiled selection: either plain paths or a custom object whose keys
/// name the paths.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuerySelect {
    Paths(Vec<QueryPath>),
    Custom(CustomSelect),
}

/// Key-to-path selection, serialized as a JSON object in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CustomSelect(pub Vec<(String, QueryPath)>);

impl Serialize for CustomSelect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, path) in &self.0 {
            map.serialize_entry(key, path)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn step_serializes_sparse() {
        let step = QueryStep::new(PropertyRef {
            label: "name".into(),
            path: vec![Iri::new("http://schema.org/name")],
        });
        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            json!({"property": {"label": "name", "path": ["http://schema.org/name"]}})
        );
    }

    #[test]
    fn count_flag_appears_only_when_set() {
        let mut step = QueryStep::new(PropertyRef {
            label: "friends".into(),
            path: vec![Iri::new("http://schema.org/knows")],
        });
        step.count = true;
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["count"], json!(true));
    }

    #[test]
    fn custom_select_preserves_key_order() {
        let path = |label: &str| {
            vec![QueryStep::new(PropertyRef {
                label: label.into(),
                path: vec![Iri::new(format!("http://example.org/{label}"))],
            })]
        };
        let custom = CustomSelect(vec![
            ("zeta".to_string(), path("z")),
            ("alpha".to_string(), path("a")),
        ]);
        let text = serde_json::to_string(&custom).unwrap();
        let zeta = text.find("zeta").unwrap();
        let alpha = text.find("alpha").unwrap();
        assert!(zeta < alpha);
    }
}
