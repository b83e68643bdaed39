//! Runtime result-shape descriptors.
//!
//! A compiled select query knows what its results should look like:
//! which keys appear at which nesting level, and whether the top level is
//! a list. [`SelectQuery::result_shape`] derives that descriptor from the
//! compiled selection, and [`SelectQuery::is_valid_result`] checks a
//! payload against it.
//!
//! Checking is structural and lenient about data: a selected key must be
//! present, but its value may be `null` (absent data) and nested levels
//! accept either one object or an array of them, since cardinality is not
//! recorded on the wire. Custom selection keys replace the path's own
//! labels entirely.

use crate::path::{QuerySelect, QueryStep};
use crate::wire::SelectQuery;
use serde_json::Value;
use std::collections::BTreeMap;

/// Expected structure of a result payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultShape {
    /// True when the payload must be an array of nodes.
    pub many: bool,
    /// Keys expected on each node, with their nested expectations.
    pub fields: BTreeMap<String, ResultShape>,
}

impl ResultShape {
    /// True when `value` structurally matches this shape.
    pub fn matches(&self, value: &Value) -> bool {
        if self.many {
            match value {
                Value::Array(items) => items.iter().all(|item| self.matches_fields(item)),
                _ => false,
            }
        } else {
            self.matches_fields(value)
        }
    }

    fn matches_fields(&self, value: &Value) -> bool {
        if self.fields.is_empty() {
            // Leaf: any value, including null.
            return true;
        }
        match value {
            // Absent data is tolerated; a missing key is not.
            Value::Null => true,
            Value::Array(items) => items.iter().all(|item| self.matches_fields(item)),
            Value::Object(map) => self.fields.iter().all(|(key, child)| {
                map.get(key).is_some_and(|v| child.matches_fields(v))
            }),
            _ => false,
        }
    }
}

impl SelectQuery {
    /// Derive the expected result structure from the compiled selection.
    pub fn result_shape(&self) -> ResultShape {
        let mut shape = ResultShape {
            many: !self.single_result,
            fields: BTreeMap::new(),
        };
        merge_select(&mut shape.fields, &self.select);
        shape
    }

    /// Structurally check a result payload against this query.
    pub fn is_valid_result(&self, value: &Value) -> bool {
        self.result_shape().matches(value)
    }
}

fn merge_select(fields: &mut BTreeMap<String, ResultShape>, select: &QuerySelect) {
    match select {
        QuerySelect::Paths(paths) => {
            for path in paths {
                merge_path(fields, path);
            }
        }
        QuerySelect::Custom(custom) => {
            for (key, path) in &custom.0 {
                let child = fields.entry(key.clone()).or_default();
                // The custom key names the whole path; only sub-selections
                // beneath it contribute nested keys.
                if let Some(last) = path.last() {
                    if let Some(sub) = &last.select {
                        merge_select(&mut child.fields, sub);
                    }
                }
            }
        }
    }
}

fn merge_path(fields: &mut BTreeMap<String, ResultShape>, path: &[QueryStep]) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    let child = fields.entry(first.property.label.clone()).or_default();
    if let Some(sub) = &first.select {
        merge_select(&mut child.fields, sub);
    }
    merge_path(&mut child.fields, rest);
}
