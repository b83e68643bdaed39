//! Named context values for filters.
//!
//! A [`QueryContext`] is a side table of named values a caller binds before
//! building queries, typically per request: the signed-in user, a tenant
//! node, a feature flag. Filter callbacks pull them with
//! [`arg`](QueryContext::arg) instead of closing over request state, which
//! keeps builders reusable as templates.
//!
//! Looking up a name that was never bound is not an error: it logs a
//! warning and yields a null reference, so the compiled filter matches
//! nothing rather than the build failing.

use crate::trace::FilterArg;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use shale_core::{Literal, NodeRef};
use std::sync::Arc;

/// A bound context value: a node reference or a plain literal.
#[derive(Clone, Debug, PartialEq)]
pub enum ContextValue {
    Node(NodeRef),
    Literal(Literal),
}

/// Shared table of named values for filter construction.
///
/// Cheap to clone; clones share the same table.
#[derive(Clone, Debug, Default)]
pub struct QueryContext {
    values: Arc<RwLock<FxHashMap<String, ContextValue>>>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a node reference.
    pub fn set_node(&self, name: impl Into<String>, node: impl Into<NodeRef>) {
        self.values
            .write()
            .insert(name.into(), ContextValue::Node(node.into()));
    }

    /// Bind `name` to a literal.
    pub fn set_value(&self, name: impl Into<String>, value: impl Into<Literal>) {
        self.values
            .write()
            .insert(name.into(), ContextValue::Literal(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<ContextValue> {
        self.values.read().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<ContextValue> {
        self.values.write().remove(name)
    }

    /// Resolve `name` into a filter argument. Unbound names yield a null
    /// reference so the surrounding filter still compiles.
    pub fn arg(&self, name: &str) -> FilterArg {
        match self.get(name) {
            Some(ContextValue::Node(node)) => FilterArg::Reference(Some(node)),
            Some(ContextValue::Literal(literal)) => FilterArg::Literal(literal),
            None => {
                tracing::warn!(name, "context value not bound; filter compares to null");
                FilterArg::Reference(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::SelectQueryBuilder;
    use crate::testutil::person_schema;
    use serde_json::json;

    #[test]
    fn bound_node_resolves_to_reference() {
        let context = QueryContext::new();
        context.set_node("me", "urn:p:1");
        assert!(matches!(
            context.arg("me"),
            FilterArg::Reference(Some(node)) if node.id == "urn:p:1"
        ));
    }

    #[test]
    fn bound_literal_resolves_to_literal() {
        let context = QueryContext::new();
        context.set_value("minAge", 21i64);
        assert!(matches!(
            context.arg("minAge"),
            FilterArg::Literal(Literal::Long(21))
        ));
    }

    #[test]
    fn unbound_name_yields_null_reference() {
        let context = QueryContext::new();
        assert!(matches!(context.arg("nobody"), FilterArg::Reference(None)));
    }

    #[test]
    fn clones_share_the_table() {
        let context = QueryContext::new();
        let alias = context.clone();
        alias.set_node("me", "urn:p:1");
        assert_eq!(context.get("me"), Some(ContextValue::Node(NodeRef::new("urn:p:1"))));
        context.remove("me");
        assert_eq!(alias.get("me"), None);
    }

    #[test]
    fn context_args_land_in_compiled_filters() {
        let (registry, person, _) = person_schema();
        let context = QueryContext::new();
        context.set_node("me", "urn:p:1");

        let bound = context.clone();
        let query = SelectQueryBuilder::new(&registry, person)
            .select(|p| p.prop("name"))
            .where_(move |p| p.prop("bestFriend").equals(bound.arg("me")))
            .query_object()
            .unwrap();

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json["where"]["firstPath"]["args"],
            json!([{"subject": "urn:p:1"}])
        );
    }

    #[test]
    fn unbound_arg_compiles_to_null_subject() {
        let (registry, person, _) = person_schema();
        let context = QueryContext::new();

        let bound = context.clone();
        let query = SelectQueryBuilder::new(&registry, person)
            .select(|p| p.prop("name"))
            .where_(move |p| p.prop("bestFriend").equals(bound.arg("missing")))
            .query_object()
            .unwrap();

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["where"]["firstPath"]["args"], json!([{"subject": null}]));
    }
}
