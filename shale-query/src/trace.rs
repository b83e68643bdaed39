//! Property-access tracing.
//!
//! A [`QueryValue`] is a placeholder standing in for data that is not
//! loaded: reading a property off it performs no data access and instead
//! returns another placeholder that remembers how it was reached. The
//! chain of reads, plus any filters, sub-selections, and counts attached
//! along the way, serializes into the wire path types in [`crate::path`]
//! and [`crate::filter`].
//!
//! # Design
//!
//! Placeholders are immutable. Attaching a filter or sub-selection returns
//! a new placeholder sharing the parent chain, so one traced prefix can
//! fan out into many selections. Each node in the chain is `Arc`-shared
//! and records its originating property definition; serialization walks
//! parent pointers root-ward and emits one step per read.
//!
//! Trace errors (unknown property, wrong-kind operation, unresolved value
//! shape) do not panic and do not throw at access time: they are logged,
//! recorded in a poison slot on the placeholder, and surface as `Err` when
//! the trace is serialized. This keeps accessor chains total while still
//! failing queries built on bad accesses.

use crate::error::{QueryError, Result};
use crate::filter::{AndOrEntry, WhereArg, WhereEvaluation, WhereMethod, WherePath};
use crate::path::{PropertyRef, QueryPath, QueryStep};
use crate::select::Selection;
use chrono::{DateTime, Utc};
use shale_core::{Literal, LiteralKind, NodeRef};
use shale_schema::{PropertyShape, ShapeId, ShapeRegistry, ValueKind};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// One node in a trace chain.
#[derive(Clone)]
pub(crate) struct TraceNode {
    /// The property read that produced this value; `None` at a root.
    pub(crate) origin: Option<PropertyShape>,
    /// The value the read was performed on; `None` at a root.
    pub(crate) parent: Option<Arc<TraceNode>>,
    /// Shape of this value, when it is a single node of known shape.
    pub(crate) shape: Option<ShapeId>,
    /// Filter attached by `where_`.
    pub(crate) filter: Option<Evaluation>,
    /// Sub-selection attached by `select`.
    pub(crate) sub_select: Option<Selection>,
    /// Set by `size()`; folds into the preceding step at serialization.
    pub(crate) count: bool,
    /// True for placeholders handed to filter callbacks and everything
    /// derived from them.
    pub(crate) in_filter: bool,
    /// First trace error recorded on this chain, if any.
    pub(crate) poison: Option<QueryError>,
}

/// A traced placeholder value.
///
/// Cheap to clone; clones share the underlying trace chain.
#[derive(Clone)]
pub struct QueryValue {
    node: Arc<TraceNode>,
    registry: ShapeRegistry,
    kind: ValueKind,
    /// Shapes of the members, for set-kinded values. Usually one; unions
    /// accumulate more and dispatch resolves through the most general
    /// common member shape.
    member_shapes: SmallVec<[ShapeId; 2]>,
}

impl QueryValue {
    /// Root placeholder for a shape: the starting point of every trace.
    pub(crate) fn root(registry: ShapeRegistry, shape: ShapeId, in_filter: bool) -> Self {
        Self {
            node: Arc::new(TraceNode {
                origin: None,
                parent: None,
                shape: Some(shape),
                filter: None,
                sub_select: None,
                count: false,
                in_filter,
                poison: None,
            }),
            registry,
            kind: ValueKind::Node,
            member_shapes: SmallVec::new(),
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Shape of this value, when it is a single node of known shape.
    pub fn shape(&self) -> Option<ShapeId> {
        self.node.shape
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Read a property off this value.
    ///
    /// On a single node this resolves `label` through the shape's dispatch
    /// table. On a set it resolves through the member shape and the result
    /// merges into a set. A failed resolution logs, records the error, and
    /// returns a placeholder that fails at serialization.
    pub fn prop(&self, label: &str) -> QueryValue {
        match self.kind {
            ValueKind::Literal(_) | ValueKind::LiteralSet(_) => {
                self.poisoned(QueryError::InvalidOperation {
                    op: "prop",
                    detail: format!("'{label}' read off a literal-kinded value"),
                })
            }
            ValueKind::Node => self.prop_on(self.node.shape, label, false),
            ValueKind::NodeSet => self.prop_on(self.member_shape(), label, true),
        }
    }

    fn prop_on(&self, shape: Option<ShapeId>, label: &str, from_set: bool) -> QueryValue {
        let Some(shape) = shape else {
            let property = self
                .origin_label()
                .unwrap_or_else(|| label.to_string());
            tracing::warn!(
                property = %property,
                "value shape is unresolved; property access cannot be dispatched"
            );
            return self.poisoned(QueryError::UnresolvedValueShape { property });
        };
        let table = match self.registry.dispatch_table(shape) {
            Ok(table) => table,
            Err(err) => return self.poisoned(err.into()),
        };
        let Some(resolution) = table.resolve(label) else {
            let shape_label = self.registry.label_of(shape).unwrap_or_default();
            tracing::warn!(
                shape = %shape_label,
                property = label,
                "property is not registered on shape; query serialization will fail"
            );
            return self.poisoned(QueryError::UnknownProperty {
                shape: shape_label,
                property: label.to_string(),
            });
        };

        let property = resolution.property.clone();
        // Reading off a set merges the per-member results into a set.
        let kind = if from_set {
            match resolution.kind {
                ValueKind::Literal(k) | ValueKind::LiteralSet(k) => ValueKind::LiteralSet(k),
                ValueKind::Node | ValueKind::NodeSet => ValueKind::NodeSet,
            }
        } else {
            resolution.kind
        };
        let member_shapes: SmallVec<[ShapeId; 2]> = match kind {
            ValueKind::NodeSet => property.value_shape.into_iter().collect(),
            _ => SmallVec::new(),
        };
        let node_shape = match kind {
            ValueKind::Node => property.value_shape,
            _ => None,
        };

        QueryValue {
            node: Arc::new(TraceNode {
                origin: Some(property),
                parent: Some(self.node.clone()),
                shape: node_shape,
                filter: None,
                sub_select: None,
                count: false,
                in_filter: self.node.in_filter,
                poison: None,
            }),
            registry: self.registry.clone(),
            kind,
            member_shapes,
        }
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Equality condition against a literal, a node reference, a context
    /// value, or another traced path.
    pub fn equals(&self, arg: impl Into<FilterArg>) -> Evaluation {
        Evaluation::new(self.clone(), WhereMethod::Equals, vec![arg.into()])
    }

    /// Restrict a set to members matching the built condition. Returns the
    /// restricted set.
    ///
    /// Not available inside filter callbacks, where membership conditions
    /// belong to `some`/`every` instead.
    pub fn where_(&self, build: impl FnOnce(&QueryValue) -> Evaluation) -> QueryValue {
        if self.node.in_filter {
            return self.poisoned(QueryError::WhereInsideWhere);
        }
        if !self.kind.is_set() {
            return self.poisoned(QueryError::InvalidOperation {
                op: "where",
                detail: "only value sets can be filtered".to_string(),
            });
        }
        let member = self.member_placeholder(true);
        let evaluation = build(&member);
        QueryValue {
            node: Arc::new(TraceNode {
                filter: Some(evaluation),
                ..(*self.node).clone()
            }),
            registry: self.registry.clone(),
            kind: self.kind,
            member_shapes: self.member_shapes.clone(),
        }
    }

    /// Condition: at least one member satisfies the built condition.
    pub fn some(&self, build: impl FnOnce(&QueryValue) -> Evaluation) -> Evaluation {
        self.quantified(WhereMethod::Some, "some", build)
    }

    /// Condition: every member satisfies the built condition.
    pub fn every(&self, build: impl FnOnce(&QueryValue) -> Evaluation) -> Evaluation {
        self.quantified(WhereMethod::Every, "every", build)
    }

    fn quantified(
        &self,
        method: WhereMethod,
        op: &'static str,
        build: impl FnOnce(&QueryValue) -> Evaluation,
    ) -> Evaluation {
        if !self.kind.is_set() {
            let subject = self.poisoned(QueryError::InvalidOperation {
                op,
                detail: "only value sets can be quantified".to_string(),
            });
            return Evaluation::new(subject, method, Vec::new());
        }
        let member = self.member_placeholder(true);
        let inner = build(&member);
        Evaluation::new(
            self.clone(),
            method,
            vec![FilterArg::Filter(Box::new(inner))],
        )
    }

    // ========================================================================
    // Set shaping
    // ========================================================================

    /// Attach a per-member sub-selection to a set. The callback receives a
    /// member placeholder and its selection serializes into the step.
    pub fn select<S: Into<Selection>>(&self, build: impl FnOnce(&QueryValue) -> S) -> QueryValue {
        if !self.kind.is_set() {
            return self.poisoned(QueryError::InvalidOperation {
                op: "select",
                detail: "only value sets can carry sub-selections".to_string(),
            });
        }
        let member = self.member_placeholder(self.node.in_filter);
        let selection = build(&member).into();
        QueryValue {
            node: Arc::new(TraceNode {
                sub_select: Some(selection),
                ..(*self.node).clone()
            }),
            registry: self.registry.clone(),
            kind: self.kind,
            member_shapes: self.member_shapes.clone(),
        }
    }

    /// Number of members in a set, as a traced numeric value.
    pub fn size(&self) -> QueryValue {
        if !self.kind.is_set() {
            return self.poisoned(QueryError::InvalidOperation {
                op: "size",
                detail: "only value sets have a size".to_string(),
            });
        }
        QueryValue {
            node: Arc::new(TraceNode {
                origin: None,
                parent: Some(self.node.clone()),
                shape: None,
                filter: None,
                sub_select: None,
                count: true,
                in_filter: self.node.in_filter,
                poison: None,
            }),
            registry: self.registry.clone(),
            kind: ValueKind::Literal(LiteralKind::Number),
            member_shapes: SmallVec::new(),
        }
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize the access chain into a wire path.
    ///
    /// This is where recorded trace errors surface: a chain that touched an
    /// unregistered property or misused an operation fails here.
    pub fn query_path(&self) -> Result<QueryPath> {
        let mut steps = Vec::new();
        collect_steps(&self.node, &mut steps)?;
        Ok(steps)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn origin_label(&self) -> Option<String> {
        self.node.origin.as_ref().map(|o| o.label.clone())
    }

    /// Shape governing member dispatch for a set-kinded value.
    fn member_shape(&self) -> Option<ShapeId> {
        match self.member_shapes.len() {
            0 => self.node.origin.as_ref().and_then(|o| o.value_shape),
            1 => Some(self.member_shapes[0]),
            // Heterogeneous set: dispatch through the most general common
            // member shape.
            _ => self
                .registry
                .least_specific_common_shapes_of(&self.member_shapes)
                .ok()
                .and_then(|shapes| shapes.into_iter().next()),
        }
    }

    /// Fresh placeholder standing for one member of a set, rooted at the
    /// member itself so paths built on it are member-relative.
    fn member_placeholder(&self, in_filter: bool) -> QueryValue {
        match self.kind {
            ValueKind::NodeSet => match self.member_shape() {
                Some(shape) => QueryValue::root(self.registry.clone(), shape, in_filter),
                None => {
                    let property = self.origin_label().unwrap_or_default();
                    tracing::warn!(
                        property = %property,
                        "value shape is unresolved; member conditions cannot be built"
                    );
                    QueryValue {
                        node: Arc::new(TraceNode {
                            origin: None,
                            parent: None,
                            shape: None,
                            filter: None,
                            sub_select: None,
                            count: false,
                            in_filter,
                            poison: Some(QueryError::UnresolvedValueShape { property }),
                        }),
                        registry: self.registry.clone(),
                        kind: ValueKind::Node,
                        member_shapes: SmallVec::new(),
                    }
                }
            },
            ValueKind::LiteralSet(kind) => QueryValue {
                node: Arc::new(TraceNode {
                    origin: None,
                    parent: None,
                    shape: None,
                    filter: None,
                    sub_select: None,
                    count: false,
                    in_filter,
                    poison: None,
                }),
                registry: self.registry.clone(),
                kind: ValueKind::Literal(kind),
                member_shapes: SmallVec::new(),
            },
            _ => self.poisoned(QueryError::InvalidOperation {
                op: "member",
                detail: "not a set".to_string(),
            }),
        }
    }

    /// Placeholder derived from this one that fails at serialization.
    fn poisoned(&self, err: QueryError) -> Self {
        Self {
            node: Arc::new(TraceNode {
                origin: None,
                parent: Some(self.node.clone()),
                shape: None,
                filter: None,
                sub_select: None,
                count: false,
                in_filter: self.node.in_filter,
                poison: Some(err),
            }),
            registry: self.registry.clone(),
            kind: self.kind,
            member_shapes: SmallVec::new(),
        }
    }
}

impl fmt::Debug for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryValue")
            .field("kind", &self.kind)
            .field("poisoned", &self.node.poison.is_some())
            .finish()
    }
}

/// Walk parent pointers root-ward and emit one step per property read.
fn collect_steps(node: &TraceNode, out: &mut Vec<QueryStep>) -> Result<()> {
    if let Some(err) = &node.poison {
        return Err(err.clone());
    }
    if let Some(parent) = &node.parent {
        collect_steps(parent, out)?;
    }
    if let Some(origin) = &node.origin {
        let where_path = match &node.filter {
            Some(evaluation) => Some(evaluation.to_where_path()?),
            None => None,
        };
        let select = match &node.sub_select {
            Some(selection) => Some(selection.to_query_select()?),
            None => None,
        };
        out.push(QueryStep {
            property: PropertyRef::from(origin),
            where_path,
            select,
            count: false,
        });
    }
    if node.count {
        match out.last_mut() {
            Some(step) => step.count = true,
            None => {
                return Err(QueryError::InvalidOperation {
                    op: "size",
                    detail: "requires a property path".to_string(),
                })
            }
        }
    }
    Ok(())
}

// ============================================================================
// Filter building
// ============================================================================

/// A boolean condition under construction.
///
/// Conditions start from [`QueryValue::equals`], [`QueryValue::some`], or
/// [`QueryValue::every`] and chain with [`and`](Evaluation::and) /
/// [`or`](Evaluation::or). The chain is ordered; there is no precedence.
#[derive(Clone)]
pub struct Evaluation {
    subject: QueryValue,
    method: WhereMethod,
    args: Vec<FilterArg>,
    chain: Vec<(Conjunction, Evaluation)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Conjunction {
    And,
    Or,
}

impl Evaluation {
    fn new(subject: QueryValue, method: WhereMethod, args: Vec<FilterArg>) -> Self {
        Self {
            subject,
            method,
            args,
            chain: Vec::new(),
        }
    }

    pub fn and(mut self, other: Evaluation) -> Self {
        self.chain.push((Conjunction::And, other));
        self
    }

    pub fn or(mut self, other: Evaluation) -> Self {
        self.chain.push((Conjunction::Or, other));
        self
    }

    /// Serialize into the wire filter form.
    pub(crate) fn to_where_path(&self) -> Result<WherePath> {
        let first_path = WhereEvaluation {
            path: self.subject.query_path()?,
            method: self.method,
            args: self
                .args
                .iter()
                .map(FilterArg::to_wire)
                .collect::<Result<Vec<_>>>()?,
        };
        let and_or = self
            .chain
            .iter()
            .map(|(conjunction, evaluation)| {
                let wire = evaluation.to_where_path()?;
                Ok(match conjunction {
                    Conjunction::And => AndOrEntry::And(wire),
                    Conjunction::Or => AndOrEntry::Or(wire),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(WherePath { first_path, and_or })
    }
}

impl fmt::Debug for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluation")
            .field("method", &self.method)
            .field("args", &self.args.len())
            .field("chain", &self.chain.len())
            .finish()
    }
}

/// An argument to a filter condition.
#[derive(Clone)]
pub enum FilterArg {
    /// Comparison literal.
    Literal(Literal),
    /// Externally supplied node; `None` stands for a missing context value
    /// and serializes as a null subject.
    Reference(Option<NodeRef>),
    /// Another traced value, compared by path.
    Value(QueryValue),
    /// Nested condition (carried by `some`/`every`).
    Filter(Box<Evaluation>),
}

impl fmt::Debug for FilterArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterArg::Literal(literal) => f.debug_tuple("Literal").field(literal).finish(),
            FilterArg::Reference(node) => f.debug_tuple("Reference").field(node).finish(),
            FilterArg::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FilterArg::Filter(evaluation) => f.debug_tuple("Filter").field(evaluation).finish(),
        }
    }
}

impl FilterArg {
    fn to_wire(&self) -> Result<WhereArg> {
        match self {
            FilterArg::Literal(literal) => Ok(WhereArg::Literal(literal.clone())),
            FilterArg::Reference(node) => Ok(WhereArg::Subject {
                subject: node.as_ref().map(|n| n.id.clone()),
            }),
            FilterArg::Value(value) => {
                let path = value.query_path()?;
                if path.is_empty() {
                    // A bare placeholder with no reads compares by identity.
                    Ok(WhereArg::Subject { subject: None })
                } else {
                    Ok(WhereArg::Path { path })
                }
            }
            FilterArg::Filter(evaluation) => {
                Ok(WhereArg::Filter(Box::new(evaluation.to_where_path()?)))
            }
        }
    }
}

impl From<&str> for FilterArg {
    fn from(s: &str) -> Self {
        FilterArg::Literal(Literal::from(s))
    }
}

impl From<String> for FilterArg {
    fn from(s: String) -> Self {
        FilterArg::Literal(Literal::from(s))
    }
}

impl From<i64> for FilterArg {
    fn from(n: i64) -> Self {
        FilterArg::Literal(Literal::from(n))
    }
}

impl From<i32> for FilterArg {
    fn from(n: i32) -> Self {
        FilterArg::Literal(Literal::from(n))
    }
}

impl From<f64> for FilterArg {
    fn from(n: f64) -> Self {
        FilterArg::Literal(Literal::from(n))
    }
}

impl From<bool> for FilterArg {
    fn from(b: bool) -> Self {
        FilterArg::Literal(Literal::from(b))
    }
}

impl From<DateTime<Utc>> for FilterArg {
    fn from(dt: DateTime<Utc>) -> Self {
        FilterArg::Literal(Literal::from(dt))
    }
}

impl From<Literal> for FilterArg {
    fn from(l: Literal) -> Self {
        FilterArg::Literal(l)
    }
}

impl From<NodeRef> for FilterArg {
    fn from(r: NodeRef) -> Self {
        FilterArg::Reference(Some(r))
    }
}

impl From<&QueryValue> for FilterArg {
    fn from(v: &QueryValue) -> Self {
        FilterArg::Value(v.clone())
    }
}

impl From<QueryValue> for FilterArg {
    fn from(v: QueryValue) -> Self {
        FilterArg::Value(v)
    }
}
