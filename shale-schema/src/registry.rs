//! Shape registry: arena storage, registration, and property resolution.
//!
//! # Design
//!
//! Shapes live in an append-only arena addressed by [`ShapeId`] handles;
//! an IRI index maps stable identifiers back to handles. The registry is
//! `Arc`-backed and clones share state, so the query compiler, mutation
//! compilers, and storage router all hold the same view.
//!
//! Registration is write-locked and cheap: it appends or merges records and
//! bumps a version counter. Derived views (hierarchy closures, dispatch
//! tables, specificity filters) live in a version-stamped side cache that is
//! discarded wholesale the first time a reader notices the version moved.
//! Readers therefore never see stale derived data, and registration-heavy
//! startup never pays recomputation costs.
//!
//! Property registration distinguishes three cases:
//!
//! - fresh declaration: stored as given (a non-empty path is required)
//! - re-registration on the same owner: supplied fields merge into the
//!   existing record in place, supporting multi-pass setups where value
//!   shapes resolve late
//! - override of an ancestor's property: omitted fields inherit the
//!   ancestor's values, and supplied constraint fields must tighten them
//!   (`minCount` may only rise, `maxCount` only fall, `nodeKind` only
//!   narrow)

use crate::dispatch::DispatchTable;
use crate::error::{Result, SchemaError};
use crate::hierarchy::{self, HierarchyCaches};
use crate::shape::{NodeShape, NodeShapeConfig, PropertyShape, PropertyShapeConfig, ShapeId};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use shale_core::Iri;
use std::fmt;
use std::sync::Arc;

/// Namespace used to derive shape identifiers when none is supplied.
pub const DEFAULT_SHAPE_NAMESPACE: &str = "urn:shale:shape:";

pub(crate) struct RegistryInner {
    pub(crate) shapes: Vec<NodeShape>,
    by_iri: FxHashMap<Iri, ShapeId>,
    pub(crate) version: u64,
}

/// Registry of node shapes and their property declarations.
///
/// Cheap to clone; clones share the same arena and caches.
#[derive(Clone)]
pub struct ShapeRegistry {
    inner: Arc<RwLock<RegistryInner>>,
    caches: Arc<RwLock<HierarchyCaches>>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner {
                shapes: Vec::new(),
                by_iri: FxHashMap::default(),
                version: 0,
            })),
            caches: Arc::new(RwLock::new(HierarchyCaches::new())),
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a node shape and return its handle.
    ///
    /// Registering the same identifier twice is not an error: the duplicate
    /// is logged and ignored, and the original handle is returned. A parent
    /// named by `extends` must already be registered, which keeps the
    /// hierarchy acyclic by construction.
    pub fn register(&self, config: NodeShapeConfig) -> Result<ShapeId> {
        let NodeShapeConfig {
            label,
            id,
            description,
            target_class,
            extends,
        } = config;
        let id = id.unwrap_or_else(|| Iri::new(format!("{DEFAULT_SHAPE_NAMESPACE}{label}")));

        let mut inner = self.inner.write();
        if let Some(existing) = inner.by_iri.get(id.as_str()) {
            tracing::warn!(
                shape = %id,
                "shape already registered; keeping the original registration"
            );
            return Ok(*existing);
        }
        if let Some(parent) = extends {
            if parent.index() >= inner.shapes.len() {
                return Err(SchemaError::UnknownParent { label });
            }
        }

        let sid = ShapeId(inner.shapes.len() as u32);
        inner.by_iri.insert(id.clone(), sid);
        inner.shapes.push(NodeShape {
            id,
            label,
            description,
            target_class,
            extends,
            properties: Vec::new(),
        });
        inner.version += 1;
        Ok(sid)
    }

    /// Register (or re-register, or override) a property on `owner` under
    /// the accessor name `label`.
    ///
    /// See the module docs for the three registration cases. Override
    /// violations are fatal and name the offending field and values.
    pub fn register_property(
        &self,
        owner: ShapeId,
        label: &str,
        config: PropertyShapeConfig,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        if owner.index() >= inner.shapes.len() {
            return Err(SchemaError::UnknownShape(owner));
        }
        let owner_label = inner.shapes[owner.index()].label.clone();
        if label.is_empty() {
            return Err(SchemaError::MalformedProperty {
                shape: owner_label,
                label: label.to_string(),
                reason: "accessor label must not be empty".to_string(),
            });
        }

        // Nearest ancestor definition drives both the override-compatibility
        // check and field inheritance.
        let inherited = ancestor_property(&inner.shapes, owner, label);
        if let Some(ancestor) = &inherited {
            check_override(&owner_label, label, ancestor, &config)?;
        }

        let own_index = inner.shapes[owner.index()]
            .properties
            .iter()
            .position(|p| p.label == label);
        match own_index {
            Some(i) => {
                merge_into(&mut inner.shapes[owner.index()].properties[i], config);
            }
            None => {
                let owner_iri = inner.shapes[owner.index()].id.clone();
                let record = build_record(
                    owner,
                    &owner_iri,
                    &owner_label,
                    label,
                    config,
                    inherited.as_ref(),
                )?;
                inner.shapes[owner.index()].properties.push(record);
            }
        }
        inner.version += 1;
        Ok(())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Handle for the shape registered under `iri`, if any.
    pub fn resolve(&self, iri: &str) -> Option<ShapeId> {
        self.inner.read().by_iri.get(iri).copied()
    }

    /// Clone of the stored record for `id`.
    pub fn shape(&self, id: ShapeId) -> Result<NodeShape> {
        let inner = self.inner.read();
        check_shape(&inner, id)?;
        Ok(inner.shapes[id.index()].clone())
    }

    pub fn iri_of(&self, id: ShapeId) -> Result<Iri> {
        let inner = self.inner.read();
        check_shape(&inner, id)?;
        Ok(inner.shapes[id.index()].id.clone())
    }

    pub fn label_of(&self, id: ShapeId) -> Result<String> {
        let inner = self.inner.read();
        check_shape(&inner, id)?;
        Ok(inner.shapes[id.index()].label.clone())
    }

    pub fn parent_of(&self, id: ShapeId) -> Result<Option<ShapeId>> {
        let inner = self.inner.read();
        check_shape(&inner, id)?;
        Ok(inner.shapes[id.index()].extends)
    }

    /// Property declarations visible on `id`.
    ///
    /// With `include_inherited`, the whole `extends` chain contributes in
    /// closest-first order and shadowed labels appear once per declaring
    /// shape. Without it, only the shape's own declarations are returned.
    pub fn property_shapes_of(
        &self,
        id: ShapeId,
        include_inherited: bool,
    ) -> Result<Vec<PropertyShape>> {
        let inner = self.inner.read();
        check_shape(&inner, id)?;
        if !include_inherited {
            return Ok(inner.shapes[id.index()].properties.clone());
        }
        let mut out = Vec::new();
        let mut current = Some(id);
        while let Some(sid) = current {
            let shape = &inner.shapes[sid.index()];
            out.extend(shape.properties.iter().cloned());
            current = shape.extends;
        }
        Ok(out)
    }

    /// Property declarations visible on `id`, deduplicated by label with
    /// the closest declaration winning. Order is the closest-first chain
    /// traversal, each shape's own declarations in registration order.
    pub fn unique_property_shapes_of(&self, id: ShapeId) -> Result<Vec<PropertyShape>> {
        let inner = self.inner.read();
        check_shape(&inner, id)?;
        Ok(unique_properties(&inner.shapes, id))
    }

    /// The definition of `label` visible on `id`: the shape's own
    /// declaration if present, otherwise the nearest ancestor's.
    pub fn find_property(&self, id: ShapeId, label: &str) -> Result<Option<PropertyShape>> {
        let inner = self.inner.read();
        check_shape(&inner, id)?;
        let mut current = Some(id);
        while let Some(sid) = current {
            let shape = &inner.shapes[sid.index()];
            if let Some(p) = shape.property(label) {
                return Ok(Some(p.clone()));
            }
            current = shape.extends;
        }
        Ok(None)
    }

    // ========================================================================
    // Hierarchy views (cached)
    // ========================================================================

    /// All transitive sub-shapes of `id`, excluding `id` itself, in
    /// breadth-first registration order.
    pub fn subclasses_of(&self, id: ShapeId) -> Result<Vec<ShapeId>> {
        self.with_caches(|caches, inner| {
            check_shape(inner, id)?;
            if let Some(hit) = caches.subclasses.get(&id) {
                return Ok(hit.to_vec());
            }
            let computed: Arc<[ShapeId]> =
                hierarchy::descendants_of(&inner.shapes, id).into();
            caches.subclasses.insert(id, computed.clone());
            Ok(computed.to_vec())
        })
    }

    /// All transitive super-shapes of `id`, excluding `id` itself, closest
    /// first.
    pub fn superclasses_of(&self, id: ShapeId) -> Result<Vec<ShapeId>> {
        self.with_caches(|caches, inner| {
            check_shape(inner, id)?;
            if let Some(hit) = caches.superclasses.get(&id) {
                return Ok(hit.to_vec());
            }
            let computed: Arc<[ShapeId]> = hierarchy::ancestors_of(&inner.shapes, id).into();
            caches.superclasses.insert(id, computed.clone());
            Ok(computed.to_vec())
        })
    }

    /// Of `ids` and all their sub-shapes, the shapes no other candidate
    /// extends. A shape with no registered sub-shapes is its own most
    /// specific shape. Results are ordered by registration.
    pub fn most_specific_subshapes_of(&self, ids: &[ShapeId]) -> Result<Vec<ShapeId>> {
        self.with_caches(|caches, inner| {
            for &id in ids {
                check_shape(inner, id)?;
            }
            let key = canonical_key(ids);
            if let Some(hit) = caches.most_specific.get(&key) {
                return Ok(hit.to_vec());
            }
            let computed: Arc<[ShapeId]> =
                hierarchy::most_specific_of(&inner.shapes, &key).into();
            caches.most_specific.insert(key, computed.clone());
            Ok(computed.to_vec())
        })
    }

    /// Of `ids` only, the shapes that extend no other member of `ids`.
    /// Results are ordered by registration.
    pub fn least_specific_common_shapes_of(&self, ids: &[ShapeId]) -> Result<Vec<ShapeId>> {
        self.with_caches(|caches, inner| {
            for &id in ids {
                check_shape(inner, id)?;
            }
            let key = canonical_key(ids);
            if let Some(hit) = caches.least_specific.get(&key) {
                return Ok(hit.to_vec());
            }
            let computed: Arc<[ShapeId]> =
                hierarchy::least_specific_of(&inner.shapes, &key).into();
            caches.least_specific.insert(key, computed.clone());
            Ok(computed.to_vec())
        })
    }

    /// Accessor dispatch table for `id`: every visible property label mapped
    /// to its winning definition and value-kind classification.
    pub fn dispatch_table(&self, id: ShapeId) -> Result<Arc<DispatchTable>> {
        self.with_caches(|caches, inner| {
            check_shape(inner, id)?;
            if let Some(hit) = caches.dispatch.get(&id) {
                return Ok(hit.clone());
            }
            let table = Arc::new(DispatchTable::build(id, unique_properties(&inner.shapes, id)));
            caches.dispatch.insert(id, table.clone());
            Ok(table)
        })
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Version counter; every successful registration bumps it.
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    pub fn len(&self) -> usize {
        self.inner.read().shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().shapes.is_empty()
    }

    /// Run `f` against caches synced to the current registry version.
    ///
    /// Lock order is caches before arena; registration takes only the arena
    /// lock, so the two never deadlock.
    fn with_caches<T>(&self, f: impl FnOnce(&mut HierarchyCaches, &RegistryInner) -> T) -> T {
        let version = self.inner.read().version;
        let mut caches = self.caches.write();
        caches.sync_to(version);
        let inner = self.inner.read();
        f(&mut caches, &inner)
    }
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShapeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ShapeRegistry")
            .field("shapes", &inner.shapes.len())
            .field("version", &inner.version)
            .finish()
    }
}

// ============================================================================
// Registration helpers
// ============================================================================

fn check_shape(inner: &RegistryInner, id: ShapeId) -> Result<()> {
    if id.index() >= inner.shapes.len() {
        return Err(SchemaError::UnknownShape(id));
    }
    Ok(())
}

/// Sorted, deduplicated cache key for set-valued hierarchy queries, so that
/// input order does not fragment the cache.
fn canonical_key(ids: &[ShapeId]) -> Box<[ShapeId]> {
    let mut key: Vec<ShapeId> = ids.to_vec();
    key.sort_unstable();
    key.dedup();
    key.into_boxed_slice()
}

/// The nearest ancestor declaration of `label` above `owner`, if any.
fn ancestor_property(
    shapes: &[NodeShape],
    owner: ShapeId,
    label: &str,
) -> Option<PropertyShape> {
    let mut current = shapes[owner.index()].extends;
    while let Some(sid) = current {
        let shape = &shapes[sid.index()];
        if let Some(p) = shape.property(label) {
            return Some(p.clone());
        }
        current = shape.extends;
    }
    None
}

/// Visible properties of `id`, deduplicated by label, closest wins.
pub(crate) fn unique_properties(shapes: &[NodeShape], id: ShapeId) -> Vec<PropertyShape> {
    let mut out = Vec::new();
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut current = Some(id);
    while let Some(sid) = current {
        let shape = &shapes[sid.index()];
        for p in &shape.properties {
            if seen.insert(p.label.as_str()) {
                out.push(p.clone());
            }
        }
        current = shape.extends;
    }
    out
}

/// Reject overrides that loosen an inherited constraint. Only fields the
/// config actually supplies are checked.
fn check_override(
    shape: &str,
    label: &str,
    ancestor: &PropertyShape,
    config: &PropertyShapeConfig,
) -> Result<()> {
    if let Some(new_min) = config.min_count {
        let old = ancestor.min_count.unwrap_or(0);
        if new_min < old {
            return Err(SchemaError::IncompatibleOverride {
                shape: shape.to_string(),
                label: label.to_string(),
                field: "minCount",
                rule: "increase",
                previous: old.to_string(),
                attempted: new_min.to_string(),
            });
        }
    }
    if let Some(new_max) = config.max_count {
        if let Some(old) = ancestor.max_count {
            if new_max > old {
                return Err(SchemaError::IncompatibleOverride {
                    shape: shape.to_string(),
                    label: label.to_string(),
                    field: "maxCount",
                    rule: "decrease",
                    previous: old.to_string(),
                    attempted: new_max.to_string(),
                });
            }
        }
    }
    if let Some(new_kind) = config.node_kind {
        if let Some(old) = ancestor.node_kind {
            if !new_kind.narrows(old) {
                return Err(SchemaError::IncompatibleOverride {
                    shape: shape.to_string(),
                    label: label.to_string(),
                    field: "nodeKind",
                    rule: "narrow",
                    previous: format!("{old:?}"),
                    attempted: format!("{new_kind:?}"),
                });
            }
        }
    }
    Ok(())
}

/// Build a stored record from a config, inheriting omitted fields from the
/// nearest ancestor declaration when one exists.
fn build_record(
    owner: ShapeId,
    owner_iri: &Iri,
    owner_label: &str,
    label: &str,
    config: PropertyShapeConfig,
    inherited: Option<&PropertyShape>,
) -> Result<PropertyShape> {
    let path = if !config.path.is_empty() {
        config.path
    } else if let Some(a) = inherited {
        a.path.clone()
    } else {
        return Err(SchemaError::MalformedProperty {
            shape: owner_label.to_string(),
            label: label.to_string(),
            reason: "a fresh property declaration requires a non-empty path".to_string(),
        });
    };

    Ok(PropertyShape {
        id: config
            .id
            .unwrap_or_else(|| Iri::new(format!("{owner_iri}/{label}"))),
        label: label.to_string(),
        path,
        node_kind: config.node_kind.or_else(|| inherited.and_then(|a| a.node_kind)),
        datatype: config
            .datatype
            .or_else(|| inherited.and_then(|a| a.datatype.clone())),
        min_count: config.min_count.or_else(|| inherited.and_then(|a| a.min_count)),
        max_count: config.max_count.or_else(|| inherited.and_then(|a| a.max_count)),
        value_shape: config
            .value_shape
            .or_else(|| inherited.and_then(|a| a.value_shape)),
        class: config.class.or_else(|| inherited.and_then(|a| a.class.clone())),
        in_values: config
            .in_values
            .or_else(|| inherited.and_then(|a| a.in_values.clone())),
        equals: config.equals.or_else(|| inherited.and_then(|a| a.equals.clone())),
        disjoint: config
            .disjoint
            .or_else(|| inherited.and_then(|a| a.disjoint.clone())),
        has_value: config
            .has_value
            .or_else(|| inherited.and_then(|a| a.has_value.clone())),
        default_value: config
            .default_value
            .or_else(|| inherited.and_then(|a| a.default_value.clone())),
        sort_by: config
            .sort_by
            .or_else(|| inherited.and_then(|a| a.sort_by.clone())),
        owner,
    })
}

/// Merge a re-registration into an existing record: supplied fields
/// overwrite, omitted fields keep their current values.
fn merge_into(existing: &mut PropertyShape, config: PropertyShapeConfig) {
    if let Some(id) = config.id {
        existing.id = id;
    }
    if !config.path.is_empty() {
        existing.path = config.path;
    }
    if let Some(v) = config.node_kind {
        existing.node_kind = Some(v);
    }
    if let Some(v) = config.datatype {
        existing.datatype = Some(v);
    }
    if let Some(v) = config.min_count {
        existing.min_count = Some(v);
    }
    if let Some(v) = config.max_count {
        existing.max_count = Some(v);
    }
    if let Some(v) = config.value_shape {
        existing.value_shape = Some(v);
    }
    if let Some(v) = config.class {
        existing.class = Some(v);
    }
    if let Some(v) = config.in_values {
        existing.in_values = Some(v);
    }
    if let Some(v) = config.equals {
        existing.equals = Some(v);
    }
    if let Some(v) = config.disjoint {
        existing.disjoint = Some(v);
    }
    if let Some(v) = config.has_value {
        existing.has_value = Some(v);
    }
    if let Some(v) = config.default_value {
        existing.default_value = Some(v);
    }
    if let Some(v) = config.sort_by {
        existing.sort_by = Some(v);
    }
}
