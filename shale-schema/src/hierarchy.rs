//! Hierarchy resolution over the `extends` forest.
//!
//! Shapes form a single-inheritance forest: every shape has at most one
//! parent, fixed at registration, and parents must pre-exist, so there are
//! no cycles to guard against. Descendant closures are computed by
//! breadth-first walk over a child adjacency built from a single arena
//! scan.
//!
//! [`HierarchyCaches`] holds all derived views keyed by input, stamped with
//! the registry version they were computed at. The registry discards the
//! whole cache the first time a reader arrives with a newer version, which
//! makes registration O(1) and keeps readers coherent without any
//! invalidation bookkeeping.

use crate::dispatch::DispatchTable;
use crate::shape::{NodeShape, ShapeId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::sync::Arc;

/// Version-stamped store of derived hierarchy views.
pub(crate) struct HierarchyCaches {
    version: u64,
    pub(crate) subclasses: FxHashMap<ShapeId, Arc<[ShapeId]>>,
    pub(crate) superclasses: FxHashMap<ShapeId, Arc<[ShapeId]>>,
    pub(crate) most_specific: FxHashMap<Box<[ShapeId]>, Arc<[ShapeId]>>,
    pub(crate) least_specific: FxHashMap<Box<[ShapeId]>, Arc<[ShapeId]>>,
    pub(crate) dispatch: FxHashMap<ShapeId, Arc<DispatchTable>>,
}

impl HierarchyCaches {
    pub(crate) fn new() -> Self {
        Self {
            version: 0,
            subclasses: FxHashMap::default(),
            superclasses: FxHashMap::default(),
            most_specific: FxHashMap::default(),
            least_specific: FxHashMap::default(),
            dispatch: FxHashMap::default(),
        }
    }

    /// Drop every cached view if the registry has moved past the version
    /// this cache was filled at.
    pub(crate) fn sync_to(&mut self, version: u64) {
        if self.version != version {
            *self = Self::new();
            self.version = version;
        }
    }
}

/// Child adjacency for the whole arena, indexed by parent.
fn children_map(shapes: &[NodeShape]) -> Vec<Vec<ShapeId>> {
    let mut children: Vec<Vec<ShapeId>> = vec![Vec::new(); shapes.len()];
    for (index, shape) in shapes.iter().enumerate() {
        if let Some(parent) = shape.extends {
            children[parent.index()].push(ShapeId(index as u32));
        }
    }
    children
}

/// Transitive descendants of `root`, excluding `root`, in breadth-first
/// registration order.
pub(crate) fn descendants_of(shapes: &[NodeShape], root: ShapeId) -> Vec<ShapeId> {
    descendants_with(&children_map(shapes), root)
}

fn descendants_with(children: &[Vec<ShapeId>], root: ShapeId) -> Vec<ShapeId> {
    let mut out = Vec::new();
    let mut queue: VecDeque<ShapeId> = children[root.index()].iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        out.push(id);
        queue.extend(children[id.index()].iter().copied());
    }
    out
}

/// Transitive ancestors of `id`, excluding `id`, closest first.
pub(crate) fn ancestors_of(shapes: &[NodeShape], id: ShapeId) -> Vec<ShapeId> {
    let mut out = Vec::new();
    let mut current = shapes[id.index()].extends;
    while let Some(parent) = current {
        out.push(parent);
        current = shapes[parent.index()].extends;
    }
    out
}

/// Of `inputs` and all their descendants, the shapes nothing else in that
/// candidate set extends.
///
/// `inputs` must be sorted and deduplicated; results come out in that
/// order, descendants interleaved behind the input that contributed them.
pub(crate) fn most_specific_of(shapes: &[NodeShape], inputs: &[ShapeId]) -> Vec<ShapeId> {
    let children = children_map(shapes);
    let mut candidates: Vec<ShapeId> = Vec::new();
    let mut in_set: FxHashSet<ShapeId> = FxHashSet::default();
    for &id in inputs {
        if in_set.insert(id) {
            candidates.push(id);
        }
        for d in descendants_with(&children, id) {
            if in_set.insert(d) {
                candidates.push(d);
            }
        }
    }
    candidates
        .into_iter()
        .filter(|&c| descendants_with(&children, c).iter().all(|d| !in_set.contains(d)))
        .collect()
}

/// Of `inputs` only, the shapes that extend no other member of `inputs`.
///
/// `inputs` must be sorted and deduplicated; results preserve that order.
pub(crate) fn least_specific_of(shapes: &[NodeShape], inputs: &[ShapeId]) -> Vec<ShapeId> {
    let in_set: FxHashSet<ShapeId> = inputs.iter().copied().collect();
    inputs
        .iter()
        .copied()
        .filter(|&c| ancestors_of(shapes, c).iter().all(|a| !in_set.contains(a)))
        .collect()
}
