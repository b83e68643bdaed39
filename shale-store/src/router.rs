//! Shape-based adapter routing.
//!
//! A [`StoreRouter`] picks the adapter that should execute a query: the
//! adapter registered for the query's shape, else the nearest one up the
//! shape's `extends` chain, else the process default. Routing decisions
//! are memoized with a TTL so repeated queries skip the hierarchy walk
//! while late adapter registration still becomes visible.

use crate::adapter::QuadStore;
use crate::error::{Result, StoreError};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use shale_core::{CachePolicy, MemoCache};
use shale_schema::{ShapeId, ShapeRegistry};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Routes compiled queries to storage adapters by shape.
pub struct StoreRouter {
    registry: ShapeRegistry,
    by_shape: RwLock<FxHashMap<ShapeId, Arc<dyn QuadStore>>>,
    default_store: RwLock<Option<Arc<dyn QuadStore>>>,
    /// Memoized route per shape: the shape whose registered adapter
    /// answers, or `None` for the default adapter.
    route_cache: MemoCache<Option<ShapeId>>,
}

impl StoreRouter {
    pub fn new(registry: &ShapeRegistry, route_ttl: Duration) -> Self {
        Self {
            registry: registry.clone(),
            by_shape: RwLock::new(FxHashMap::default()),
            default_store: RwLock::new(None),
            route_cache: MemoCache::new(route_ttl),
        }
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    /// Install the process-wide fallback adapter, running its `init` once.
    pub async fn set_default(&self, store: Arc<dyn QuadStore>) -> Result<()> {
        store.init().await?;
        let previous = self.default_store.write().replace(store);
        if previous.is_some() {
            tracing::warn!("replacing default storage adapter");
        } else {
            tracing::debug!("default storage adapter installed");
        }
        Ok(())
    }

    /// Register an adapter for one shape, running its `init` once.
    ///
    /// Queries against the shape and its descendants (unless they have a
    /// closer registration) route here. A cached route may keep pointing
    /// at the previous target until the route TTL expires.
    pub async fn register(&self, shape: ShapeId, store: Arc<dyn QuadStore>) -> Result<()> {
        let label = self.registry.label_of(shape)?;
        store.init().await?;
        let previous = self.by_shape.write().insert(shape, store);
        if previous.is_some() {
            tracing::warn!(shape = %label, "replacing storage adapter registration");
        } else {
            tracing::debug!(shape = %label, "storage adapter registered");
        }
        Ok(())
    }

    /// The adapter that should execute queries against `shape`.
    pub fn store_for(&self, shape: ShapeId) -> Result<Arc<dyn QuadStore>> {
        self.store_for_with(shape, CachePolicy::Use)
    }

    /// [`store_for`](Self::store_for) with explicit cache participation.
    /// `Bypass` recomputes the route, picking up adapters registered since
    /// the cached decision.
    pub fn store_for_with(&self, shape: ShapeId, policy: CachePolicy) -> Result<Arc<dyn QuadStore>> {
        // Validates the handle before any cache key is derived from it.
        let label = self.registry.label_of(shape)?;

        let key = shape.index().to_string();
        let route = self
            .route_cache
            .get_or_insert_with(&key, policy, || self.compute_route(shape));

        match route {
            Some(owner) => match self.by_shape.read().get(&owner) {
                Some(store) => Ok(store.clone()),
                None => Err(StoreError::NoAdapter { shape: label }),
            },
            None => self
                .default_store
                .read()
                .clone()
                .ok_or(StoreError::NoAdapter { shape: label }),
        }
    }

    /// Walk `shape` and its ancestors, closest first, to the nearest
    /// registered adapter. `None` routes to the default.
    fn compute_route(&self, shape: ShapeId) -> Option<ShapeId> {
        let by_shape = self.by_shape.read();
        if by_shape.contains_key(&shape) {
            return Some(shape);
        }
        let ancestors = self.registry.superclasses_of(shape).unwrap_or_default();
        ancestors.into_iter().find(|a| by_shape.contains_key(a))
    }
}

impl fmt::Debug for StoreRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRouter")
            .field("registered", &self.by_shape.read().len())
            .field("has_default", &self.default_store.read().is_some())
            .field("route_ttl", &self.route_cache.ttl())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use shale_query::SelectQuery;
    use shale_schema::NodeShapeConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct MockStore {
        inits: AtomicUsize,
    }

    #[async_trait]
    impl QuadStore for MockStore {
        async fn init(&self) -> Result<()> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn select_query(&self, _query: &SelectQuery) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }
    }

    fn hierarchy() -> (ShapeRegistry, ShapeId, ShapeId, ShapeId) {
        let registry = ShapeRegistry::new();
        let agent = registry.register(NodeShapeConfig::new("Agent")).unwrap();
        let person = registry
            .register(NodeShapeConfig::new("Person").extends(agent))
            .unwrap();
        let employee = registry
            .register(NodeShapeConfig::new("Employee").extends(person))
            .unwrap();
        (registry, agent, person, employee)
    }

    #[tokio::test]
    async fn exact_registration_wins_over_ancestors() {
        let (registry, agent, person, employee) = hierarchy();
        let router = StoreRouter::new(&registry, Duration::from_secs(60));

        let agent_store: Arc<dyn QuadStore> = Arc::new(MockStore::default());
        let person_store: Arc<dyn QuadStore> = Arc::new(MockStore::default());
        router.register(agent, agent_store.clone()).await.unwrap();
        router.register(person, person_store.clone()).await.unwrap();

        assert!(Arc::ptr_eq(&router.store_for(person).unwrap(), &person_store));
        // Employee has no registration of its own; the closest ancestor wins.
        assert!(Arc::ptr_eq(&router.store_for(employee).unwrap(), &person_store));
        assert!(Arc::ptr_eq(&router.store_for(agent).unwrap(), &agent_store));
    }

    #[tokio::test]
    async fn default_catches_unrouted_shapes() {
        let (registry, _, person, _) = hierarchy();
        let router = StoreRouter::new(&registry, Duration::from_secs(60));

        let fallback: Arc<dyn QuadStore> = Arc::new(MockStore::default());
        router.set_default(fallback.clone()).await.unwrap();

        assert!(Arc::ptr_eq(&router.store_for(person).unwrap(), &fallback));
    }

    #[tokio::test]
    async fn missing_adapter_is_an_error_not_a_panic() {
        let (registry, _, person, _) = hierarchy();
        let router = StoreRouter::new(&registry, Duration::from_secs(60));

        let err = router.store_for(person).unwrap_err();
        assert!(matches!(err, StoreError::NoAdapter { ref shape } if shape == "Person"));
    }

    #[tokio::test]
    async fn registration_runs_init_once() {
        let (registry, _, person, _) = hierarchy();
        let router = StoreRouter::new(&registry, Duration::from_secs(60));

        let store = Arc::new(MockStore::default());
        router
            .register(person, store.clone() as Arc<dyn QuadStore>)
            .await
            .unwrap();

        assert_eq!(store.inits.load(Ordering::SeqCst), 1);
        // Routing does not re-run init.
        router.store_for(person).unwrap();
        router.store_for(person).unwrap();
        assert_eq!(store.inits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cached_route_outlives_late_registration_until_ttl() {
        let (registry, _, person, _) = hierarchy();
        let router = StoreRouter::new(&registry, Duration::from_millis(30));

        let fallback: Arc<dyn QuadStore> = Arc::new(MockStore::default());
        router.set_default(fallback.clone()).await.unwrap();
        // Prime the cache with the default route.
        assert!(Arc::ptr_eq(&router.store_for(person).unwrap(), &fallback));

        let specific: Arc<dyn QuadStore> = Arc::new(MockStore::default());
        router.register(person, specific.clone()).await.unwrap();

        // Still the cached default inside the TTL window.
        assert!(Arc::ptr_eq(&router.store_for(person).unwrap(), &fallback));
        // Bypass sees the new registration immediately.
        assert!(Arc::ptr_eq(
            &router.store_for_with(person, CachePolicy::Bypass).unwrap(),
            &specific
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(Arc::ptr_eq(&router.store_for(person).unwrap(), &specific));
    }

    #[tokio::test]
    async fn foreign_shape_handles_are_rejected() {
        // Three shapes registered; a handle from a larger foreign registry
        // points past this arena.
        let (registry, ..) = hierarchy();
        let other = ShapeRegistry::new();
        let mut last = None;
        for label in ["A", "B", "C", "D", "E"] {
            last = Some(other.register(NodeShapeConfig::new(label)).unwrap());
        }
        let foreign = last.unwrap();

        let router = StoreRouter::new(&registry, Duration::from_secs(60));
        assert!(router.store_for(foreign).is_err());
    }
}
