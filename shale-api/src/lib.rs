//! High-level facade over the Shale crates.
//!
//! [`Shale`] bundles a shape registry, a storage router, a query context,
//! and a readiness gate behind one handle. Applications register shapes,
//! wire adapters through [`ShaleBuilder`], and then read and mutate data
//! through chainable handles without touching the underlying crates.
//!
//! ```ignore
//! use shale_api::{Shale, ShaleBuilder};
//!
//! let shale = ShaleBuilder::new()
//!     .registry(&registry)
//!     .default_store(store)
//!     .build()
//!     .await?;
//!
//! let people = shale
//!     .query(person)
//!     .select(|p| vec![p.prop("name"), p.prop("friends").prop("name")])
//!     .where_(|p| p.prop("age").equals(30))
//!     .execute()
//!     .await?;
//! ```
//!
//! # Design
//!
//! The facade adds no semantics of its own: compilation lives in
//! `shale-query`, routing in `shale-store`. What it contributes is
//! sequencing, the same for every terminal call: await readiness (bounded
//! by the configured timeout), compile, route by shape, execute. Readiness
//! defaults to immediate; [`ShaleBuilder::await_ready`] defers execution
//! until [`Shale::set_ready`] fires, so queries built during startup do
//! not race adapter wiring.

mod error;
pub mod handle;
pub mod ready;

use ready::ReadyGate;
use serde::Deserialize;
use serde_json::Value;
use shale_core::NodeRef;
use shale_query::{DeleteTargets, QueryContext, QueryValue, Selection};
use shale_schema::{ShapeId, ShapeRegistry};
use shale_store::{QuadStore, StoreRouter};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use error::{ApiError, Result};
pub use handle::{CreateHandle, DeleteHandle, SelectHandle, UpdateHandle};

// ============================================================================
// Configuration
// ============================================================================

/// Facade configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShaleConfig {
    /// Upper bound on waiting for the readiness signal before a terminal
    /// call proceeds anyway.
    pub readiness_timeout_ms: u64,
    /// How long a memoized shape-to-adapter route stays valid.
    pub route_cache_ttl_ms: u64,
}

impl Default for ShaleConfig {
    fn default() -> Self {
        Self {
            readiness_timeout_ms: 5_000,
            route_cache_ttl_ms: 30_000,
        }
    }
}

// ============================================================================
// Facade
// ============================================================================

/// The Shale facade: schema, compilers, routing, and readiness in one
/// handle.
pub struct Shale {
    registry: ShapeRegistry,
    router: StoreRouter,
    context: QueryContext,
    ready: ReadyGate,
    config: ShaleConfig,
}

impl Shale {
    pub fn builder() -> ShaleBuilder {
        ShaleBuilder::new()
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    pub fn router(&self) -> &StoreRouter {
        &self.router
    }

    /// Named values available to filter callbacks.
    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    pub fn config(&self) -> &ShaleConfig {
        &self.config
    }

    /// Fire the environment-readiness signal. Terminal calls waiting on it
    /// proceed; later calls no longer wait.
    pub fn set_ready(&self) {
        self.ready.set_ready();
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_ready()
    }

    pub(crate) async fn await_readiness(&self) {
        self.ready
            .wait(Duration::from_millis(self.config.readiness_timeout_ms))
            .await;
    }

    // --- Entry points ---

    /// Start a read query against `shape`.
    pub fn query(&self, shape: ShapeId) -> SelectHandle<'_> {
        SelectHandle::new(self, shape)
    }

    /// Shorthand: a read query with its selection already attached.
    pub fn select<S, F>(&self, shape: ShapeId, build: F) -> SelectHandle<'_>
    where
        S: Into<Selection>,
        F: Fn(&QueryValue) -> S + Send + Sync + 'static,
    {
        self.query(shape).select(build)
    }

    /// Start a node creation from a JSON payload.
    pub fn create<'a>(&'a self, shape: ShapeId, description: &'a Value) -> CreateHandle<'a> {
        CreateHandle::new(self, shape, description)
    }

    /// Start an update of `target` from a JSON payload.
    pub fn update<'a>(
        &'a self,
        shape: ShapeId,
        target: impl Into<NodeRef>,
        updates: &'a Value,
    ) -> UpdateHandle<'a> {
        UpdateHandle::new(self, shape, target, updates)
    }

    /// Start a removal of one or more nodes.
    pub fn delete(&self, shape: ShapeId, targets: impl Into<DeleteTargets>) -> DeleteHandle<'_> {
        DeleteHandle::new(self, shape, targets)
    }
}

impl fmt::Debug for Shale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shale")
            .field("registry", &self.registry)
            .field("router", &self.router)
            .field("ready", &self.ready)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Shale`] instances.
///
/// `build` is async because adapter registration runs each adapter's
/// `init` once.
#[derive(Default)]
pub struct ShaleBuilder {
    registry: Option<ShapeRegistry>,
    config: ShaleConfig,
    default_store: Option<Arc<dyn QuadStore>>,
    shape_stores: Vec<(ShapeId, Arc<dyn QuadStore>)>,
    defer_ready: bool,
}

impl ShaleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing registry. Shapes registered on it before or after
    /// the build are visible; the facade shares it, not a snapshot.
    pub fn registry(mut self, registry: &ShapeRegistry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    pub fn config(mut self, config: ShaleConfig) -> Self {
        self.config = config;
        self
    }

    /// Install the process-wide fallback adapter.
    pub fn default_store(mut self, store: Arc<dyn QuadStore>) -> Self {
        self.default_store = Some(store);
        self
    }

    /// Register an adapter for one shape and its descendants.
    pub fn store_for_shape(mut self, shape: ShapeId, store: Arc<dyn QuadStore>) -> Self {
        self.shape_stores.push((shape, store));
        self
    }

    /// Defer execution until [`Shale::set_ready`] fires (bounded by the
    /// configured timeout). Default is immediate readiness.
    pub fn await_ready(mut self) -> Self {
        self.defer_ready = true;
        self
    }

    /// Construct the facade, installing adapters and running their `init`.
    pub async fn build(self) -> Result<Shale> {
        let registry = self.registry.unwrap_or_default();
        let router = StoreRouter::new(
            &registry,
            Duration::from_millis(self.config.route_cache_ttl_ms),
        );

        if let Some(store) = self.default_store {
            router.set_default(store).await?;
        }
        for (shape, store) in self.shape_stores {
            router.register(shape, store).await?;
        }

        Ok(Shale {
            registry,
            router,
            context: QueryContext::new(),
            ready: ReadyGate::new(!self.defer_ready),
            config: self.config,
        })
    }
}

impl fmt::Debug for ShaleBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaleBuilder")
            .field("has_registry", &self.registry.is_some())
            .field("has_default_store", &self.default_store.is_some())
            .field("shape_stores", &self.shape_stores.len())
            .field("defer_ready", &self.defer_ready)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_apply_to_missing_keys() {
        let config: ShaleConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.readiness_timeout_ms, 5_000);
        assert_eq!(config.route_cache_ttl_ms, 30_000);

        let config: ShaleConfig =
            serde_json::from_str(r#"{"readinessTimeoutMs": 250}"#).unwrap();
        assert_eq!(config.readiness_timeout_ms, 250);
        assert_eq!(config.route_cache_ttl_ms, 30_000);
    }

    #[tokio::test]
    async fn default_build_is_immediately_ready() {
        let shale = ShaleBuilder::new().build().await.unwrap();
        assert!(shale.is_ready());
    }

    #[tokio::test]
    async fn await_ready_defers_until_signal() {
        let shale = ShaleBuilder::new().await_ready().build().await.unwrap();
        assert!(!shale.is_ready());
        shale.set_ready();
        assert!(shale.is_ready());
    }
}
