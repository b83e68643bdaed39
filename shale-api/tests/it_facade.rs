//! End-to-end tests for the Shale facade.
//!
//! These run the full stack: shape registration, trace-based compilation,
//! adapter routing, and execution against capture adapters that record
//! every compiled query object they receive.

use async_trait::async_trait;
use serde_json::{json, Value};
use shale_api::{ApiError, Shale, ShaleBuilder, ShaleConfig};
use shale_query::{
    CreateQuery, DeleteQuery, DeleteResult, SelectQuery, SortDirection, UpdateQuery,
};
use shale_schema::{
    datatype::XSD_STRING, NodeShapeConfig, PropertyShapeConfig, ShapeId, ShapeRegistry,
};
use shale_store::{QuadStore, StoreError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Adapter that records every compiled query and answers with canned rows.
#[derive(Debug, Default)]
struct CaptureStore {
    selects: Mutex<Vec<Value>>,
    creates: Mutex<Vec<Value>>,
    updates: Mutex<Vec<Value>>,
    deletes: Mutex<Vec<Value>>,
    rows: Mutex<Vec<Value>>,
}

impl CaptureStore {
    fn with_rows(rows: Vec<Value>) -> Arc<Self> {
        let store = CaptureStore::default();
        *store.rows.lock().unwrap() = rows;
        Arc::new(store)
    }

    fn last_select(&self) -> Value {
        self.selects.lock().unwrap().last().cloned().unwrap()
    }

    fn select_count(&self) -> usize {
        self.selects.lock().unwrap().len()
    }
}

fn record(log: &Mutex<Vec<Value>>, query: &impl serde::Serialize) -> shale_store::Result<()> {
    let as_json = serde_json::to_value(query).map_err(|e| StoreError::backend(e.to_string()))?;
    log.lock().unwrap().push(as_json);
    Ok(())
}

#[async_trait]
impl QuadStore for CaptureStore {
    async fn select_query(&self, query: &SelectQuery) -> shale_store::Result<Vec<Value>> {
        record(&self.selects, query)?;
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn create_query(&self, query: &CreateQuery) -> shale_store::Result<Value> {
        record(&self.creates, query)?;
        Ok(json!({"id": "urn:p:created"}))
    }

    async fn update_query(&self, query: &UpdateQuery) -> shale_store::Result<Value> {
        record(&self.updates, query)?;
        Ok(json!({"id": query.id}))
    }

    async fn delete_query(&self, query: &DeleteQuery) -> shale_store::Result<DeleteResult> {
        record(&self.deletes, query)?;
        Ok(DeleteResult {
            deleted: query.ids.clone(),
            count: query.ids.len(),
            failed: Vec::new(),
            errors: Vec::new(),
        })
    }
}

/// Adapter with reads only; mutation defaults reject.
#[derive(Debug)]
struct ReadOnlyStore;

#[async_trait]
impl QuadStore for ReadOnlyStore {
    async fn select_query(&self, _query: &SelectQuery) -> shale_store::Result<Vec<Value>> {
        Ok(Vec::new())
    }
}

/// Person/Employee schema shared by the tests.
fn schema() -> (ShapeRegistry, ShapeId, ShapeId) {
    let registry = ShapeRegistry::new();
    let person = registry
        .register(NodeShapeConfig::new("Person").target_class("http://schema.org/Person"))
        .unwrap();
    let employee = registry
        .register(NodeShapeConfig::new("Employee").extends(person))
        .unwrap();

    registry
        .register_property(
            person,
            "name",
            PropertyShapeConfig::new("http://schema.org/name")
                .datatype(XSD_STRING)
                .min_count(1)
                .max_count(1),
        )
        .unwrap();
    registry
        .register_property(
            person,
            "hobby",
            PropertyShapeConfig::new("http://example.org/hobby")
                .datatype(XSD_STRING)
                .max_count(1),
        )
        .unwrap();
    registry
        .register_property(
            person,
            "bestFriend",
            PropertyShapeConfig::new("http://example.org/bestFriend")
                .value_shape(person)
                .max_count(1),
        )
        .unwrap();
    registry
        .register_property(
            person,
            "friends",
            PropertyShapeConfig::new("http://schema.org/knows").value_shape(person),
        )
        .unwrap();

    (registry, person, employee)
}

async fn shale_with(store: Arc<dyn QuadStore>) -> (Shale, ShapeId, ShapeId) {
    let (registry, person, employee) = schema();
    let shale = ShaleBuilder::new()
        .registry(&registry)
        .default_store(store)
        .build()
        .await
        .unwrap();
    (shale, person, employee)
}

#[tokio::test]
async fn select_compiles_routes_and_returns_rows() {
    let store = CaptureStore::with_rows(vec![json!({"name": "Moa"})]);
    let (shale, person, _) = shale_with(store.clone()).await;

    let rows = shale
        .select(person, |p| p.prop("name"))
        .execute()
        .await
        .unwrap();

    assert_eq!(rows, vec![json!({"name": "Moa"})]);
    assert_eq!(
        store.last_select(),
        json!({
            "type": "select",
            "select": [[{"property": {"label": "name", "path": ["http://schema.org/name"]}}]],
            "shape": "urn:shale:shape:Person"
        })
    );
}

#[tokio::test]
async fn nested_reads_compile_one_path_of_three_steps() {
    let store = CaptureStore::with_rows(Vec::new());
    let (shale, person, _) = shale_with(store.clone()).await;

    shale
        .select(person, |p| p.prop("friends").prop("bestFriend").prop("name"))
        .execute()
        .await
        .unwrap();

    let select = store.last_select()["select"].clone();
    let path = select[0].as_array().unwrap();
    assert_eq!(path.len(), 3);
    let labels: Vec<_> = path
        .iter()
        .map(|step| step["property"]["label"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(labels, ["friends", "bestFriend", "name"]);
}

#[tokio::test]
async fn set_filters_compile_into_the_path_step() {
    let store = CaptureStore::with_rows(Vec::new());
    let (shale, person, _) = shale_with(store.clone()).await;

    shale
        .select(person, |p| {
            p.prop("friends").where_(|f| {
                f.prop("name")
                    .equals("Moa")
                    .and(f.prop("hobby").equals("Jogging"))
            })
        })
        .execute()
        .await
        .unwrap();

    let step = store.last_select()["select"][0][0].clone();
    assert_eq!(step["property"]["label"], json!("friends"));
    assert_eq!(
        step["where"]["firstPath"]["path"][0]["property"]["label"],
        json!("name")
    );
    assert_eq!(step["where"]["firstPath"]["method"], json!("equals"));
    assert_eq!(step["where"]["firstPath"]["args"], json!(["Moa"]));
    assert_eq!(
        step["where"]["andOr"],
        json!([{"and": {
            "path": [{"property": {"label": "hobby", "path": ["http://example.org/hobby"]}}],
            "method": "equals",
            "args": ["Jogging"]
        }}])
    );
}

#[tokio::test]
async fn modifiers_and_sort_reach_the_adapter() {
    let store = CaptureStore::with_rows(Vec::new());
    let (shale, person, _) = shale_with(store.clone()).await;

    shale
        .query(person)
        .select(|p| p.prop("name"))
        .sort_by(|p| p.prop("name"), SortDirection::Desc)
        .limit(5)
        .offset(10)
        .execute()
        .await
        .unwrap();

    let captured = store.last_select();
    assert_eq!(captured["sortBy"]["direction"], json!("DESC"));
    assert_eq!(captured["limit"], json!(5));
    assert_eq!(captured["offset"], json!(10));
}

#[tokio::test]
async fn exec_for_binds_subjects_per_call() {
    let store = CaptureStore::with_rows(Vec::new());
    let (shale, person, _) = shale_with(store.clone()).await;

    let template = shale.select(person, |p| p.prop("name"));
    template.exec_for("urn:p:1").execute().await.unwrap();
    template.exec_for("urn:p:2").execute().await.unwrap();

    let captured = store.selects.lock().unwrap().clone();
    assert_eq!(captured[0]["subject"], json!("urn:p:1"));
    assert_eq!(captured[0]["singleResult"], json!(true));
    assert_eq!(captured[1]["subject"], json!("urn:p:2"));
}

#[tokio::test]
async fn context_values_resolve_inside_filters() {
    let store = CaptureStore::with_rows(Vec::new());
    let (shale, person, _) = shale_with(store.clone()).await;
    shale.context().set_node("me", "urn:p:1");

    let ctx = shale.context().clone();
    shale
        .query(person)
        .select(|p| p.prop("name"))
        .where_(move |p| p.prop("bestFriend").equals(ctx.arg("me")))
        .execute()
        .await
        .unwrap();

    assert_eq!(
        store.last_select()["where"]["firstPath"]["args"],
        json!([{"subject": "urn:p:1"}])
    );
}

#[tokio::test]
async fn create_compiles_payload_and_returns_adapter_result() {
    let store = CaptureStore::with_rows(Vec::new());
    let (shale, person, _) = shale_with(store.clone()).await;

    let payload = json!({"name": "Moa", "hobby": "Chess"});
    let result = shale.create(person, &payload).execute().await.unwrap();

    assert_eq!(result, json!({"id": "urn:p:created"}));
    let captured = store.creates.lock().unwrap().clone();
    assert_eq!(captured[0]["type"], json!("create"));
    assert_eq!(captured[0]["shape"], json!("urn:shale:shape:Person"));
    assert_eq!(
        captured[0]["description"]["fields"][1]["prop"]["label"],
        json!("name")
    );
}

#[tokio::test]
async fn update_carries_target_id_and_fields() {
    let store = CaptureStore::with_rows(Vec::new());
    let (shale, person, _) = shale_with(store.clone()).await;

    let payload = json!({"hobby": "Chess"});
    let result = shale
        .update(person, "urn:p:1", &payload)
        .execute()
        .await
        .unwrap();

    assert_eq!(result, json!({"id": "urn:p:1"}));
    let captured = store.updates.lock().unwrap().clone();
    assert_eq!(captured[0]["type"], json!("update"));
    assert_eq!(captured[0]["id"], json!("urn:p:1"));
    assert_eq!(
        captured[0]["updates"]["fields"],
        json!([{
            "prop": {"label": "hobby", "path": ["http://example.org/hobby"]},
            "val": "Chess"
        }])
    );
}

#[tokio::test]
async fn delete_preserves_order_and_reports_counts() {
    let store = CaptureStore::with_rows(Vec::new());
    let (shale, person, _) = shale_with(store.clone()).await;

    let result = shale
        .delete(person, ["urn:p:a", "urn:p:b"])
        .execute()
        .await
        .unwrap();

    assert_eq!(result.count, 2);
    assert_eq!(result.deleted.len(), 2);
    let captured = store.deletes.lock().unwrap().clone();
    assert_eq!(
        captured[0]["ids"],
        json!([{"id": "urn:p:a"}, {"id": "urn:p:b"}])
    );
}

#[tokio::test]
async fn compilation_errors_surface_before_routing() {
    let store = CaptureStore::with_rows(Vec::new());
    let (shale, person, _) = shale_with(store.clone()).await;

    let err = shale
        .select(person, |p| p.prop("doesNotExist"))
        .execute()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApiError::Query(shale_query::QueryError::UnknownProperty { .. })
    ));
    assert_eq!(store.select_count(), 0);
}

#[tokio::test]
async fn execute_checked_accepts_matching_payloads() {
    let store = CaptureStore::with_rows(vec![json!({"name": "Moa", "hobby": null})]);
    let (shale, person, _) = shale_with(store).await;

    let rows = shale
        .select(person, |p| vec![p.prop("name"), p.prop("hobby")])
        .execute_checked()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn execute_checked_rejects_wrong_payloads() {
    let store = CaptureStore::with_rows(vec![json!({"unrelated": 1})]);
    let (shale, person, _) = shale_with(store).await;

    let err = shale
        .select(person, |p| p.prop("name"))
        .execute_checked()
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::ResultShapeMismatch { ref shape } if shape.contains("Person")));
}

#[tokio::test]
async fn routing_prefers_shape_specific_adapter() {
    let (registry, person, employee) = schema();
    let default_store = CaptureStore::with_rows(Vec::new());
    let employee_store = CaptureStore::with_rows(Vec::new());

    let shale = ShaleBuilder::new()
        .registry(&registry)
        .default_store(default_store.clone())
        .store_for_shape(employee, employee_store.clone())
        .build()
        .await
        .unwrap();

    shale
        .select(employee, |p| p.prop("name"))
        .execute()
        .await
        .unwrap();
    shale
        .select(person, |p| p.prop("name"))
        .execute()
        .await
        .unwrap();

    assert_eq!(employee_store.select_count(), 1);
    assert_eq!(default_store.select_count(), 1);
    assert_eq!(
        employee_store.last_select()["shape"],
        json!("urn:shale:shape:Employee")
    );
}

#[tokio::test]
async fn missing_adapter_rejects_the_call() {
    let (registry, person, _) = schema();
    let shale = ShaleBuilder::new().registry(&registry).build().await.unwrap();

    let err = shale
        .select(person, |p| p.prop("name"))
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::Store(StoreError::NoAdapter { ref shape }) if shape == "Person"
    ));
}

#[tokio::test]
async fn unsupported_mutations_reject_without_panicking() {
    let (shale, person, _) = shale_with(Arc::new(ReadOnlyStore)).await;

    let payload = json!({"name": "Moa"});
    let err = shale.create(person, &payload).execute().await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Store(StoreError::Unsupported { op: "create" })
    ));
}

#[tokio::test]
async fn deferred_readiness_holds_execution_until_signaled() {
    let store = CaptureStore::with_rows(Vec::new());
    let (registry, person, _) = schema();
    let shale = Arc::new(
        ShaleBuilder::new()
            .registry(&registry)
            .default_store(store.clone())
            .await_ready()
            .build()
            .await
            .unwrap(),
    );

    let signaler = {
        let shale = shale.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            shale.set_ready();
        })
    };

    let started = Instant::now();
    shale
        .select(person, |p| p.prop("name"))
        .execute()
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(store.select_count(), 1);

    signaler.await.unwrap();
}

#[tokio::test]
async fn readiness_timeout_proceeds_instead_of_wedging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("shale_api=debug")
        .try_init();

    let store = CaptureStore::with_rows(Vec::new());
    let (registry, person, _) = schema();
    let shale = ShaleBuilder::new()
        .registry(&registry)
        .default_store(store.clone())
        .config(ShaleConfig {
            readiness_timeout_ms: 40,
            ..Default::default()
        })
        .await_ready()
        .build()
        .await
        .unwrap();

    let started = Instant::now();
    shale
        .select(person, |p| p.prop("name"))
        .execute()
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(40));
    assert_eq!(store.select_count(), 1);
    assert!(!shale.is_ready());
}
