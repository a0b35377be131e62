use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use logiflow_api::app::services::build_services;
use logiflow_infra::LogiflowConfig;
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port, monitoring not scheduled.
        let services = Arc::new(build_services(&LogiflowConfig::default()).unwrap());
        let app = logiflow_api::app::build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn create_product(&self, sku: &str, category: &str, weight: f64, stock: u32) {
        let (status, _) = self
            .post(
                "/products",
                json!({
                    "sku": sku,
                    "name": format!("Product {sku}"),
                    "category": category,
                    "unit_weight_kg": weight,
                    "unit_volume_m3": 0.02,
                    "unit_price": 1500,
                    "stock": stock,
                    "location": "A-01",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn submit(&self, items: Value) -> (StatusCode, Value) {
        self.post(
            "/orders",
            json!({
                "client_id": "CLIENT-42",
                "client_name": "Dachbau GmbH",
                "delivery_address": "Friedrichstraße 10, 10117 Berlin, Germany",
                "requested_delivery": Utc::now() + ChronoDuration::days(4),
                "items": items,
            }),
        )
        .await
    }

    /// The pipeline runs in the background; poll until the order leaves the
    /// intake statuses.
    async fn order_eventually(&self, id: &str, wanted: &str) -> Value {
        for _ in 0..100 {
            let (status, body) = self.get(&format!("/orders/{id}")).await;
            assert_eq!(status, StatusCode::OK);
            if body["status"] == wanted {
                return body;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("order {id} did not reach {wanted} within timeout");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn submitted_order_reaches_ready_for_pickup() {
    let srv = TestServer::spawn().await;
    srv.create_product("PIPE-15", "plumbing supplies", 12.0, 100).await;
    srv.create_product("ROOF-7", "ROOFING_MATERIALS", 8.0, 100).await;

    let (status, order) = srv
        .submit(json!([{ "sku": "PIPE-15", "quantity": 3 }, { "sku": "ROOF-7", "quantity": 2 }]))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(order["status"], "RECEIVED");
    let id = order["id"].as_str().unwrap().to_string();

    let ready = srv.order_eventually(&id, "READY_FOR_PICKUP").await;
    assert_eq!(ready["shipment"]["truck_id"], "TRUCK_SMALL_004");
    assert_eq!(ready["shipment"]["status"], "SCHEDULED");
    assert_eq!(ready["items"].as_array().unwrap().len(), 2);

    let (_, pipe) = srv.get("/products/PIPE-15").await;
    assert_eq!(pipe["stock"], 97);

    let (_, stats) = srv.get("/orders/stats").await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["by_status"]["READY_FOR_PICKUP"], 1);

    let (_, listed) = srv.get("/orders?status=ready_for_pickup&client_id=CLIENT-42").await;
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);
    let (status, _) = srv.get("/orders?status=PENDING").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, metrics) = srv.get("/metrics").await;
    assert_eq!(metrics["counters"]["orders.processed"], 1);
}

#[tokio::test]
async fn out_of_stock_order_is_cancelled_with_reason() {
    let srv = TestServer::spawn().await;
    srv.create_product("TILE-9", "TILES", 1.5, 0).await;

    let (_, order) = srv.submit(json!([{ "sku": "TILE-9", "quantity": 4 }])).await;
    let id = order["id"].as_str().unwrap().to_string();

    let cancelled = srv.order_eventually(&id, "CANCELLED").await;
    let reason = cancelled["cancellation_reason"].as_str().unwrap();
    assert!(reason.contains("TILE-9") && reason.contains("Available: 0, Requested: 4"), "{reason}");
    assert!(cancelled["shipment"].is_null());

    let (_, notes) = srv.get("/notifications").await;
    let client_notes: Vec<&Value> = notes["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["kind"] == "client" && n["client_id"] == "CLIENT-42")
        .collect();
    assert!(
        client_notes
            .iter()
            .any(|n| n["message"].as_str().unwrap_or_default().contains("cancelled"))
    );
}

#[tokio::test]
async fn bad_requests_map_to_client_errors() {
    let srv = TestServer::spawn().await;
    srv.create_product("BRICK-1", "CONSTRUCTION_MATERIALS", 3.0, 10).await;

    let (status, body) = srv.submit(json!([{ "sku": "NOPE", "quantity": 1 }])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unknown_sku");
    assert_eq!(body["message"], "Product not found: NOPE");

    let (status, body) = srv
        .post(
            "/products",
            json!({ "sku": "BRICK-1", "name": "dup", "category": "TILES", "unit_weight_kg": 1.0, "unit_price": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_exists");

    let (status, body) = srv.get("/orders/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let (status, _) = srv.get("/products/UNKNOWN").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv.post("/products/BRICK-1/restock", json!({ "quantity": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = srv.post("/products/BRICK-1/restock", json!({ "quantity": 5 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stock"], 15);
}

#[tokio::test]
async fn warehouse_endpoints_walk_a_shipment_to_delivery() {
    let srv = TestServer::spawn().await;
    srv.create_product("PIPE-15", "PLUMBING_SUPPLIES", 12.0, 100).await;
    let (_, order) = srv.submit(json!([{ "sku": "PIPE-15", "quantity": 1 }])).await;
    let id = order["id"].as_str().unwrap().to_string();
    let ready = srv.order_eventually(&id, "READY_FOR_PICKUP").await;
    let shipment = ready["shipment"]["id"].as_str().unwrap().to_string();

    let (_, waiting) = srv.get("/shipments/special-handling").await;
    assert!(waiting["items"].as_array().unwrap().is_empty());
    let (status, _) = srv.get("/shipments/overdue-pickups").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = srv.post(&format!("/shipments/{shipment}/dispatch"), json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invariant_violation");

    for (step, expected) in [
        ("start-loading", "LOADING"),
        ("complete-loading", "LOADED"),
        ("dispatch", "IN_TRANSIT"),
    ] {
        let (status, body) = srv.post(&format!("/shipments/{shipment}/{step}"), json!({})).await;
        assert_eq!(status, StatusCode::OK, "{step}: {body}");
        assert_eq!(body["status"], expected);
    }

    let (status, body) = srv
        .post(
            &format!("/shipments/{shipment}/problem"),
            json!({ "description": "detour", "new_eta": Utc::now() - ChronoDuration::hours(1) }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv
        .post(&format!("/shipments/{shipment}/problem"), json!({ "description": "detour" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_problem"], "detour");

    let (status, body) = srv.post(&format!("/shipments/{shipment}/deliver"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["actual_delivery"].is_string());
    srv.order_eventually(&id, "DELIVERED").await;

    let (_, delivered) = srv.get("/shipments?status=DELIVERED").await;
    assert_eq!(delivered["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn sweeps_can_be_triggered_on_demand() {
    let srv = TestServer::spawn().await;
    srv.create_product("TILE-LOW", "TILES", 1.0, 2).await;

    let (status, sweeps) = srv.get("/monitoring/sweeps").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sweeps["items"].as_array().unwrap().len(), 5);

    let (status, report) = srv.post("/monitoring/sweeps/reorder", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["sweep"], "reorder");
    assert_eq!(report["examined"], 1);
    assert_eq!(report["acted"], 1);

    let (_, tile) = srv.get("/products/TILE-LOW").await;
    assert!(tile["stock"].as_u64().unwrap() >= 114);

    let (status, report) = srv.post("/monitoring/sweeps/stuck-orders", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["examined"], 0);

    let (status, body) = srv.post("/monitoring/sweeps/weather", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_sweep");
}
