use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::info;

use logiflow_core::OrderId;
use logiflow_infra::SubmitOrder;
use logiflow_orders::OrderStatus;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(submit_order))
        .route("/stats", get(order_stats))
        .route("/:id", get(get_order))
}

/// Record the order and start its pipeline in the background.
pub async fn submit_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SubmitOrderRequest>,
) -> axum::response::Response {
    let order = match services.orchestrator().submit(SubmitOrder {
        client_id: body.client_id,
        client_name: body.client_name,
        delivery_address: body.delivery_address,
        requested_delivery: body.requested_delivery,
        lines: body.items,
    }) {
        Ok(order) => order,
        Err(e) => return errors::submit_error_to_response(e),
    };

    let pipeline = services.orchestrator().spawn(order.id_typed());
    let order_id = order.id_typed();
    tokio::spawn(async move {
        if let Ok(outcome) = pipeline.await {
            info!(order_id = %order_id, outcome = ?outcome, "order pipeline finished");
        }
    });

    (StatusCode::ACCEPTED, Json(dto::order_to_json(&order))).into_response()
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let order = match services.ctx().orders.get(order_id) {
        Ok(Some(order)) => order,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        Err(e) => return errors::store_error_to_response(e),
    };
    let shipment = match services.ctx().shipments.for_order(order_id) {
        Ok(s) => s,
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut body = dto::order_to_json(&order);
    body["shipment"] = shipment
        .as_ref()
        .map(dto::shipment_to_json)
        .unwrap_or(serde_json::Value::Null);
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListOrdersQuery>,
) -> axum::response::Response {
    let orders = &services.ctx().orders;
    let result = match (query.status.as_deref(), query.client_id.as_deref()) {
        (Some(raw), client) => {
            let status: OrderStatus = match raw.parse() {
                Ok(s) => s,
                Err(e) => return errors::domain_error_to_response(e),
            };
            orders.by_status(status).map(|found| {
                found
                    .into_iter()
                    .filter(|o| client.is_none_or(|c| o.client_id() == c))
                    .collect::<Vec<_>>()
            })
        }
        (None, Some(client)) => orders.by_client(client),
        (None, None) => orders.list(),
    };

    match result {
        Ok(found) => {
            let items = found.iter().map(dto::order_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn order_stats(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.order_stats() {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
