use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use logiflow_agents::StoreError;
use logiflow_core::ShipmentId;
use logiflow_infra::OperationError;
use logiflow_shipping::Shipment;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_shipments))
        .route("/overdue-pickups", get(overdue_pickups))
        .route("/special-handling", get(special_handling))
        .route("/:id", get(get_shipment))
        .route("/:id/start-loading", post(start_loading))
        .route("/:id/complete-loading", post(complete_loading))
        .route("/:id/dispatch", post(dispatch))
        .route("/:id/deliver", post(deliver))
        .route("/:id/problem", post(report_problem))
}

fn respond_list(result: Result<Vec<Shipment>, StoreError>) -> axum::response::Response {
    match result {
        Ok(found) => {
            let items = found.iter().map(dto::shipment_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

fn respond(result: Result<Shipment, OperationError>) -> axum::response::Response {
    match result {
        Ok(s) => (StatusCode::OK, Json(dto::shipment_to_json(&s))).into_response(),
        Err(e) => errors::operation_error_to_response(e),
    }
}

pub async fn list_shipments(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListShipmentsQuery>,
) -> axum::response::Response {
    let shipments = &services.ctx().shipments;
    respond_list(match query.status {
        Some(status) => shipments.by_status(status),
        None => shipments.list(),
    })
}

/// Scheduled shipments whose pickup slot already passed.
pub async fn overdue_pickups(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let now = services.ctx().clock.now();
    respond_list(services.ctx().shipments.overdue_pickups(now))
}

pub async fn special_handling(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    respond_list(services.ctx().shipments.requiring_special_handling())
}

pub async fn get_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let shipment_id: ShipmentId = match errors::parse_id(&id, "shipment") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.ctx().shipments.get(shipment_id) {
        Ok(Some(s)) => (StatusCode::OK, Json(dto::shipment_to_json(&s))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "shipment not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn start_loading(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match errors::parse_id(&id, "shipment") {
        Ok(shipment_id) => respond(services.warehouse().start_loading(shipment_id)),
        Err(resp) => resp,
    }
}

pub async fn complete_loading(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match errors::parse_id(&id, "shipment") {
        Ok(shipment_id) => respond(services.warehouse().complete_loading(shipment_id)),
        Err(resp) => resp,
    }
}

pub async fn dispatch(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match errors::parse_id(&id, "shipment") {
        Ok(shipment_id) => respond(services.warehouse().dispatch(shipment_id)),
        Err(resp) => resp,
    }
}

pub async fn deliver(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match errors::parse_id(&id, "shipment") {
        Ok(shipment_id) => respond(services.warehouse().mark_delivered(shipment_id)),
        Err(resp) => resp,
    }
}

pub async fn report_problem(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReportProblemRequest>,
) -> axum::response::Response {
    match errors::parse_id(&id, "shipment") {
        Ok(shipment_id) => respond(services.warehouse().report_delivery_problem(
            shipment_id,
            &body.description,
            body.new_eta,
        )),
        Err(resp) => resp,
    }
}
