use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use logiflow_core::{Entity, ProductId};
use logiflow_inventory::{NewProduct, Product, ProductCategory};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:sku", get(get_product))
        .route("/:sku/restock", post(restock_product))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    let Ok(category) = body.category.parse::<ProductCategory>();
    let product = match Product::new(
        ProductId::new(),
        NewProduct {
            sku: body.sku,
            name: body.name,
            category,
            unit_weight_kg: body.unit_weight_kg,
            unit_volume_m3: body.unit_volume_m3,
            unit_price: body.unit_price,
            stock: body.stock,
            location: body.location,
        },
    ) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ctx().products.insert(product) {
        Ok(stored) => (StatusCode::CREATED, Json(dto::product_to_json(&stored))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
) -> axum::response::Response {
    match services.ctx().products.find_by_sku(&sku) {
        Ok(Some(p)) => (StatusCode::OK, Json(dto::product_to_json(&p))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_products(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.ctx().products.list() {
        Ok(products) => {
            let items = products.iter().map(dto::product_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn restock_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
    Json(body): Json<dto::RestockRequest>,
) -> axum::response::Response {
    if body.quantity == 0 {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "quantity must be positive");
    }
    let products = &services.ctx().products;
    let product = match products.find_by_sku(&sku) {
        Ok(Some(p)) => p,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    match products.restock(*product.id(), body.quantity) {
        Ok(updated) => (StatusCode::OK, Json(dto::product_to_json(&updated))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
