use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::error;

use logiflow_infra::Sweep;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/sweeps", get(list_sweeps))
        .route("/sweeps/:sweep", post(run_sweep))
}

pub async fn list_sweeps() -> impl IntoResponse {
    Json(serde_json::json!({
        "items": Sweep::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
    }))
}

/// Run one sweep now and return its report.
pub async fn run_sweep(
    Extension(services): Extension<Arc<AppServices>>,
    Path(raw): Path<String>,
) -> axum::response::Response {
    let sweep: Sweep = match raw.parse() {
        Ok(s) => s,
        Err(msg) => return errors::json_error(StatusCode::NOT_FOUND, "unknown_sweep", msg),
    };

    let engine = services.engine().clone();
    match tokio::task::spawn_blocking(move || engine.run(sweep)).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!(sweep = %sweep, error = %e, "sweep task failed");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "sweep_failed", e.to_string())
        }
    }
}
