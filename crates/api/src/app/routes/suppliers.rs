use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
    Json, Router,
};
use chrono::Utc;

use depot_core::AggregateId;
use depot_directory::{RegisterSupplier, SupplierCommand, SupplierId, UpdateSupplier};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_supplier).get(list_suppliers))
        .route("/:id", put(update_supplier))
}

pub async fn register_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterSupplierRequest>,
) -> axum::response::Response {
    let agg = AggregateId::new();
    let supplier_id = SupplierId::new(agg);

    let cmd = SupplierCommand::RegisterSupplier(RegisterSupplier {
        supplier_id,
        name: body.name,
        contact: body.contact,
        occurred_at: Utc::now(),
    });

    let committed = match services.dispatch_supplier(agg, cmd) {
        Ok(c) => c,
        Err(e) => return errors::dispatch_error_to_response(e),
    };

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": agg.to_string(),
            "events_committed": committed.len(),
        })),
    )
        .into_response()
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let suppliers = services
        .supplier_rows()
        .iter()
        .map(dto::supplier_row_to_json)
        .collect::<Vec<_>>();

    (StatusCode::OK, Json(serde_json::json!({ "suppliers": suppliers }))).into_response()
}

pub async fn update_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateSupplierRequest>,
) -> axum::response::Response {
    let agg: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid supplier id")
        }
    };

    let cmd = SupplierCommand::UpdateSupplier(UpdateSupplier {
        supplier_id: SupplierId::new(agg),
        name: body.name,
        contact: body.contact,
        occurred_at: Utc::now(),
    });

    let committed = match services.dispatch_supplier(agg, cmd) {
        Ok(c) => c,
        Err(e) => return errors::dispatch_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "id": agg.to_string(),
            "events_committed": committed.len(),
        })),
    )
        .into_response()
}
