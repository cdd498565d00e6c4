use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use depot_core::AggregateId;
use depot_inventory::{ProductCommand, ProductId, RegisterProduct};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_product).get(list_products))
        .route("/:id", get(get_product))
}

pub async fn register_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterProductRequest>,
) -> axum::response::Response {
    let agg = AggregateId::new();
    let product_id = ProductId::new(agg);

    let cmd = ProductCommand::RegisterProduct(RegisterProduct {
        product_id,
        name: body.name,
        brand: body.brand,
        stock_minimum: body.stock_minimum,
        sale_price_cents: body.sale_price_cents,
        occurred_at: Utc::now(),
    });

    let committed = match services.dispatch_product(agg, cmd) {
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

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let products = services
        .product_rows()
        .iter()
        .map(dto::product_row_to_json)
        .collect::<Vec<_>>();

    (StatusCode::OK, Json(serde_json::json!({ "products": products }))).into_response()
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let agg: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };

    match services.product_row(&ProductId::new(agg)) {
        Some(row) => (StatusCode::OK, Json(dto::product_row_to_json(&row))).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "product_not_found", "product not found"),
    }
}
