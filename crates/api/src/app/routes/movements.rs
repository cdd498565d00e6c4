use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use depot_infra::projections::MovementDirection;

use crate::app::routes::RECENT_MOVEMENTS_LIMIT;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn inbound_router() -> Router {
    Router::new().route("/", get(inbound_view).post(register_inbound))
}

pub fn outbound_router() -> Router {
    Router::new().route("/", get(outbound_view).post(register_outbound))
}

/// View payload for the stock-in screen: product and supplier selectors plus
/// the recent entries table.
pub async fn inbound_view(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let products = services
        .product_rows()
        .iter()
        .map(dto::product_row_to_json)
        .collect::<Vec<_>>();
    let suppliers = services
        .supplier_rows()
        .iter()
        .map(dto::supplier_row_to_json)
        .collect::<Vec<_>>();
    let entries = services
        .recent_movements(Some(MovementDirection::Inbound), RECENT_MOVEMENTS_LIMIT)
        .iter()
        .map(dto::movement_row_to_json)
        .collect::<Vec<_>>();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "products": products,
            "suppliers": suppliers,
            "entries": entries,
        })),
    )
        .into_response()
}

pub async fn register_inbound(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::InboundMovementRequest>,
) -> axum::response::Response {
    let (draft, idempotency_key) = body.into_draft();

    match services.submit_inbound(draft, idempotency_key) {
        Ok(receipt) => (StatusCode::CREATED, Json(dto::receipt_to_json(&receipt))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

/// View payload for the stock-out screen: product selector (with stock and
/// suggested prices) plus the recent exits table.
pub async fn outbound_view(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let products = services
        .product_rows()
        .iter()
        .map(dto::product_row_to_json)
        .collect::<Vec<_>>();
    let exits = services
        .recent_movements(Some(MovementDirection::Outbound), RECENT_MOVEMENTS_LIMIT)
        .iter()
        .map(dto::movement_row_to_json)
        .collect::<Vec<_>>();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "products": products,
            "exits": exits,
        })),
    )
        .into_response()
}

pub async fn register_outbound(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::OutboundMovementRequest>,
) -> axum::response::Response {
    let (draft, idempotency_key) = body.into_draft();

    match services.submit_outbound(draft, idempotency_key) {
        Ok(receipt) => (StatusCode::CREATED, Json(dto::receipt_to_json(&receipt))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
