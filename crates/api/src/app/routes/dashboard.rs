use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::{Datelike, Utc};

use depot_inventory::StockStatus;

use crate::app::dto;
use crate::app::services::AppServices;

/// Overview payload: headline stats, low-stock alerts, and the product table.
pub async fn overview(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let products = services.product_rows();

    let low_stock: Vec<_> = products
        .iter()
        .filter(|row| row.status() != StockStatus::Normal)
        .collect();

    let today = Utc::now().date_naive();
    let counts = services.monthly_counts(today.year(), today.month());

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "stats": {
                "total_products": products.len(),
                "low_stock": low_stock.len(),
                "inbound_this_month": counts.inbound,
                "outbound_this_month": counts.outbound,
            },
            "alerts": low_stock
                .iter()
                .map(|row| dto::product_row_to_json(row))
                .collect::<Vec<_>>(),
            "products": products
                .iter()
                .map(dto::product_row_to_json)
                .collect::<Vec<_>>(),
        })),
    )
        .into_response()
}
