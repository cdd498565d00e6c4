use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use depot_core::DomainError;
use depot_infra::command_dispatcher::DispatchError;

/// Map a dispatch failure to an HTTP response.
///
/// Domain rejections keep their kind-specific code so clients can tell
/// "fix your input" apart from "try again later" (concurrency/store faults).
pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    match err {
        DispatchError::Rejected(domain) => domain_error_to_response(domain),
        DispatchError::Concurrency(msg) => {
            json_error(StatusCode::CONFLICT, "concurrency_conflict", msg)
        }
        DispatchError::Deserialize(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "deserialize_error", msg)
        }
        DispatchError::Store(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            format!("{e:?}"),
        ),
        DispatchError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::ProductNotFound => {
            json_error(StatusCode::NOT_FOUND, "product_not_found", message)
        }
        DomainError::InvalidQuantity(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_quantity", message)
        }
        DomainError::InsufficientStock { available } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": message,
                "available": available,
            })),
        )
            .into_response(),
        DomainError::InvalidDate(_) => json_error(StatusCode::BAD_REQUEST, "invalid_date", message),
        DomainError::InvalidTransactionType(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_transaction_type", message)
        }
        DomainError::InvalidAmount(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_amount", message)
        }
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::Validation(_) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", message)
        }
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
