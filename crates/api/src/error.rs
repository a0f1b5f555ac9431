//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CheckoutError, RESERVATION_RETRY_MESSAGE, ServiceError, StatusError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid bearer token on a gated route.
    AuthRequired,
    /// Signed in, but not allowed here.
    Forbidden(String),
    /// Bad request from the client.
    BadRequest(String),
    Checkout(CheckoutError),
    Status(StatusError),
    Service(ServiceError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::AuthRequired => (
                StatusCode::UNAUTHORIZED,
                "auth_required",
                "Sign in to continue".to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Checkout(err) => checkout_error_parts(err),
            ApiError::Status(err) => status_error_parts(err),
            ApiError::Service(err) => service_error_parts(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();
        metrics::counter!("api_errors_total", "kind" => kind).increment(1);
        if status.is_server_error() {
            tracing::error!(error = ?self, kind, "request failed");
        }

        let body = serde_json::json!({ "error": message, "kind": kind });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_parts(err: &CheckoutError) -> (StatusCode, &'static str, String) {
    let status = match err {
        CheckoutError::AuthRequired => StatusCode::UNAUTHORIZED,
        CheckoutError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CheckoutError::CheckoutInProgress | CheckoutError::StockUnavailable { .. } => {
            StatusCode::CONFLICT
        }
        CheckoutError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        CheckoutError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        CheckoutError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let message = match err {
        CheckoutError::Transient(_) => RESERVATION_RETRY_MESSAGE.to_string(),
        other => other.to_string(),
    };
    (status, err.kind(), message)
}

fn status_error_parts(err: &StatusError) -> (StatusCode, &'static str, String) {
    let (status, kind) = match err {
        StatusError::OrderNotFound(_) => (StatusCode::NOT_FOUND, "order_not_found"),
        StatusError::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
        StatusError::EmptyTrackingNumber => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
        StatusError::StatusConflict { .. } => (StatusCode::CONFLICT, "status_conflict"),
        StatusError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "permission_denied"),
        StatusError::Transient(_) => (StatusCode::SERVICE_UNAVAILABLE, "transient"),
    };
    (status, kind, err.to_string())
}

fn service_error_parts(err: &ServiceError) -> (StatusCode, &'static str, String) {
    let (status, kind) = match err {
        ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        ServiceError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
        ServiceError::AdminProtected(_) => (StatusCode::FORBIDDEN, "admin_protected"),
        ServiceError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "permission_denied"),
        ServiceError::Transient(_) => (StatusCode::SERVICE_UNAVAILABLE, "transient"),
    };
    (status, kind, err.to_string())
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<StatusError> for ApiError {
    fn from(err: StatusError) -> Self {
        ApiError::Status(err)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}
