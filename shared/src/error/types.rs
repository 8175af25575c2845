//! Error types and API response structures

use super::codes::ErrorCode;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the error type every HTTP handler ends in:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details (upstream bodies, offending fields)
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create an unauthorized error for admin-only endpoints
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::AdminKeyInvalid)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Create a key-value store error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::CacheError, msg)
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    /// Create an upstream (marketplace) error
    pub fn upstream(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::with_message(code, msg)
    }
}

/// Unified API response structure
///
/// Every response carries an `ok` flag. Success payloads are flattened next
/// to it, so `ApiResponse::success(Stats { .. })` renders as
/// `{"ok":true,"stats":{..}}`. Failures carry `error`, the numeric `code`
/// and optional `details`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub ok: bool,
    /// Error code (absent on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// Human-readable error message (absent on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
    /// Response payload, flattened beside `ok`
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            code: None,
            error: None,
            details: None,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Create a success response without data
    pub fn ok() -> Self {
        Self {
            ok: true,
            code: None,
            error: None,
            details: None,
            data: None,
        }
    }

    /// Create an error response from an AppError
    pub fn error(err: &AppError) -> Self {
        Self {
            ok: false,
            code: Some(err.code.code()),
            error: Some(err.message.clone()),
            details: err.details.clone(),
            data: None,
        }
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(err: AppError) -> Self {
        Self {
            ok: false,
            code: Some(err.code.code()),
            error: Some(err.message),
            details: err.details,
            data: None,
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();
        let body = ApiResponse::<()>::error(&self);

        // Log system errors
        if matches!(self.code.category(), super::category::ErrorCategory::System) {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                "System error occurred"
            );
        }

        (status, Json(body)).into_response()
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = match self.code {
            None => StatusCode::OK,
            Some(code) => ErrorCode::try_from(code)
                .map(|c| c.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        };

        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Stats {
        total: u32,
    }

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::CredentialMissing);
        assert_eq!(err.code, ErrorCode::CredentialMissing);
        assert_eq!(err.message, "No token saved");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::upstream(ErrorCode::CodeExchangeFailed, "Token exchange failed")
            .with_detail("status", 400)
            .with_detail("body", json!({"error": "invalid_grant"}));

        let details = err.details.unwrap();
        assert_eq!(details.get("status").unwrap(), 400);
        assert_eq!(details["body"]["error"], "invalid_grant");
    }

    #[test]
    fn test_app_error_http_status() {
        assert_eq!(
            AppError::new(ErrorCode::CredentialMissing).http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::unauthorized().http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::new(ErrorCode::CredentialRefreshFailed).http_status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_app_error_convenience_constructors() {
        let err = AppError::not_found("Seller");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Seller not found");
        assert!(err.details.as_ref().unwrap().contains_key("resource"));

        assert_eq!(AppError::validation("bad").code, ErrorCode::ValidationFailed);
        assert_eq!(AppError::database("down").code, ErrorCode::DatabaseError);
        assert_eq!(AppError::cache("down").code, ErrorCode::CacheError);
        assert_eq!(AppError::internal("boom").code, ErrorCode::InternalError);
        assert_eq!(
            AppError::invalid_request("no").code,
            ErrorCode::InvalidRequest
        );
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::with_message(ErrorCode::InvalidDateRange, "from after to");
        assert_eq!(format!("{}", err), "from after to");
    }

    #[test]
    fn test_success_flattens_payload() {
        let body = serde_json::to_value(ApiResponse::success(Stats { total: 3 })).unwrap();
        assert_eq!(body, json!({"ok": true, "total": 3}));
    }

    #[test]
    fn test_ok_without_payload() {
        let body = serde_json::to_value(ApiResponse::<()>::ok()).unwrap();
        assert_eq!(body, json!({"ok": true}));
    }

    #[test]
    fn test_error_envelope() {
        let err = AppError::new(ErrorCode::CredentialMissing);
        let body = serde_json::to_value(ApiResponse::<()>::error(&err)).unwrap();
        assert_eq!(
            body,
            json!({"ok": false, "code": 2001, "error": "No token saved"})
        );
    }

    #[test]
    fn test_from_error_drops_payload() {
        let response: ApiResponse<Stats> = AppError::internal("boom").into();
        assert!(!response.ok);
        assert_eq!(response.code, Some(9001));
        assert!(response.data.is_none());
    }
}
