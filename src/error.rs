// Error handling module for the Users API
// Provides centralized error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{debug, error, warn};

/// Main error type for the API
/// All resource handlers should return Result<T, ApiError>
///
/// Each variant maps to a specific HTTP status code and the stable error
/// response format.
#[derive(Debug)]
pub enum ApiError {
    /// Validation errors from request validation
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// Request body failed to deserialize (invalid JSON, wrong field types,
    /// unknown enum values)
    /// Maps to HTTP 400 Bad Request
    MalformedBody(String),

    /// Resource not found by ID
    /// Maps to HTTP 404 Not Found
    NotFound { resource: String, id: String },

    /// Duplicate resource conflict
    /// Maps to HTTP 409 Conflict
    Conflict { message: String },

    /// Authentication failures
    /// Maps to HTTP 401 Unauthorized
    Unauthorized(String),

    /// Authorization failures
    /// Maps to HTTP 403 Forbidden
    Forbidden(String),

    /// Rate budget exceeded
    /// Maps to HTTP 429 Too Many Requests
    TooManyRequests,

    /// Database or external policy engine unreachable
    /// Maps to HTTP 503 Service Unavailable
    /// Sensitive details are filtered from client responses
    ServiceUnavailable(String),

    /// Internal server errors
    /// Maps to HTTP 500 Internal Server Error
    /// Sensitive details are filtered from client responses
    InternalError(String),
}

/// Stable error response body: `{"error": ..., "details"?: [...]}`
///
/// `details` carries field-level validation errors and is omitted from the
/// JSON for every other error kind.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// A single field-level validation failure
#[derive(Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Flatten `validator::ValidationErrors` into field/message pairs
pub fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut details: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value for {}", field)),
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    /// Convert ApiError to HTTP status code and ErrorResponse
    ///
    /// Logging levels follow error severity:
    /// - error!: for 5xx-class faults
    /// - warn!: for security-relevant client errors
    /// - debug!: for expected client errors (validation, not found)
    ///
    /// Sensitive data never reaches the client response.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Request validation failed".to_string(),
                        details: Some(field_errors(errors)),
                    },
                )
            }
            ApiError::MalformedBody(detail) => {
                debug!("Malformed request body: {}", detail);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: format!("Malformed request body: {}", detail),
                        details: None,
                    },
                )
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        error: format!("{} with id {} not found", resource, id),
                        details: None,
                    },
                )
            }
            ApiError::Conflict { message } => {
                warn!("Conflict error: {}", message);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: message.clone(),
                        details: None,
                    },
                )
            }
            ApiError::Unauthorized(message) => {
                warn!("Unauthorized access attempt: {}", message);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: message.clone(),
                        details: None,
                    },
                )
            }
            ApiError::Forbidden(message) => {
                warn!("Forbidden access attempt: {}", message);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse {
                        error: message.clone(),
                        details: None,
                    },
                )
            }
            ApiError::TooManyRequests => {
                debug!("Rate budget exceeded");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    ErrorResponse {
                        error: "Too many requests".to_string(),
                        details: None,
                    },
                )
            }
            ApiError::ServiceUnavailable(internal_msg) => {
                error!("Backing service unavailable: {}", internal_msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse {
                        error: "Service temporarily unavailable".to_string(),
                        details: None,
                    },
                )
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "An internal server error occurred".to_string(),
                        details: None,
                    },
                )
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert sqlx errors to ApiError
///
/// The store being unreachable or failing is a 503 for the caller; the
/// underlying detail stays in the server log only.
impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::ServiceUnavailable(error.to_string())
    }
}

/// Convert validator errors to ApiError
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}
