// Authentication and authorization error types

use crate::auth::models::Role;
use crate::error::{field_errors, ErrorResponse};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;
use tracing::{error, warn};

/// Authentication and authorization error types
#[derive(Debug)]
pub enum AuthError {
    // Authentication errors
    ValidationError(validator::ValidationErrors),
    /// Wrong password or unknown email; deliberately indistinguishable
    InvalidCredentials,
    /// Token signature does not match the signing key
    InvalidSignature,
    /// Token is past its expiry
    ExpiredToken,
    /// Token could not be parsed at all
    MalformedToken,
    /// No bearer token on the request
    MissingToken,
    EmailAlreadyExists,
    DatabaseError(String),
    PasswordHashError,
    TokenGenerationError(String),

    // Authorization errors
    /// Caller lacks a required role for the operation
    InsufficientPermissions { required: Vec<Role>, actual: Role },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::ValidationError(errors) => write!(f, "Validation error: {}", errors),
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::InvalidSignature => write!(f, "Invalid token signature"),
            AuthError::ExpiredToken => write!(f, "Token has expired"),
            AuthError::MalformedToken => write!(f, "Malformed token"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::EmailAlreadyExists => write!(f, "Email already exists"),
            AuthError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AuthError::PasswordHashError => write!(f, "Password hashing error"),
            AuthError::TokenGenerationError(msg) => write!(f, "Token generation error: {}", msg),
            AuthError::InsufficientPermissions { required, actual } => {
                let roles: Vec<&str> = required.iter().map(|r| r.as_str()).collect();
                write!(
                    f,
                    "Insufficient permissions: required one of [{}], but user has role '{}'",
                    roles.join(", "),
                    actual
                )
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InvalidSignature => StatusCode::UNAUTHORIZED,
            AuthError::ExpiredToken => StatusCode::UNAUTHORIZED,
            AuthError::MalformedToken => StatusCode::UNAUTHORIZED,
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::EmailAlreadyExists => StatusCode::CONFLICT,
            AuthError::DatabaseError(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::PasswordHashError => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
        }
    }

    /// Get a descriptive error message for this error
    /// This message is safe to send to clients (no sensitive data)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::ValidationError(_) => "Request validation failed".to_string(),
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            AuthError::InvalidSignature => "Invalid token".to_string(),
            AuthError::ExpiredToken => "Token has expired".to_string(),
            AuthError::MalformedToken => "Invalid token".to_string(),
            AuthError::MissingToken => "Missing authentication token".to_string(),
            AuthError::EmailAlreadyExists => "Email already exists".to_string(),
            AuthError::DatabaseError(_) => "Service temporarily unavailable".to_string(),
            AuthError::PasswordHashError => "An internal server error occurred".to_string(),
            AuthError::TokenGenerationError(_) => "An internal server error occurred".to_string(),
            AuthError::InsufficientPermissions { required, .. } => {
                let roles: Vec<&str> = required.iter().map(|r| r.as_str()).collect();
                format!(
                    "Insufficient permissions: required one of [{}]",
                    roles.join(", ")
                )
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Internal detail is logged here; the client only sees the safe
        // message from error_message().
        match &self {
            AuthError::DatabaseError(msg) => error!("Database error in auth: {}", msg),
            AuthError::PasswordHashError => error!("Password hashing error"),
            AuthError::TokenGenerationError(msg) => error!("Token generation error: {}", msg),
            AuthError::InvalidSignature => warn!("Token with invalid signature rejected"),
            AuthError::ExpiredToken => warn!("Expired token rejected"),
            AuthError::MalformedToken => warn!("Malformed token rejected"),
            AuthError::MissingToken => warn!("Request to protected route without token"),
            AuthError::InsufficientPermissions { required, actual } => {
                warn!(
                    "Authorization failed: required {:?}, user has role '{}'",
                    required, actual
                );
            }
            _ => {}
        }

        let details = match &self {
            AuthError::ValidationError(errors) => Some(field_errors(errors)),
            _ => None,
        };

        let body = ErrorResponse {
            error: self.error_message(),
            details,
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::ValidationError(errors)
    }
}

/// Map auth-layer errors into the resource-handler taxonomy, used where the
/// user routes call into the credential store.
impl From<AuthError> for crate::error::ApiError {
    fn from(error: AuthError) -> Self {
        use crate::error::ApiError;
        match error {
            AuthError::ValidationError(errors) => ApiError::ValidationError(errors),
            AuthError::EmailAlreadyExists => ApiError::Conflict {
                message: "Email already exists".to_string(),
            },
            AuthError::DatabaseError(msg) => ApiError::ServiceUnavailable(msg),
            AuthError::InsufficientPermissions { .. } => {
                ApiError::Forbidden(error.error_message())
            }
            AuthError::PasswordHashError | AuthError::TokenGenerationError(_) => {
                ApiError::InternalError(error.to_string())
            }
            other => ApiError::Unauthorized(other.error_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_all_map_to_unauthorized() {
        for err in [
            AuthError::InvalidSignature,
            AuthError::ExpiredToken,
            AuthError::MalformedToken,
            AuthError::MissingToken,
            AuthError::InvalidCredentials,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn conflict_and_forbidden_mappings() {
        assert_eq!(
            AuthError::EmailAlreadyExists.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::InsufficientPermissions {
                required: vec![Role::Admin],
                actual: Role::User,
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn store_failures_map_to_service_unavailable() {
        assert_eq!(
            AuthError::DatabaseError("pool timed out".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn invalid_credentials_message_does_not_leak_cause() {
        // Same public message whether the email was unknown or the
        // password was wrong.
        assert_eq!(
            AuthError::InvalidCredentials.error_message(),
            "Invalid email or password"
        );
    }

    #[test]
    fn internal_messages_are_not_exposed() {
        let err = AuthError::DatabaseError("password_hash column corrupt".into());
        assert!(!err.error_message().contains("password_hash"));
    }
}
