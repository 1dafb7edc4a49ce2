// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use validator::Validate;

/// Caller role for access control decisions.
///
/// Closed set: every role-based branch in the API matches on this enum so
/// the compiler checks the role set exhaustively. Stored in Postgres as the
/// `user_role` enum type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Guest => "guest",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User database model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// User response model (excludes password_hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "a@x.com")]
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Sign-up request DTO
///
/// `role` is optional and defaults to `user`; invalid role strings are
/// rejected at deserialization because the field is typed as the closed
/// `Role` enum.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignUpRequest {
    #[validate(email(message = "must be a valid email address"))]
    #[schema(example = "a@x.com")]
    pub email: String,
    #[validate(custom = "crate::validation::validate_password_strength")]
    #[schema(example = "passw0rd")]
    pub password: String,
    pub role: Option<Role>,
}

/// Sign-in request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignInRequest {
    #[validate(email(message = "must be a valid email address"))]
    #[schema(example = "a@x.com")]
    pub email: String,
    #[validate(custom = "crate::validation::validate_password_present")]
    #[schema(example = "passw0rd")]
    pub password: String,
}

/// Authentication response DTO
///
/// The token is delivered in the response body; callers present it back on
/// the `Authorization: Bearer` header.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: &'static str,
    pub user: UserResponse,
}

impl AuthResponse {
    pub fn new(access_token: String, user: UserResponse) -> Self {
        Self {
            access_token,
            token_type: "Bearer",
            user,
        }
    }
}

/// Simple message response (sign-out, status endpoints)
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn role_round_trips_through_serde() {
        for (role, text) in [
            (Role::Admin, "\"admin\""),
            (Role::User, "\"user\""),
            (Role::Guest, "\"guest\""),
        ] {
            assert_eq!(serde_json::to_string(&role).unwrap(), text);
            let parsed: Role = serde_json::from_str(text).unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn unknown_role_is_rejected_at_deserialization() {
        let result: Result<Role, _> = serde_json::from_str("\"superuser\"");
        assert!(result.is_err());

        let body = r#"{"email": "a@x.com", "password": "passw0rd", "role": "root"}"#;
        let result: Result<SignUpRequest, _> = serde_json::from_str(body);
        assert!(result.is_err());
    }

    #[test]
    fn default_role_is_user() {
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn sign_up_request_validates_email_and_password() {
        let bad_email = SignUpRequest {
            email: "nope".to_string(),
            password: "passw0rd".to_string(),
            role: None,
        };
        assert!(bad_email.validate().is_err());

        let weak_password = SignUpRequest {
            email: "a@x.com".to_string(),
            password: "short".to_string(),
            role: None,
        };
        assert!(weak_password.validate().is_err());

        let valid = SignUpRequest {
            email: "a@x.com".to_string(),
            password: "passw0rd".to_string(),
            role: Some(Role::Admin),
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn user_response_never_carries_password_hash() {
        let user = User {
            id: 7,
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$opaque".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };

        let response = UserResponse::from(user);
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"email\":\"a@x.com\""));
    }
}
