// User management DTOs

use crate::auth::models::Role;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Update request for PUT /api/users/{id}
///
/// All fields optional to support partial updates. A new password goes
/// through the same strength policy as sign-up; `role` is the closed enum,
/// so unknown roles fail at deserialization.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(email(message = "must be a valid email address"))]
    #[schema(example = "new@x.com")]
    pub email: Option<String>,
    #[validate(custom = "crate::validation::validate_password_strength")]
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.role.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn partial_updates_deserialize() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"email": "new@x.com"}"#).unwrap();
        assert_eq!(req.email.as_deref(), Some("new@x.com"));
        assert!(req.password.is_none());
        assert!(req.role.is_none());
        assert!(!req.is_empty());

        let req: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(req.is_empty());
    }

    #[test]
    fn optional_fields_still_validate_when_present() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"email": "not-an-email"}"#).unwrap();
        assert!(req.validate().is_err());

        let req: UpdateUserRequest = serde_json::from_str(r#"{"password": "weak"}"#).unwrap();
        assert!(req.validate().is_err());

        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"email": "new@x.com", "password": "passw0rd"}"#).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn unknown_role_rejected() {
        let result: Result<UpdateUserRequest, _> =
            serde_json::from_str(r#"{"role": "owner"}"#);
        assert!(result.is_err());
    }
}
