// JWT token generation and verification service

use crate::auth::error::AuthError;
use crate::auth::models::Role;
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

/// Access token time-to-live: 1 hour.
///
/// Tokens are stateless; natural expiry is the only server-side
/// invalidation mechanism.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// user id
    pub sub: i32,
    pub email: String,
    pub role: Role,
    /// issued at (unix seconds)
    pub iat: i64,
    /// expiry (unix seconds)
    pub exp: i64,
}

/// Token service for JWT operations.
///
/// Holds the process-wide signing secret, loaded once at startup and never
/// rotated at runtime.
pub struct TokenService {
    secret: String,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            ttl_secs: ACCESS_TOKEN_TTL_SECS,
        }
    }

    /// Override the TTL; used by tests that exercise expiry behavior.
    #[cfg(test)]
    pub fn with_ttl(secret: String, ttl_secs: i64) -> Self {
        Self { secret, ttl_secs }
    }

    /// Generate a signed access token embedding the user identity and role
    pub fn generate_access_token(
        &self,
        user_id: i32,
        email: &str,
        role: Role,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// Failure modes are distinguished: `ExpiredToken` past TTL,
    /// `InvalidSignature` on key mismatch, `MalformedToken` for anything
    /// that does not parse as a JWT.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::MalformedToken,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_token_service() -> TokenService {
        TokenService::new("test_secret_key_for_testing_purposes".to_string())
    }

    #[test]
    fn access_token_ttl_is_one_hour() {
        let service = test_token_service();
        let token = service
            .generate_access_token(1, "test@example.com", Role::User)
            .unwrap();
        let claims = service.verify_access_token(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn verify_returns_identity_and_role_just_issued() {
        let service = test_token_service();
        for role in [Role::Admin, Role::User, Role::Guest] {
            let token = service
                .generate_access_token(42, "user@example.com", role)
                .unwrap();
            let claims = service.verify_access_token(&token).unwrap();
            assert_eq!(claims.sub, 42);
            assert_eq!(claims.email, "user@example.com");
            assert_eq!(claims.role, role);
        }
    }

    #[test]
    fn expired_tokens_are_reported_as_expired() {
        // Issue with a TTL far enough in the past to clear the default
        // validation leeway.
        let service = TokenService::with_ttl(
            "test_secret_key_for_testing_purposes".to_string(),
            -500,
        );
        let token = service
            .generate_access_token(1, "test@example.com", Role::User)
            .unwrap();

        let verifier = test_token_service();
        let result = verifier.verify_access_token(&token);
        assert!(matches!(result, Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn wrong_secret_is_reported_as_invalid_signature() {
        let issuer = TokenService::new("secret-one".to_string());
        let verifier = TokenService::new("secret-two".to_string());

        let token = issuer
            .generate_access_token(1, "test@example.com", Role::User)
            .unwrap();

        assert!(issuer.verify_access_token(&token).is_ok());
        let result = verifier.verify_access_token(&token);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn unparseable_tokens_are_reported_as_malformed() {
        let service = test_token_service();
        for garbage in ["", "not.a.token", "invalid_token_format"] {
            let result = service.verify_access_token(garbage);
            assert!(matches!(result, Err(AuthError::MalformedToken)));
        }
    }

    proptest! {
        #[test]
        fn prop_issue_then_verify_round_trips(
            user_id in 1i32..1000000,
            email in "[a-z]{3,10}@[a-z]{3,10}\\.(com|org|net)"
        ) {
            let service = test_token_service();
            let token = service.generate_access_token(user_id, &email, Role::User)?;
            let claims = service.verify_access_token(&token)?;

            prop_assert_eq!(claims.sub, user_id);
            prop_assert_eq!(claims.email, email);
            prop_assert_eq!(claims.role, Role::User);
            prop_assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_SECS);
        }

        #[test]
        fn prop_random_strings_are_rejected(
            malformed in "[a-zA-Z0-9]{10,50}"
        ) {
            let service = test_token_service();
            prop_assert!(service.verify_access_token(&malformed).is_err());
        }
    }
}
