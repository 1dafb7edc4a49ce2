// Authentication service - business logic layer

use crate::auth::{
    error::AuthError,
    models::{AuthResponse, SignInRequest, SignUpRequest},
    password::PasswordService,
    repository::UserRepository,
    token::TokenService,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Authentication service coordinating sign-up and sign-in.
///
/// Sign-out is stateless (tokens are not stored server-side) and handled
/// entirely at the HTTP layer.
pub struct AuthService {
    users: UserRepository,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(users: UserRepository, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Register a new user: check email not taken, hash the password,
    /// persist, issue a token. Email is normalized to lowercase before any
    /// store access.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<AuthResponse, AuthError> {
        let email = request.email.trim().to_lowercase();

        if self.users.email_exists(&email).await? {
            debug!("Sign-up rejected, email already registered");
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = PasswordService::hash_password(&request.password)?;
        let role = request.role.unwrap_or_default();

        // The insert re-checks uniqueness via the database constraint, so a
        // concurrent sign-up with the same email still maps to a conflict.
        let user = self.users.create_user(&email, &password_hash, role).await?;

        let token = self
            .tokens
            .generate_access_token(user.id, &user.email, user.role)?;

        info!("User {} signed up with role {}", user.id, user.role);
        Ok(AuthResponse::new(token, user.into()))
    }

    /// Authenticate an existing user.
    ///
    /// An unknown email and a wrong password both surface as
    /// `InvalidCredentials` so callers cannot probe which emails exist.
    pub async fn sign_in(&self, request: SignInRequest) -> Result<AuthResponse, AuthError> {
        let email = request.email.trim().to_lowercase();

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !PasswordService::verify_password(&request.password, &user.password_hash) {
            debug!("Sign-in rejected for user {}, wrong password", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .tokens
            .generate_access_token(user.id, &user.email, user.role)?;

        info!("User {} signed in", user.id);
        Ok(AuthResponse::new(token, user.into()))
    }
}
