// HTTP handlers for authentication endpoints

use axum::{extract::State, http::StatusCode};
use tracing::debug;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{AuthResponse, MessageResponse, SignInRequest, SignUpRequest},
};
use crate::extract::Json;
use crate::AppState;

/// Handler for POST /api/auth/sign-up
/// Creates a user account and returns a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already exists"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "auth"
)]
pub async fn sign_up_handler(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    debug!("Sign-up attempt");
    request.validate()?;

    let response = state.auth.sign_up(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for POST /api/auth/sign-in
/// Authenticates a user and returns a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Invalid email or password"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "auth"
)]
pub async fn sign_in_handler(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    debug!("Sign-in attempt");
    request.validate()?;

    let response = state.auth.sign_in(request).await?;
    Ok(Json(response))
}

/// Handler for POST /api/auth/sign-out
///
/// Tokens are stateless, so sign-out mutates nothing server-side: the
/// response instructs the client to discard its bearer token, and the token
/// dies on its own at expiry.
#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    responses(
        (status = 200, description = "Signed out", body = MessageResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_token" = [])),
    tag = "auth"
)]
pub async fn sign_out_handler(user: AuthenticatedUser) -> Json<MessageResponse> {
    debug!("User {} signed out", user.user_id);
    Json(MessageResponse {
        message: "Signed out. Discard the access token on the client.".to_string(),
    })
}
