// HTTP handlers for user CRUD endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{debug, info};
use validator::Validate;

use crate::auth::{
    middleware::AuthenticatedUser,
    models::{Role, UserResponse},
    password::PasswordService,
};
use crate::error::ApiError;
use crate::extract::Json;
use crate::users::models::UpdateUserRequest;
use crate::AppState;

/// Handler for GET /api/users
/// Lists all users (any authenticated caller)
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>),
        (status = 401, description = "Missing or invalid token"),
        (status = 503, description = "Store unavailable")
    ),
    security(("bearer_token" = [])),
    tag = "users"
)]
pub async fn list_users_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    debug!("Listing users");

    let users = state.users.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Handler for GET /api/users/{id}
/// Fetches one user by id (any authenticated caller)
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_token" = [])),
    tag = "users"
)]
pub async fn get_user_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!("Fetching user with id: {}", id);

    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        })?;

    Ok(Json(user.into()))
}

/// Handler for PUT /api/users/{id}
///
/// Callers may update their own record; admins may update any record and
/// are the only role allowed to change `role`.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not the record owner or an admin"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already taken")
    ),
    security(("bearer_token" = [])),
    tag = "users"
)]
pub async fn update_user_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!("Updating user with id: {}", id);
    request.validate()?;

    if request.is_empty() {
        let mut errors = validator::ValidationErrors::new();
        let mut empty = validator::ValidationError::new("empty_update");
        empty.message = Some("provide at least one of email, password or role".into());
        errors.add("body", empty);
        return Err(ApiError::ValidationError(errors));
    }

    if caller.role != Role::Admin {
        if caller.user_id != id {
            return Err(ApiError::Forbidden(
                "You may only update your own account".to_string(),
            ));
        }
        if request.role.is_some() {
            return Err(ApiError::Forbidden(
                "Only admins may change roles".to_string(),
            ));
        }
    }

    let email = request.email.map(|e| e.trim().to_lowercase());
    let password_hash = match request.password {
        Some(password) => Some(PasswordService::hash_password(&password).map_err(ApiError::from)?),
        None => None,
    };

    let updated = state
        .users
        .update_user(id, email, password_hash, request.role)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        })?;

    info!("User {} updated by caller {}", id, caller.user_id);
    Ok(Json(updated.into()))
}

/// Handler for DELETE /api/users/{id}
/// Admin-only; enforced by the role gate layered on this route
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_token" = [])),
    tag = "users"
)]
pub async fn delete_user_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    debug!("Deleting user with id: {}", id);

    let deleted = state.users.delete_user(id).await?;
    if !deleted {
        return Err(ApiError::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        });
    }

    info!("User {} deleted by admin {}", id, caller.user_id);
    Ok(StatusCode::NO_CONTENT)
}
