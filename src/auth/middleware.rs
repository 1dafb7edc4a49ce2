// Authentication middleware and role gate for protected routes

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::{error::AuthError, models::Role, token::TokenService};
use crate::AppState;

/// Authenticated request context, attached to request extensions by
/// `require_auth` and read by downstream extractors and the role gate.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
}

/// Pull the bearer token out of the `Authorization` header.
///
/// The Authorization header is the single documented token delivery
/// mechanism, for issuance (response body instructs Bearer usage) and
/// verification alike.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedToken)
}

/// Verify the request's bearer token against the token service.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    let claims = tokens.verify_access_token(token)?;
    Ok(AuthenticatedUser {
        user_id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}

/// Middleware guarding protected routes.
///
/// Absent token -> 401. Invalid/expired/malformed token -> 401, with no
/// context attached. On success the authenticated identity is inserted into
/// request extensions for the role gate and handlers. Never touches
/// persisted state.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authenticate(request.headers(), &state.tokens).map_err(|e| {
        warn!(
            "Authentication failed for {}: {}",
            request.uri().path(),
            e
        );
        e
    })?;

    debug!(
        "Authenticated user_id={} role={} for {}",
        user.user_id,
        user.role,
        request.uri().path()
    );

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present when require_auth ran; a route wired without the
        // middleware fails closed here.
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Role gate parameterized by the set of roles allowed through.
///
/// Must be layered inside `require_auth`: it reads the authenticated
/// context from request extensions and fails closed (401) when that context
/// is missing, which would indicate a miswired route.
#[derive(Debug, Clone)]
pub struct RequireRole {
    allowed: &'static [Role],
}

impl RequireRole {
    pub fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    /// Gate that only admins pass
    pub fn admin() -> Self {
        Self::new(&[Role::Admin])
    }

    /// Pure access decision, separated from the axum plumbing
    pub fn check(&self, context: Option<&AuthenticatedUser>) -> Result<(), AuthError> {
        let user = context.ok_or(AuthError::MissingToken)?;
        if self.allowed.contains(&user.role) {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions {
                required: self.allowed.to_vec(),
                actual: user.role,
            })
        }
    }

    /// Middleware function validating role-based access
    pub async fn middleware(
        self,
        request: Request<Body>,
        next: Next,
    ) -> Result<Response, AuthError> {
        let endpoint = request.uri().path().to_string();

        match self.check(request.extensions().get::<AuthenticatedUser>()) {
            Ok(()) => {
                debug!("Authorization successful for {}", endpoint);
                Ok(next.run(request).await)
            }
            Err(e) => {
                warn!("Authorization failed for {}: {}", endpoint, e);
                Err(e)
            }
        }
    }
}
