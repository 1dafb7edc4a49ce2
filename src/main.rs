mod auth;
mod config;
mod db;
mod error;
mod extract;
mod rate_limit;
mod users;
mod validation;

use axum::{
    middleware,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{Modify, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use auth::{AuthService, RequireRole, TokenService, UserRepository};
use config::AppConfig;
use rate_limit::{RateLimiterEngine, RedisRateLimiter, RATE_LIMIT_WINDOW_SECS};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        root_handler,
        health_handler,
        api_status_handler,
        auth::handlers::sign_up_handler,
        auth::handlers::sign_in_handler,
        auth::handlers::sign_out_handler,
        users::handlers::list_users_handler,
        users::handlers::get_user_handler,
        users::handlers::update_user_handler,
        users::handlers::delete_user_handler,
    ),
    components(
        schemas(
            auth::models::Role,
            auth::models::UserResponse,
            auth::models::SignUpRequest,
            auth::models::SignInRequest,
            auth::models::AuthResponse,
            auth::models::MessageResponse,
            users::models::UpdateUserRequest,
            StatusResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User management endpoints"),
        (name = "status", description = "Liveness and status endpoints")
    ),
    info(
        title = "Users API",
        version = "0.1.0",
        description = "REST API starter with JWT authentication, role-based authorization and per-role rate limiting"
    )
)]
struct ApiDoc;

/// Registers the bearer token security scheme referenced by the protected
/// endpoint annotations
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_token",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Application state shared across handlers.
///
/// Everything in here is constructed once at startup from `AppConfig` and
/// cloned per request; no global mutable state.
#[derive(Clone)]
pub struct AppState {
    pub users: UserRepository,
    pub auth: Arc<AuthService>,
    pub tokens: Arc<TokenService>,
    pub limiter: Arc<dyn RateLimiterEngine>,
}

/// Liveness/status response body
#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "users-api")]
    pub service: &'static str,
    #[schema(example = "ok")]
    pub status: &'static str,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
}

impl StatusResponse {
    fn ok() -> Self {
        Self {
            service: "users-api",
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Handler for GET /
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service status", body = StatusResponse)),
    tag = "status"
)]
async fn root_handler() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

/// Handler for GET /health
/// Pure liveness check; does not touch backing services
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is live", body = StatusResponse)),
    tag = "status"
)]
async fn health_handler() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

/// Handler for GET /api
#[utoipa::path(
    get,
    path = "/api",
    responses((status = 200, description = "API status", body = StatusResponse)),
    tag = "status"
)]
async fn api_status_handler() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

/// Creates and configures the application router.
///
/// Pipeline, outermost first: CORS -> rate limiter -> (protected routes)
/// auth middleware -> role gate -> handlers.
pub fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin_gate = RequireRole::admin();

    // Every route in this group runs behind require_auth; the delete route
    // additionally passes the admin role gate.
    let protected = Router::new()
        .route("/api/auth/sign-out", post(auth::sign_out_handler))
        .route("/api/users", get(users::list_users_handler))
        .route(
            "/api/users/:id",
            get(users::get_user_handler).put(users::update_user_handler),
        )
        .route(
            "/api/users/:id",
            delete(users::delete_user_handler).route_layer(middleware::from_fn(
                move |request, next| admin_gate.clone().middleware(request, next),
            )),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Status routes
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api", get(api_status_handler))
        // Public auth routes (rate-limited as guest)
        .route("/api/auth/sign-up", post(auth::sign_up_handler))
        .route("/api/auth/sign-in", post(auth::sign_in_handler))
        .merge(protected)
        // Rate limiting runs before authentication for every route
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit,
        ))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing; RUST_LOG controls verbosity
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    tracing::info!("Users API - Starting...");

    // All required configuration is checked here; a missing value aborts
    // startup instead of failing mid-request.
    let config = AppConfig::from_env().expect("Invalid configuration");
    tracing::info!("Running in {} mode", config.environment.as_str());

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    tracing::info!("Connecting to rate limiter backend...");
    let limiter = RedisRateLimiter::new(
        &config.redis_url,
        RATE_LIMIT_WINDOW_SECS,
        "ratelimit".to_string(),
    )
    .await
    .expect("Failed to connect to rate limiter backend");

    let tokens = Arc::new(TokenService::new(config.jwt_secret.clone()));
    let users = UserRepository::new(db_pool);
    let auth_service = Arc::new(AuthService::new(users.clone(), tokens.clone()));

    let state = AppState {
        users,
        auth: auth_service,
        tokens,
        limiter: Arc::new(limiter),
    };

    let app = create_router(state);

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Users API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}

#[cfg(test)]
mod tests;
