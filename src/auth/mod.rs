// Authentication module
// JWT-based authentication with sign-up, sign-in, stateless sign-out and
// role-based authorization

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{sign_in_handler, sign_out_handler, sign_up_handler};
pub use middleware::{require_auth, AuthenticatedUser, RequireRole};
pub use models::{AuthResponse, MessageResponse, Role, SignInRequest, SignUpRequest, User, UserResponse};
pub use repository::UserRepository;
pub use service::AuthService;
pub use token::TokenService;
