// User management module
// CRUD endpoints over the users resource; record ownership lives with the
// credential store in the auth module

pub mod handlers;
pub mod models;

pub use handlers::{delete_user_handler, get_user_handler, list_users_handler, update_user_handler};
pub use models::UpdateUserRequest;
