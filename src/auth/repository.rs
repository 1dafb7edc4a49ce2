// Credential store adapter: the only component that touches the users table

use crate::auth::{
    error::AuthError,
    models::{Role, User},
};
use sqlx::PgPool;

/// User repository for database operations.
///
/// Single-row reads and writes only; uniqueness of email is enforced by the
/// database constraint, not by application-level locking.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user. A unique-constraint violation on email maps to
    /// `EmailAlreadyExists` so concurrent sign-ups race safely.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, $3) \
             RETURNING id, email, password_hash, role, created_at",
        )
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::EmailAlreadyExists;
                }
            }
            AuthError::DatabaseError(e.to_string())
        })?;

        Ok(user)
    }

    /// Find a user by email (case-insensitive)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, role, created_at FROM users \
             WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(user)
    }

    /// Check if an email exists
    pub async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(exists.0)
    }

    /// List all users ordered by id
    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, role, created_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(users)
    }

    /// Update a user, keeping existing values for omitted fields.
    ///
    /// Runs in a transaction so the existence check, duplicate-email check
    /// and write are atomic. Returns None when the id does not exist.
    pub async fn update_user(
        &self,
        id: i32,
        email: Option<String>,
        password_hash: Option<String>,
        role: Option<Role>,
    ) -> Result<Option<User>, AuthError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let existing = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let existing = match existing {
            Some(user) => user,
            None => return Ok(None),
        };

        if let Some(ref new_email) = email {
            if !new_email.eq_ignore_ascii_case(&existing.email) {
                let taken: (bool,) = sqlx::query_as(
                    "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND id != $2)",
                )
                .bind(new_email)
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

                if taken.0 {
                    // Dropping tx rolls back.
                    return Err(AuthError::EmailAlreadyExists);
                }
            }
        }

        let updated = sqlx::query_as::<_, User>(
            "UPDATE users SET email = $1, password_hash = $2, role = $3 WHERE id = $4 \
             RETURNING id, email, password_hash, role, created_at",
        )
        .bind(email.unwrap_or(existing.email))
        .bind(password_hash.unwrap_or(existing.password_hash))
        .bind(role.unwrap_or(existing.role))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(Some(updated))
    }

    /// Delete a user; returns false when the id does not exist
    pub async fn delete_user(&self, id: i32) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
