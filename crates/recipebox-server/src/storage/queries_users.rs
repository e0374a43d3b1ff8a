//! User and refresh-session queries.

use recipebox_core::api::Roles;
use recipebox_core::db::{DatabaseError, unix_timestamp};

use super::db::RecipeDatabase;
use super::models::User;

impl RecipeDatabase {
    /// Create a new user. A taken username surfaces as `DatabaseError::Duplicate`.
    pub async fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        roles: &Roles,
    ) -> Result<User, DatabaseError> {
        let now = unix_timestamp();
        let roles =
            serde_json::to_string(roles).map_err(|e| DatabaseError::Query(e.to_string()))?;

        sqlx::query(
            "INSERT INTO users (id, username, password_hash, roles, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(username)
        .bind(password_hash)
        .bind(roles)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_user(id).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    /// Get a user by username.
    pub async fn get_user_by_username(&self, username: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User with username {username}")))
    }

    /// Find the user whose live session matches this refresh token hash.
    pub async fn get_user_by_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE refresh_token = ?")
            .bind(token_hash)
            .fetch_optional(self.pool())
            .await?;

        Ok(user)
    }

    /// Replace (or clear, with `None`) the user's refresh session.
    ///
    /// Single-row write: concurrent logins for one user race to last-write-wins.
    pub async fn set_refresh_token(
        &self,
        user_id: &str,
        token_hash: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query("UPDATE users SET refresh_token = ?, updated_at = ? WHERE id = ?")
            .bind(token_hash)
            .bind(now)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {user_id}")));
        }
        Ok(())
    }
}
