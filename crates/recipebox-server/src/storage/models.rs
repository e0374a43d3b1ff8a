//! Data models for `RecipeBox` storage.

use recipebox_core::api::{self, Roles};
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    /// JSON object of role name to level.
    pub roles: String,
    /// SHA-256 of the live refresh token, if any.
    pub refresh_token: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Decode the stored role mapping. A corrupt column yields no roles.
    pub fn role_map(&self) -> Roles {
        serde_json::from_str(&self.roles).unwrap_or_default()
    }

    pub fn summary(&self) -> api::UserSummary {
        api::UserSummary {
            id: self.id.clone(),
            username: self.username.clone(),
        }
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("roles", &self.roles)
            .field("has_session", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub ingredients: String,
    pub instructions: String,
    pub created_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Recipe> for api::Recipe {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            name: r.name,
            ingredients: r.ingredients,
            instructions: r.instructions,
            created_by: r.created_by,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecipeName {
    pub id: String,
    pub name: String,
}

impl From<RecipeName> for api::RecipeName {
    fn from(r: RecipeName) -> Self {
        Self {
            id: r.id,
            name: r.name,
        }
    }
}
