//! JSON wire types shared by the server and its clients.
//!
//! Field names follow the browser-facing API (`camelCase`). Every response
//! body carries `success` and a human-readable `message`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::recipe_text::RecipeFields;

/// Name of the HTTP-only cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "jwt";

/// Role name to numeric level, e.g. `{"User": 2000}`.
pub type Roles = BTreeMap<String, i64>;

/// Role mapping assigned at registration.
pub fn default_roles() -> Roles {
    Roles::from([("User".to_string(), 2000)])
}

/// Body of `POST /register` and `POST /login`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields present (username ignoring surrounding whitespace).
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Public identity of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
}

/// Response of `POST /register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user: UserSummary,
}

/// Response of `POST /login` and `GET /refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
    pub username: String,
    pub roles: Roles,
}

/// Generic `{success, data?, message}` envelope used by recipe endpoints
/// and by every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub message: String,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
        }
    }
}

impl Envelope<()> {
    pub fn message(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            data: None,
            message: message.into(),
        }
    }
}

/// A stored recipe as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub ingredients: String,
    pub instructions: String,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl Recipe {
    pub fn fields(&self) -> RecipeFields {
        RecipeFields {
            name: self.name.clone(),
            ingredients: self.ingredients.clone(),
            instructions: self.instructions.clone(),
        }
    }
}

/// `{id, name}` projection used by the name index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeName {
    pub id: String,
    pub name: String,
}

/// Body of `POST /recipes` and `PUT /recipes/{id}`.
///
/// Missing fields deserialize as empty strings so the server can answer
/// with a validation error instead of a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ingredients: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl From<RecipeFields> for RecipePayload {
    fn from(fields: RecipeFields) -> Self {
        Self {
            name: fields.name,
            ingredients: fields.ingredients,
            instructions: fields.instructions,
            created_by: None,
        }
    }
}
