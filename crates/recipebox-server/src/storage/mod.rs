//! `SQLite` storage for the `RecipeBox` server.
//!
//! Provides persistence for users (with their single refresh session) and
//! recipes.

mod db;
mod models;
mod queries_recipes;
mod queries_users;


pub use db::RecipeDatabase;
pub use models::*;
pub use queries_recipes::RecipeParams;
pub use recipebox_core::db::DatabaseError;
