//! `RecipeBox` Core Library
//!
//! Shared functionality for `RecipeBox` components:
//! - Recipe text block codec (parse and render)
//! - JSON wire types exchanged between server and clients
//! - Client controllers as a pure state reducer
//! - `SQLite` helpers and tracing initialisation

pub mod api;
pub mod client;
pub mod db;
pub mod recipe_text;
pub mod tracing_init;

pub use recipe_text::{RecipeFields, RecipeTextError};
