//! `RecipeBox` Server Library
//!
//! Core functionality for the `RecipeBox` backend:
//! - `SQLite` storage for users and recipes
//! - Password hashing, JWT issuance/verification, refresh-token cookie
//! - HTTP routes for auth and recipe CRUD/search/download
//! - One-page PDF rendering of a recipe

pub mod auth;
pub mod config;
pub mod pdf;
pub mod server;
pub mod storage;
