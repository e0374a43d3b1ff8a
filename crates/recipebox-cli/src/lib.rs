//! `RecipeBox` CLI Library
//!
//! Command-line shell around the client controllers in `recipebox-core`:
//! persists the session between invocations, performs the HTTP calls the
//! controllers ask for, and prints their notices.

pub mod api_client;
pub mod driver;
pub mod session;
