//! HTTP server for `RecipeBox`.

pub mod auth_routes;
pub mod error;
pub mod health;
pub mod middleware;
pub mod recipe_routes;

use std::sync::Arc;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post, put};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{JwtManager, SessionCookie};
use crate::config::ServerConfig;
use crate::storage::RecipeDatabase;

pub use error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: RecipeDatabase,
    pub jwt: Arc<JwtManager>,
    pub cookies: SessionCookie,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: RecipeDatabase, config: ServerConfig) -> Self {
        let jwt = JwtManager::with_ttls(
            config.access_secret.as_bytes(),
            config.refresh_secret.as_bytes(),
            config.access_ttl_secs,
            config.refresh_ttl_secs,
        );
        let cookies = SessionCookie::new(config.secure_cookies, config.refresh_ttl_secs);
        Self {
            db,
            jwt: Arc::new(jwt),
            cookies,
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/recipes", post(recipe_routes::create_recipe))
        .route(
            "/recipes/{id}",
            put(recipe_routes::update_recipe).delete(recipe_routes::delete_recipe),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_access_token,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/register", post(auth_routes::register))
        .route("/login", post(auth_routes::login))
        .route("/refresh", get(auth_routes::refresh))
        .route("/logout", post(auth_routes::logout))
        .route("/recipes/names", get(recipe_routes::list_names))
        .route("/recipes/search", get(recipe_routes::search))
        .route("/recipes/{id}", get(recipe_routes::get_recipe))
        .route("/recipes/{id}/download", get(recipe_routes::download))
        .merge(protected)
        .layer(cors_layer(Arc::clone(&state.config)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: Arc<ServerConfig>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .is_ok_and(|origin| config.origin_allowed(origin))
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}
