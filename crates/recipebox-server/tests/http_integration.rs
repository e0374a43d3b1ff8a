#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use recipebox_core::api::default_roles;
use recipebox_server::auth::JwtManager;
use recipebox_server::config::ServerConfig;
use recipebox_server::server::{AppState, build_router};
use recipebox_server::storage::RecipeDatabase;

const ACCESS_SECRET: &str = "test-access-secret";
const REFRESH_SECRET: &str = "test-refresh-secret";

async fn app() -> Router {
    app_with_db().await.0
}

async fn app_with_db() -> (Router, RecipeDatabase) {
    let db = RecipeDatabase::open_in_memory().await.unwrap();
    let config = ServerConfig::new(
        ACCESS_SECRET,
        REFRESH_SECRET,
        &ServerConfig::default_origin_patterns(),
    )
    .unwrap();
    (build_router(AppState::new(db.clone(), config)), db)
}

/// Send a request and return (status, headers, raw body).
async fn send_raw(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

/// Send a request and return (status, headers, JSON body).
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let (status, headers, body) = send_raw(app, req).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, headers, json)
}

fn json_request(method: &str, uri: &str, body: &Value, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    for &(name, value) in headers {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    for &(name, value) in headers {
        builder = builder.header(name, value);
    }
    builder.body(Body::empty()).unwrap()
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// `jwt=<token>` pair from a response's `Set-Cookie` header.
fn refresh_cookie(headers: &HeaderMap) -> String {
    let raw = headers.get("set-cookie").unwrap().to_str().unwrap();
    raw.split(';').next().unwrap().to_string()
}

async fn register(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    let body = json!({"username": username, "password": password});
    let (status, _, json) = send(app, json_request("POST", "/register", &body, &[])).await;
    (status, json)
}

/// Log in and return (access token, refresh cookie pair).
async fn login(app: &Router, username: &str, password: &str) -> (String, String) {
    let body = json!({"username": username, "password": password});
    let (status, headers, json) = send(app, json_request("POST", "/login", &body, &[])).await;
    assert_eq!(status, StatusCode::OK, "login failed: {json}");
    (
        json["accessToken"].as_str().unwrap().to_string(),
        refresh_cookie(&headers),
    )
}

async fn signed_in(app: &Router) -> String {
    register(app, "alice", "s3cret").await;
    login(app, "alice", "s3cret").await.0
}

async fn create(app: &Router, token: &str, name: &str) -> (StatusCode, Value) {
    let body = json!({
        "name": name,
        "ingredients": "water\nsalt",
        "instructions": "boil\nserve",
    });
    let auth = bearer(token);
    let (status, _, json) = send(
        app,
        json_request("POST", "/recipes", &body, &[("authorization", auth.as_str())]),
    )
    .await;
    (status, json)
}

// === Health ===

#[tokio::test]
async fn health_reports_ok() {
    let app = app().await;
    let (status, _, json) = send(&app, get("/health", &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], true);
}

// === Registration ===

#[tokio::test]
async fn register_twice_conflicts() {
    let app = app().await;

    let (status, json) = register(&app, "alice", "pw").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert_eq!(json["user"]["username"], "alice");
    assert!(json["user"]["id"].as_str().is_some_and(|id| !id.is_empty()));

    let (status, json) = register(&app, "alice", "other").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Username already exists");
}

#[tokio::test]
async fn register_requires_both_fields() {
    let app = app().await;

    let (status, json) = register(&app, "alice", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);

    let (status, _, _) = send(&app, json_request("POST", "/register", &json!({}), &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = app().await;
    let req = Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

// === Login ===

#[tokio::test]
async fn login_returns_tokens_and_cookie() {
    let app = app().await;
    register(&app, "alice", "pw").await;

    let body = json!({"username": "alice", "password": "pw"});
    let (status, headers, json) = send(&app, json_request("POST", "/login", &body, &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "alice");
    assert_eq!(json["roles"]["User"], 2000);
    assert!(json["accessToken"].as_str().is_some_and(|t| !t.is_empty()));

    let cookie = headers.get("set-cookie").unwrap().to_str().unwrap();
    assert!(cookie.starts_with("jwt="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=None"));
    assert!(cookie.contains("Max-Age=604800"));
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_identical() {
    let app = app().await;
    register(&app, "alice", "pw").await;

    let wrong = json!({"username": "alice", "password": "nope"});
    let (s1, h1, b1) = send(&app, json_request("POST", "/login", &wrong, &[])).await;

    let unknown = json!({"username": "mallory", "password": "nope"});
    let (s2, h2, b2) = send(&app, json_request("POST", "/login", &unknown, &[])).await;

    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s1, s2);
    assert_eq!(b1, b2);
    assert!(h1.get("set-cookie").is_none());
    assert!(h2.get("set-cookie").is_none());
}

// === Refresh / logout ===

#[tokio::test]
async fn second_login_supersedes_first_refresh_token() {
    let app = app().await;
    register(&app, "alice", "pw").await;

    let (_, first) = login(&app, "alice", "pw").await;
    let (_, second) = login(&app, "alice", "pw").await;
    assert_ne!(first, second);

    let (status, _, _) = send(&app, get("/refresh", &[("cookie", first.as_str())])).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, json) = send(&app, get("/refresh", &[("cookie", second.as_str())])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "alice");
    assert!(json["accessToken"].as_str().is_some());
}

#[tokio::test]
async fn refresh_without_cookie_is_unauthorized() {
    let app = app().await;
    let (status, _, _) = send(&app, get("/refresh", &[])).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&app, get("/refresh", &[("cookie", "jwt=garbage")])).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn refreshed_access_token_works() {
    let app = app().await;
    register(&app, "alice", "pw").await;
    let (_, cookie) = login(&app, "alice", "pw").await;

    let (_, _, json) = send(&app, get("/refresh", &[("cookie", cookie.as_str())])).await;
    let token = json["accessToken"].as_str().unwrap().to_string();

    let (status, _) = create(&app, &token, "Soup").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn logout_clears_session_and_is_idempotent() {
    let app = app().await;
    register(&app, "alice", "pw").await;
    let (_, cookie) = login(&app, "alice", "pw").await;

    let logout = || {
        Request::builder()
            .method("POST")
            .uri("/logout")
            .header("cookie", cookie.as_str())
            .body(Body::empty())
            .unwrap()
    };

    let (status, headers, json) = send(&app, logout()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let cleared = headers.get("set-cookie").unwrap().to_str().unwrap();
    assert!(cleared.starts_with("jwt=;"));
    assert!(cleared.contains("Max-Age=0"));

    let (status, _, _) = send(&app, get("/refresh", &[("cookie", cookie.as_str())])).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(&app, logout()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_clears_cookie_when_store_is_down() {
    let (app, db) = app_with_db().await;
    register(&app, "alice", "pw").await;
    let (_, cookie) = login(&app, "alice", "pw").await;
    db.pool().close().await;

    let req = Request::builder()
        .method("POST")
        .uri("/logout")
        .header("cookie", cookie.as_str())
        .body(Body::empty())
        .unwrap();
    let (status, headers, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let cleared = headers.get("set-cookie").unwrap().to_str().unwrap();
    assert!(cleared.starts_with("jwt=;"));
    assert!(cleared.contains("Max-Age=0"));
}

// === Access token verification ===

#[tokio::test]
async fn protected_routes_need_bearer_header() {
    let app = app().await;
    let body = json!({"name": "Soup", "ingredients": "x", "instructions": "y"});

    for headers in [
        vec![],
        vec![("authorization", "Basic abc")],
        vec![("authorization", "Bearer ")],
    ] {
        let (status, _, json) = send(&app, json_request("POST", "/recipes", &body, &headers)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "headers: {headers:?}");
        assert_eq!(json["success"], false);
    }

    let (status, _, _) = send(
        &app,
        json_request(
            "POST",
            "/recipes",
            &body,
            &[("authorization", "Bearer not.a.token")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn expired_access_token_is_forbidden() {
    let app = app().await;
    let expired = JwtManager::with_ttls(
        ACCESS_SECRET.as_bytes(),
        REFRESH_SECRET.as_bytes(),
        -30,
        -30,
    )
    .issue_access_token("u1", "alice", &default_roles())
    .unwrap();

    let (status, _) = create(&app, &expired, "Soup").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = app().await;
    register(&app, "alice", "pw").await;
    let (_, cookie) = login(&app, "alice", "pw").await;
    let refresh_token = cookie.trim_start_matches("jwt=");

    let (status, _) = create(&app, refresh_token, "Soup").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// === Recipes ===

#[tokio::test]
async fn duplicate_recipe_name_keeps_one_record() {
    let app = app().await;
    let token = signed_in(&app).await;

    let (status, json) = create(&app, &token, "Soup").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["name"], "Soup");

    let (status, json) = create(&app, &token, "Soup").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "Recipe name already exists");

    let (_, _, json) = send(&app, get("/recipes/names", &[])).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn create_requires_all_fields() {
    let app = app().await;
    let token = signed_in(&app).await;
    let auth = bearer(&token);

    let body = json!({"name": "Soup", "ingredients": "  "});
    let (status, _, json) = send(
        &app,
        json_request("POST", "/recipes", &body, &[("authorization", auth.as_str())]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["message"],
        "Please provide name, ingredients, and instructions"
    );
}

#[tokio::test]
async fn created_by_defaults_to_caller() {
    let app = app().await;
    let (_, user) = register(&app, "alice", "pw").await;
    let (token, _) = login(&app, "alice", "pw").await;

    let (_, json) = create(&app, &token, "Soup").await;
    assert_eq!(json["data"]["createdBy"], user["user"]["id"]);
}

#[tokio::test]
async fn get_update_delete_lifecycle() {
    let app = app().await;
    let token = signed_in(&app).await;
    let auth = bearer(&token);

    let (_, json) = create(&app, &token, "Soup").await;
    let id = json["data"]["id"].as_str().unwrap().to_string();
    let path = format!("/recipes/{id}");

    let (status, _, json) = send(&app, get(&path, &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["ingredients"], "water\nsalt");

    let update = json!({"name": "Stew", "ingredients": "beef", "instructions": "simmer"});
    let (status, _, json) = send(
        &app,
        json_request("PUT", &path, &update, &[("authorization", auth.as_str())]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["name"], "Stew");
    assert_eq!(json["data"]["id"], id.as_str());

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri(&path)
            .header("authorization", auth.as_str())
            .body(Body::empty())
            .unwrap()
    };
    let (status, _, json) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Recipe deleted successfully");

    let (status, _, json) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Recipe not found");

    let (status, _, _) = send(&app, get(&path, &[])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_missing_recipe_is_not_found() {
    let app = app().await;
    let token = signed_in(&app).await;
    let auth = bearer(&token);

    let update = json!({"name": "Stew", "ingredients": "beef", "instructions": "simmer"});
    let (status, _, _) = send(
        &app,
        json_request("PUT", "/recipes/nope", &update, &[("authorization", auth.as_str())]),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_by_name() {
    let app = app().await;
    let token = signed_in(&app).await;
    create(&app, &token, "Soup").await;
    create(&app, &token, "Tomato Soup").await;
    create(&app, &token, "Pancakes").await;

    let (status, _, json) = send(&app, get("/recipes/search?name=soup", &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let (status, _, json) = send(&app, get("/recipes/search?name=lasagna", &[])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "No recipes found matching your search");

    let (status, _, json) = send(&app, get("/recipes/search?name=", &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Search term is required");
}

#[tokio::test]
async fn names_are_public_and_sorted() {
    let app = app().await;
    let token = signed_in(&app).await;
    create(&app, &token, "Waffles").await;
    create(&app, &token, "Bread").await;

    let (status, _, json) = send(&app, get("/recipes/names", &[])).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Bread", "Waffles"]);
}

#[tokio::test]
async fn download_returns_pdf_attachment() {
    let app = app().await;
    let token = signed_in(&app).await;
    let (_, json) = create(&app, &token, "Soup").await;
    let id = json["data"]["id"].as_str().unwrap();

    let (status, headers, body) = send_raw(&app, get(&format!("/recipes/{id}/download"), &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("content-type").unwrap(), "application/pdf");
    let disposition = headers.get("content-disposition").unwrap().to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"Soup.pdf\""));
    assert!(body.starts_with(b"%PDF-1.4"));

    let (status, _, _) = send_raw(&app, get("/recipes/missing/download", &[])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// === CORS ===

#[tokio::test]
async fn cors_allows_listed_origins_with_credentials() {
    let app = app().await;
    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/recipes/names")
            .header("origin", origin)
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap()
    };

    let (_, headers, _) = send_raw(&app, preflight("http://localhost:5173")).await;
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").unwrap(),
        "true"
    );

    let (_, headers, _) = send_raw(&app, preflight("https://evil.example")).await;
    assert!(headers.get("access-control-allow-origin").is_none());
}
