//! Register, login, refresh and logout.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use cookie::Cookie;
use recipebox_core::api::{
    Credentials, Envelope, RegisterResponse, SessionResponse, default_roles,
};
use tracing::{info, instrument, warn};

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::auth::cookie::set_cookie_value;
use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::{JwtManager, SessionCookie};
use crate::storage::{DatabaseError, User};

const USERNAME_TAKEN: &str = "Username already exists";

fn with_cookie(
    status: StatusCode,
    cookie: &Cookie<'_>,
    body: impl IntoResponse,
) -> ApiResult<Response> {
    let value = set_cookie_value(cookie).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((status, [(SET_COOKIE, value)], body).into_response())
}

/// `POST /register`
#[instrument(skip(state, payload), fields(route = "register"))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(creds) = payload?;
    if !creds.is_complete() {
        return Err(ApiError::validation("Username and password are required"));
    }
    let username = creds.username.trim();

    match state.db.get_user_by_username(username).await {
        Ok(_) => return Err(ApiError::Duplicate(USERNAME_TAKEN.to_string())),
        Err(DatabaseError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let password_hash = hash_password_blocking(creds.password).await?;
    let user_id = uuid::Uuid::new_v4().to_string();

    let user = state
        .db
        .create_user(&user_id, username, &password_hash, &default_roles())
        .await
        .map_err(|e| match e {
            DatabaseError::Duplicate(_) => ApiError::Duplicate(USERNAME_TAKEN.to_string()),
            other => other.into(),
        })?;

    info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "User registered successfully!".to_string(),
            user: user.summary(),
        }),
    ))
}

/// Resolve credentials to a user. Unknown user and wrong password both
/// come back as `None`; only the log line tells them apart.
async fn authenticate(state: &AppState, creds: Credentials) -> ApiResult<Option<User>> {
    let user = match state.db.get_user_by_username(creds.username.trim()).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound(_)) => {
            warn!(username = %creds.username, reason = "unknown_user", "Failed login attempt");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    if verify_password_blocking(creds.password, user.password_hash.clone()).await? {
        Ok(Some(user))
    } else {
        warn!(username = %user.username, reason = "wrong_password", "Failed login attempt");
        Ok(None)
    }
}

/// `POST /login`
#[instrument(skip(state, payload), fields(route = "login"))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(creds) = payload?;
    if !creds.is_complete() {
        return Err(ApiError::validation("Username and password are required!"));
    }

    let user = authenticate(&state, creds)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let roles = user.role_map();
    let access_token = state
        .jwt
        .issue_access_token(&user.id, &user.username, &roles)?;
    let refresh_token = state.jwt.issue_refresh_token(&user.id, &user.username)?;

    // Overwrites any previous session for this user.
    state
        .db
        .set_refresh_token(&user.id, Some(&JwtManager::hash_token(&refresh_token)))
        .await?;

    info!(user_id = %user.id, username = %user.username, "User logged in");

    let body = Json(SessionResponse {
        success: true,
        message: "Login successful".to_string(),
        access_token,
        username: user.username,
        roles,
    });
    with_cookie(StatusCode::OK, &state.cookies.issue(&refresh_token), body)
}

/// `GET /refresh`
#[instrument(skip(state, headers), fields(route = "refresh"))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionResponse>> {
    let token = SessionCookie::extract(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    let claims = state.jwt.verify_refresh(&token).map_err(|e| {
        warn!(kind = e.kind(), token_len = token.len(), "Refresh token rejected");
        ApiError::from(e)
    })?;

    let user = state
        .db
        .get_user_by_refresh_token(&JwtManager::hash_token(&token))
        .await?
        .filter(|user| user.id == claims.sub)
        .ok_or_else(|| {
            warn!(username = %claims.username, "Refresh token superseded or revoked");
            ApiError::Forbidden("Forbidden".to_string())
        })?;

    let roles = user.role_map();
    let access_token = state
        .jwt
        .issue_access_token(&user.id, &user.username, &roles)?;

    Ok(Json(SessionResponse {
        success: true,
        message: "Token refreshed".to_string(),
        access_token,
        username: user.username,
        roles,
    }))
}

/// `POST /logout`
///
/// Always clears the cookie. When the cookie maps to a live session, that
/// session is dropped too.
#[instrument(skip(state, headers), fields(route = "logout"))]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(token) = SessionCookie::extract(&headers)
        && let Err(e) = forget_session(&state, &token).await
    {
        warn!(error = %e, "Failed to drop stored session on logout");
    }

    with_cookie(
        StatusCode::OK,
        &state.cookies.clear(),
        Json(Envelope::message(true, "Logged out successfully")),
    )
}

async fn forget_session(state: &AppState, token: &str) -> Result<(), DatabaseError> {
    let hash = JwtManager::hash_token(token);
    if let Some(user) = state.db.get_user_by_refresh_token(&hash).await? {
        state.db.set_refresh_token(&user.id, None).await?;
        info!(user_id = %user.id, "User logged out");
    }
    Ok(())
}
