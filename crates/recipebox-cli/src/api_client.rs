//! HTTP client for the `RecipeBox` server.
//!
//! Executes the [`ApiCall`]s requested by the client controllers and turns
//! the responses into [`ApiReply`]s. The refresh token travels in the `jwt`
//! cookie; this client captures it from `Set-Cookie` and replays it on
//! refresh and logout.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use cookie::Cookie;
use recipebox_core::api::{
    Envelope, REFRESH_COOKIE, Recipe, RecipeName, RegisterResponse, SessionResponse,
};
use recipebox_core::client::{ApiCall, ApiReply, ClientSession};
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, COOKIE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::driver::Transport;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    fn unauthorized(message: &str) -> Self {
        Self::Api {
            status: 401,
            message: message.to_string(),
        }
    }
}

/// `RecipeBox` REST client.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    download_dir: PathBuf,
    refresh_token: Mutex<Option<String>>,
}

impl ApiClient {
    pub fn new(base_url: &str, refresh_token: Option<String>) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::Config(format!("invalid server URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "server URL {base_url} cannot be a base"
            )));
        }

        // Ensure a TLS crypto provider is installed (reqwest uses rustls-no-provider).
        // The `Err` case just means it was already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .user_agent(concat!("recipebox-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            download_dir: PathBuf::from("."),
            refresh_token: Mutex::new(refresh_token),
        })
    }

    /// Directory downloaded PDFs are written to.
    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Current refresh token, for persisting between runs.
    pub fn refresh_token(&self) -> Option<String> {
        self.refresh_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_refresh_token(&self, token: Option<String>) {
        *self
            .refresh_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.http.request(method, self.url(segments))
    }

    fn with_refresh_cookie(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.refresh_token() {
            Some(token) => {
                builder.header(COOKIE, Cookie::new(REFRESH_COOKIE, token).to_string())
            }
            None => builder,
        }
    }

    async fn try_execute(
        &self,
        call: &ApiCall,
        session: &ClientSession,
    ) -> Result<ApiReply, ClientError> {
        let bearer = if call.requires_auth() {
            let token = session
                .access_token
                .as_deref()
                .ok_or_else(|| ClientError::unauthorized("Please log in first"))?;
            Some(format!("Bearer {token}"))
        } else {
            None
        };
        let authed = |builder: RequestBuilder| match &bearer {
            Some(value) => builder.header(AUTHORIZATION, value),
            None => builder,
        };

        let reply = match call {
            ApiCall::Register(credentials) => {
                let resp = self
                    .request(Method::POST, &["register"])
                    .json(credentials)
                    .send()
                    .await?;
                let body: RegisterResponse = decode(resp).await?;
                ApiReply::Registered(body.user)
            }
            ApiCall::Login(credentials) => {
                let resp = self
                    .request(Method::POST, &["login"])
                    .json(credentials)
                    .send()
                    .await?;
                let cookie = refresh_cookie_from(&resp);
                let body: SessionResponse = decode(resp).await?;
                if let Some(token) = cookie {
                    self.set_refresh_token(token);
                }
                ApiReply::SignedIn {
                    access_token: body.access_token,
                    username: body.username,
                }
            }
            ApiCall::Logout => {
                let resp = self
                    .with_refresh_cookie(self.request(Method::POST, &["logout"]))
                    .send()
                    .await?;
                let _: Envelope<serde_json::Value> = decode(resp).await?;
                self.set_refresh_token(None);
                ApiReply::SignedOut
            }
            ApiCall::Refresh => {
                if self.refresh_token().is_none() {
                    return Err(ClientError::unauthorized("Not logged in"));
                }
                let resp = self
                    .with_refresh_cookie(self.request(Method::GET, &["refresh"]))
                    .send()
                    .await?;
                let body: SessionResponse = decode(resp).await?;
                ApiReply::SignedIn {
                    access_token: body.access_token,
                    username: body.username,
                }
            }
            ApiCall::ListNames => {
                let resp = self
                    .request(Method::GET, &["recipes", "names"])
                    .send()
                    .await?;
                let body: Envelope<Vec<RecipeName>> = decode(resp).await?;
                ApiReply::Names(body.data.unwrap_or_default())
            }
            ApiCall::Search { term } => {
                let mut url = self.url(&["recipes", "search"]);
                url.query_pairs_mut().append_pair("name", term);
                let resp = self.http.get(url).send().await?;
                let body: Envelope<Vec<Recipe>> = decode(resp).await?;
                ApiReply::Found(body.data.unwrap_or_default())
            }
            ApiCall::Create(payload) => {
                let resp = authed(self.request(Method::POST, &["recipes"]))
                    .json(payload)
                    .send()
                    .await?;
                saved(decode(resp).await?)?
            }
            ApiCall::Update { id, payload } => {
                let resp = authed(self.request(Method::PUT, &["recipes", id.as_str()]))
                    .json(payload)
                    .send()
                    .await?;
                saved(decode(resp).await?)?
            }
            ApiCall::Delete { id } => {
                let resp = authed(self.request(Method::DELETE, &["recipes", id.as_str()]))
                    .send()
                    .await?;
                let _: Envelope<serde_json::Value> = decode(resp).await?;
                ApiReply::Deleted
            }
            ApiCall::Download { id } => {
                let resp = self
                    .request(Method::GET, &["recipes", id.as_str(), "download"])
                    .send()
                    .await?;
                let resp = check_status(resp).await?;
                let file_name = resp
                    .headers()
                    .get(CONTENT_DISPOSITION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(disposition_file_name)
                    .unwrap_or_else(|| "recipe.pdf".to_string());
                let bytes = resp.bytes().await?;
                let path = self.download_dir.join(&file_name);
                write_file(&path, &bytes).await?;
                ApiReply::Downloaded {
                    file_name: path.display().to_string(),
                }
            }
        };
        Ok(reply)
    }
}

impl Transport for ApiClient {
    /// Perform one call. Transport failures become `ApiReply::Failed` with no status.
    async fn execute(&self, call: &ApiCall, session: &ClientSession) -> ApiReply {
        match self.try_execute(call, session).await {
            Ok(reply) => reply,
            Err(ClientError::Api { status, message }) => {
                debug!(status, %message, "Server rejected call");
                ApiReply::Failed {
                    status: Some(status),
                    message,
                }
            }
            Err(e) => {
                warn!(error = %e, "Call failed");
                ApiReply::Failed {
                    status: None,
                    message: e.to_string(),
                }
            }
        }
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ClientError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

fn saved(body: Envelope<Recipe>) -> Result<ApiReply, ClientError> {
    body.data.map(ApiReply::Saved).ok_or(ClientError::Api {
        status: 500,
        message: body.message,
    })
}

/// Pass successful responses through; turn the rest into `ClientError::Api`
/// carrying the server's `message`.
async fn check_status(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let fallback = status.canonical_reason().unwrap_or("Unknown").to_string();
    let message = resp
        .json::<Envelope<serde_json::Value>>()
        .await
        .map_or(fallback, |body| body.message);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    Ok(check_status(resp).await?.json().await?)
}

/// The refresh token set by a response: `Some(Some(token))` when issued,
/// `Some(None)` when cleared, `None` when the response does not touch it.
fn refresh_cookie_from(resp: &Response) -> Option<Option<String>> {
    resp.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(parse_refresh_cookie)
}

fn parse_refresh_cookie(set_cookie: &str) -> Option<Option<String>> {
    let cookie = Cookie::parse(set_cookie).ok()?;
    if cookie.name() != REFRESH_COOKIE {
        return None;
    }
    let cleared = cookie.value().is_empty()
        || cookie.max_age().is_some_and(|age| age.is_zero() || age.is_negative());
    Some((!cleared).then(|| cookie.value().to_string()))
}

/// File name from `Content-Disposition`, reduced to its last path component.
fn disposition_file_name(value: &str) -> Option<String> {
    let start = value.find("filename=\"")? + "filename=\"".len();
    let rest = &value[start..];
    let name = &rest[..rest.find('"')?];
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(ToString::to_string)
}
