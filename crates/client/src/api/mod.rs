//! Route-planning backend client.
//!
//! ### Endpoints
//!
//! - **Loop route**: `GET {base}/api/paths/route/?lat=&lon=&minutes=&points_encoded=false`
//! - **Favorites**: `GET|POST {base}/api/favorites/`, `DELETE {base}/api/favorites/{id}/`
//!
//! ### Errors
//!
//! - Non-2xx answers become [`ApiError::Upstream`] carrying the body's
//!   `detail`, else its `error`, else a per-operation fallback message.
//! - Writes carry `X-CSRFToken` when the configured cookie holds a
//!   `csrftoken`; otherwise the header is omitted.
//! - No retries.

pub mod csrf;
pub mod error;
pub mod favorites;
pub mod request;
pub mod response;

pub use error::ApiError;
pub use favorites::{FavoriteMetadata, FavoriteRoute, NewFavorite, RouteType};
pub use request::LoopRouteRequest;
pub use response::{LoopRoute, error_message};

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};

use looproute_core::AppConfig;

const ROUTE_FAILED: &str = "Failed to generate route.";
const SAVE_FAILED: &str = "Failed to save favorite.";
const DELETE_FAILED: &str = "Could not delete the favorite. Please try again.";
const LIST_FAILED: &str = "Failed to load favorites.";

/// Backend client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend origin, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// Cookie header forwarded with every call; source of the CSRF token.
    pub cookie: Option<String>,
}

impl ApiConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            cookie: config.cookie.clone(),
        }
    }
}

/// Operations the planner needs from the backend.
#[async_trait]
pub trait RouteBackend: Send + Sync {
    async fn loop_route(&self, req: LoopRouteRequest) -> Result<LoopRoute, ApiError>;

    async fn save_favorite(&self, favorite: &NewFavorite) -> Result<FavoriteRoute, ApiError>;

    async fn delete_favorite(&self, id: &str) -> Result<(), ApiError>;

    async fn list_favorites(&self) -> Result<Vec<FavoriteRoute>, ApiError>;
}

/// reqwest-backed [`RouteBackend`].
#[derive(Debug, Clone)]
pub struct RouteApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    csrf_token: Option<String>,
}

impl RouteApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .use_rustls_tls()
            .build()?;

        let csrf_token = config.cookie.as_deref().and_then(csrf::csrf_token);
        if config.cookie.is_some() && csrf_token.is_none() {
            tracing::debug!("cookie carries no csrftoken; writes go out without {}", csrf::CSRF_HEADER);
        }

        Ok(Self { http, config, csrf_token })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(ApiConfig::from_config(config))
    }

    /// Join `path` onto the base URL with exactly one slash between them.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method.clone(), self.endpoint(path))
            .header(header::ACCEPT, "application/json");

        if let Some(cookie) = &self.config.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        if method != Method::GET
            && let Some(token) = &self.csrf_token
        {
            builder = builder.header(csrf::CSRF_HEADER, token);
        }

        builder
    }

    /// Send, read the body, and turn non-2xx answers into [`ApiError::Upstream`].
    async fn send(&self, builder: RequestBuilder, fallback: &str) -> Result<(StatusCode, bytes::Bytes), ApiError> {
        let start = Instant::now();
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        tracing::debug!("backend answered {} in {:?} ({} bytes)", status, start.elapsed(), body.len());

        if !status.is_success() {
            let parsed = serde_json::from_slice::<Value>(&body).ok();
            let message = error_message(parsed.as_ref(), fallback);
            tracing::warn!(status = status.as_u16(), "backend call failed: {}", message);
            return Err(ApiError::Upstream { status: status.as_u16(), message });
        }

        Ok((status, body))
    }

    fn parse<T: DeserializeOwned>(body: &[u8], fallback: &str) -> Result<T, ApiError> {
        serde_json::from_slice(body).map_err(|e| {
            tracing::debug!("unreadable backend body: {}", e);
            ApiError::Parse(format!("{fallback} ({e})"))
        })
    }
}

#[async_trait]
impl RouteBackend for RouteApiClient {
    async fn loop_route(&self, req: LoopRouteRequest) -> Result<LoopRoute, ApiError> {
        req.validate()?;

        tracing::debug!("requesting loop route: lat={} lon={} minutes={}", req.lat, req.lon, req.minutes);

        let builder = self.request(Method::GET, "api/paths/route/").query(&req.query());
        let (_, body) = self.send(builder, ROUTE_FAILED).await?;
        let route: LoopRoute = Self::parse(&body, ROUTE_FAILED)?;

        if route.coordinates.is_empty() {
            return Err(ApiError::MissingCoordinates);
        }

        Ok(route)
    }

    async fn save_favorite(&self, favorite: &NewFavorite) -> Result<FavoriteRoute, ApiError> {
        let builder = self.request(Method::POST, "api/favorites/").json(favorite);
        let (_, body) = self.send(builder, SAVE_FAILED).await?;
        Self::parse(&body, SAVE_FAILED)
    }

    async fn delete_favorite(&self, id: &str) -> Result<(), ApiError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ApiError::InvalidRequest("favorite id must not be empty".into()));
        }

        let builder = self.request(Method::DELETE, &format!("api/favorites/{id}/"));
        self.send(builder, DELETE_FAILED).await?;
        Ok(())
    }

    async fn list_favorites(&self) -> Result<Vec<FavoriteRoute>, ApiError> {
        let builder = self.request(Method::GET, "api/favorites/");
        let (_, body) = self.send(builder, LIST_FAILED).await?;
        Self::parse(&body, LIST_FAILED)
    }
}
