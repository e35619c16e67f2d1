//! HTTP client for the populartimes page
//!
//! One GET per refresh, bounded by a hard timeout so a stalled endpoint
//! cannot block the refresh cycle. Failures are classified into a
//! closed set of kinds that callers match on:
//! - 401/403 -> `Authentication` (the page is public today; kept
//!   distinct so a host can prompt for reconfiguration)
//! - other non-2xx, timeouts, connect/DNS and body errors -> `Communication`
//! - anything else -> `Client` (catch-all, nothing unanticipated leaks out)

use crate::domain::snapshot::OccupancySnapshot;
use crate::io::parser;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://oma.enkora.fi/unisport/populartimes";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid credentials")]
    Authentication,
    #[error("error fetching occupancy data")]
    Communication(#[source] reqwest::Error),
    #[error("source page format changed: {0}")]
    Parse(String),
    #[error("unexpected client error")]
    Client(#[source] reqwest::Error),
}

/// Copyable classification of an [`ApiError`], for the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Communication,
    Parse,
    Client,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "authentication",
            ErrorKind::Communication => "communication",
            ErrorKind::Parse => "parse",
            ErrorKind::Client => "client",
        }
    }
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Authentication => ErrorKind::Authentication,
            ApiError::Communication(_) => ErrorKind::Communication,
            ApiError::Parse(_) => ErrorKind::Parse,
            ApiError::Client(_) => ErrorKind::Client,
        }
    }
}

fn classify(error: reqwest::Error) -> ApiError {
    if error.is_timeout()
        || error.is_connect()
        || error.is_request()
        || error.is_body()
        || error.is_decode()
        || error.is_status()
    {
        ApiError::Communication(error)
    } else {
        ApiError::Client(error)
    }
}

/// Something that can produce a fresh [`OccupancySnapshot`].
///
/// The refresh coordinator depends on this seam rather than on the
/// concrete HTTP client, so tests can drive it with canned results.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<OccupancySnapshot, ApiError>;
}

pub struct ApiClient {
    http: reqwest::Client,
    url: String,
}

impl ApiClient {
    /// Build a client with connection reuse and the given per-request
    /// timeout.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self { http, url: url.to_string() })
    }

    /// One GET of the populartimes page, parsed into a snapshot.
    ///
    /// Stateless between calls; every invocation hits the network.
    pub async fn fetch_snapshot(&self) -> Result<OccupancySnapshot, ApiError> {
        let response = self.http.get(&self.url).send().await.map_err(classify)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Authentication);
        }
        let response = response.error_for_status().map_err(ApiError::Communication)?;

        let text = response.text().await.map_err(classify)?;
        debug!(url = %self.url, bytes = text.len(), "page_fetched");
        parser::parse_page(&text)
    }
}

#[async_trait]
impl SnapshotSource for ApiClient {
    async fn fetch_snapshot(&self) -> Result<OccupancySnapshot, ApiError> {
        ApiClient::fetch_snapshot(self).await
    }
}
