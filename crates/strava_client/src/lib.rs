//! Minimal `StravaClient` trait plus the reqwest-backed implementation.
//!
//! Two calls are all the exporter needs: exchanging the stored refresh token
//! for a short-lived access token, and listing the athlete's activities.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

pub mod config;
pub mod http_client;

pub use config::{Config, Credentials};

/// Largest page the activity listing may return before paging is required.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum StravaError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("api error (status {status}): {body}")]
    Api { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error(
        "received {received} activities but a single page holds at most {limit}; paging mechanism needed"
    )]
    PagingRequired { received: usize, limit: u32 },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StravaError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => StravaError::Auth(body),
            404 => StravaError::NotFound(body),
            429 => StravaError::RateLimited(body),
            _ => StravaError::Api { status, body },
        }
    }
}

/// Bearer credential minted by the token endpoint. Lives for one run.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        let token: String = token.into();
        Self(SecretString::new(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// One activity as returned by `GET /athlete/activities`.
///
/// Only `name` is required to decode; the remaining consumed fields are
/// optional here so that records which never match the export filter are not
/// rejected for lacking them.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Activity {
    pub name: String,
    /// Meters.
    pub distance: Option<f64>,
    /// Seconds.
    pub moving_time: Option<u64>,
    pub start_date_local: Option<String>,
}

#[async_trait]
pub trait StravaClient: Send + Sync + 'static {
    /// Exchange the configured refresh token for a fresh access token.
    async fn refresh_access_token(&self) -> Result<AccessToken, StravaError>;

    /// Fetch one page of activities. `page` of `None` omits the query
    /// parameter and lets the API default to the first page.
    async fn list_activities_page(
        &self,
        token: &AccessToken,
        page: Option<u32>,
        per_page: u32,
    ) -> Result<Vec<Activity>, StravaError>;

    /// Fetch a single page and refuse results that would need paging.
    async fn list_activities(
        &self,
        token: &AccessToken,
        per_page: u32,
    ) -> Result<Vec<Activity>, StravaError> {
        check_per_page(per_page)?;
        let activities = self.list_activities_page(token, None, per_page).await?;
        check_page_len(activities.len())?;
        Ok(activities)
    }

    /// Walk `page=1,2,...` until a short page comes back.
    async fn list_all_activities(
        &self,
        token: &AccessToken,
        per_page: u32,
    ) -> Result<Vec<Activity>, StravaError> {
        check_per_page(per_page)?;
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let batch = self.list_activities_page(token, Some(page), per_page).await?;
            check_page_len(batch.len())?;
            let short = batch.len() < per_page as usize;
            tracing::debug!(page, received = batch.len(), "fetched activity page");
            all.extend(batch);
            if short {
                return Ok(all);
            }
            page += 1;
        }
    }
}

fn check_per_page(per_page: u32) -> Result<(), StravaError> {
    if per_page == 0 || per_page > MAX_PAGE_SIZE {
        return Err(StravaError::InvalidInput(format!(
            "per_page must be between 1 and {MAX_PAGE_SIZE}, got {per_page}"
        )));
    }
    Ok(())
}

fn check_page_len(received: usize) -> Result<(), StravaError> {
    if received > MAX_PAGE_SIZE as usize {
        return Err(StravaError::PagingRequired {
            received,
            limit: MAX_PAGE_SIZE,
        });
    }
    Ok(())
}
