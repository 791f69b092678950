//! HTTP client implementation for the Strava API.
//!
//! This module provides a reqwest-based implementation of the [`StravaClient`](crate::StravaClient) trait.

use crate::{AccessToken, Activity, Config, Credentials, StravaClient, StravaError};
use async_trait::async_trait;
use secrecy::ExposeSecret;

/// Client for the Strava API using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestStravaClient {
    base_url: String,
    credentials: Credentials,
    client: reqwest::Client,
}

#[derive(serde::Deserialize)]
struct TokenPayload {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
}

impl ReqwestStravaClient {
    /// Create a new client from an explicit configuration value.
    ///
    /// Fails only if the underlying TLS backend cannot be initialised.
    pub fn new(config: Config) -> Result<Self, StravaError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate verification disabled for Strava requests");
            builder = builder.danger_accept_invalid_certs(true);
        }
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials,
            client: builder.build()?,
        })
    }

    fn token_url(&self) -> String {
        format!("{}/oauth/token", self.base_url)
    }

    fn activities_url(&self) -> String {
        format!("{}/api/v3/athlete/activities", self.base_url)
    }

    /// Handle a response, converting status codes to appropriate errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, StravaError> {
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        // Read body as text first so decode failures can quote what came back.
        let text = resp.text().await?;
        serde_json::from_str::<T>(&text).map_err(|e| {
            let body_snippet: String = text.chars().take(256).collect();
            StravaError::Decode(format!("{e} - body: {body_snippet}"))
        })
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> StravaError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();
        StravaError::from_status(status, body_snippet)
    }
}

#[async_trait]
impl StravaClient for ReqwestStravaClient {
    async fn refresh_access_token(&self) -> Result<AccessToken, StravaError> {
        let creds = &self.credentials;
        let form = [
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.expose_secret()),
            ("grant_type", "refresh_token"),
            ("refresh_token", creds.refresh_token.expose_secret()),
            ("f", "json"),
        ];
        tracing::debug!(url = %self.token_url(), "requesting access token");
        let resp = self.client.post(self.token_url()).form(&form).send().await?;
        let payload: TokenPayload = self.handle_response(resp).await?;

        let access_token = payload
            .access_token
            .ok_or_else(|| StravaError::Decode("token response has no access_token".into()))?;

        if let Some(expires) = payload
            .expires_at
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
        {
            tracing::debug!(%expires, "access token issued");
        }
        if payload
            .refresh_token
            .as_deref()
            .is_some_and(|rt| rt != creds.refresh_token.expose_secret())
        {
            tracing::warn!(
                "Strava rotated the refresh token; update STRAVA_REFRESH_TOKEN before the next run"
            );
        }
        Ok(AccessToken::new(access_token))
    }

    async fn list_activities_page(
        &self,
        token: &AccessToken,
        page: Option<u32>,
        per_page: u32,
    ) -> Result<Vec<Activity>, StravaError> {
        let mut qp: Vec<(&str, String)> = Vec::new();
        if let Some(page) = page {
            qp.push(("page", page.to_string()));
        }
        qp.push(("per_page", per_page.to_string()));

        tracing::debug!(url = %self.activities_url(), ?page, per_page, "listing activities");
        let resp = self
            .client
            .get(self.activities_url())
            .bearer_auth(token.expose())
            .query(&qp)
            .send()
            .await?;
        self.handle_response(resp).await
    }
}
