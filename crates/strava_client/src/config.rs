use crate::StravaError;
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.strava.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// OAuth application credentials plus the athlete's long-lived refresh token.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,
    pub base_url: String,
    /// `None` waits on the network indefinitely.
    pub timeout: Option<Duration>,
    /// Skip TLS certificate verification. Off unless explicitly requested.
    pub accept_invalid_certs: bool,
}

impl Config {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            accept_invalid_certs: false,
        }
    }

    pub fn from_env() -> Result<Self, StravaError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, StravaError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut required = |key: &str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| StravaError::Config(format!("{key} missing")))
        };
        let client_id = required("STRAVA_CLIENT_ID")?;
        let client_secret = required("STRAVA_CLIENT_SECRET")?;
        let refresh_token = required("STRAVA_REFRESH_TOKEN")?;

        let base_url = get("STRAVA_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let timeout = match get("STRAVA_HTTP_TIMEOUT_SECS") {
            None => Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    StravaError::Config(format!("STRAVA_HTTP_TIMEOUT_SECS is not a number: {raw}"))
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
        };
        let accept_invalid_certs = get("STRAVA_ACCEPT_INVALID_CERTS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            credentials: Credentials {
                client_id,
                client_secret: SecretString::new(client_secret.into()),
                refresh_token: SecretString::new(refresh_token.into()),
            },
            base_url,
            timeout,
            accept_invalid_certs,
        })
    }
}
