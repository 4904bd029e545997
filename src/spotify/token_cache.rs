//! Client-credentials access token with expiry-aware reuse.

use super::models::TokenResponse;
use super::supplier::SupplierError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::blocking::Client;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Tokens are refreshed this long before the provider says they expire.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Something that can mint a fresh access token.
pub trait TokenSource: Send + Sync {
    /// Returns the token and how long the provider says it is valid.
    fn fetch_token(&self) -> Result<(String, Duration), SupplierError>;
}

pub struct ClientCredentialsSource {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentialsSource {
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw.as_bytes()))
    }
}

impl TokenSource for ClientCredentialsSource {
    fn fetch_token(&self) -> Result<(String, Duration), SupplierError> {
        let response = self
            .client
            .post(&self.token_url)
            .header("Authorization", self.basic_auth())
            .form(&[("grant_type", "client_credentials")])
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    SupplierError::Timeout
                } else {
                    SupplierError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SupplierError::RateLimited);
        }
        if status.as_u16() == 400 || status.as_u16() == 401 {
            let body = response.text().unwrap_or_default();
            return Err(SupplierError::Auth(body));
        }
        if !status.is_success() {
            return Err(SupplierError::Api {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }

        let token: TokenResponse = response
            .json()
            .map_err(|e| SupplierError::InvalidResponse(format!("Bad token response: {}", e)))?;
        Ok((token.access_token, Duration::from_secs(token.expires_in)))
    }
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

pub struct TokenCache {
    source: Box<dyn TokenSource>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(source: Box<dyn TokenSource>) -> Self {
        Self {
            source,
            cached: Mutex::new(None),
        }
    }

    /// Returns the cached token, fetching a new one when there is none or it
    /// is within `REFRESH_MARGIN` of expiring.
    pub fn token(&self) -> Result<String, SupplierError> {
        let mut cached = self.cached.lock().unwrap();
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let (value, expires_in) = self.source.fetch_token()?;
        debug!("Fetched new access token, valid for {:?}", expires_in);
        let refresh_at = Instant::now() + expires_in.saturating_sub(REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: value.clone(),
            refresh_at,
        });
        Ok(value)
    }

    /// Drops the cached token, e.g. after the API rejected it.
    pub fn invalidate(&self) {
        *self.cached.lock().unwrap() = None;
    }
}
