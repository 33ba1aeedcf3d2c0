//! Location providers used to guess the user's home country.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::util::{compact_text, is_http_url, normalize_country_code};

const LOOKUP_HTTP_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location not found")]
    NotFound,
    #[error("Unknown location error")]
    Unknown,
}

/// Resolves the current ISO 3166-1 country code.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Upper-case alpha-2 or alpha-3 code for where the user is.
    async fn current_country_code(&self) -> Result<String, LocationError>;
}

/// Always answers with a configured code.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    code: String,
}

impl FixedLocation {
    /// Returns `None` when `code` is not 2-3 ASCII letters.
    pub fn new(code: &str) -> Option<Self> {
        normalize_country_code(code).map(|code| Self { code })
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_country_code(&self) -> Result<String, LocationError> {
        Ok(self.code.clone())
    }
}

/// Provider for environments without location access.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current_country_code(&self) -> Result<String, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

/// Looks the country up from an HTTP endpoint answering with a bare code,
/// such as `https://ipapi.co/country/`.
#[derive(Debug, Clone)]
pub struct IpLookupLocation {
    url: String,
    client: reqwest::Client,
}

impl IpLookupLocation {
    pub fn new(url: impl Into<String>) -> Result<Self, String> {
        let url = url.into().trim().to_string();
        if !is_http_url(&url) {
            return Err(format!(
                "Location lookup URL must include http:// or https://: {url}"
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(LOOKUP_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|error| format!("Failed to construct HTTP client: {error}"))?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LocationProvider for IpLookupLocation {
    async fn current_country_code(&self) -> Result<String, LocationError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "text/plain")
            .send()
            .await
            .map_err(|error| {
                tracing::debug!(%error, url = %self.url, "Location lookup request failed");
                LocationError::Unknown
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(
                status = status.as_u16(),
                body = %compact_text(&body),
                "Location lookup rejected"
            );
            return Err(status_error(status));
        }

        let body = response.text().await.map_err(|error| {
            tracing::debug!(%error, "Failed to read location lookup body");
            LocationError::Unknown
        })?;
        parse_lookup_body(&body)
    }
}

fn status_error(status: StatusCode) -> LocationError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LocationError::PermissionDenied,
        StatusCode::NOT_FOUND => LocationError::NotFound,
        _ => LocationError::Unknown,
    }
}

fn parse_lookup_body(body: &str) -> Result<String, LocationError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(LocationError::NotFound);
    }
    normalize_country_code(body).ok_or_else(|| {
        tracing::debug!(body = %compact_text(body), "Location lookup returned no country code");
        LocationError::Unknown
    })
}
