//! Remote country catalog client.
//!
//! Talks to a REST Countries compatible service: `GET {base}/all` returns a JSON
//! array of countries and `GET {base}/alpha/{code}` returns a single country.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::catalog::CatalogError;
use crate::models::Country;
use crate::util::{compact_text, normalize_base_url, normalize_country_code};

/// Public REST Countries v2 endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://restcountries.com/v2";

/// Fields requested from the bulk endpoint, matching [`Country`].
const COUNTRY_FIELDS: &str = "name,capital,currencies,flag,alpha2Code,alpha3Code";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of country records.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Every country the service knows about, in service order.
    async fn fetch_all(&self) -> Result<Vec<Country>, CatalogError>;

    /// A single country by alpha-2 or alpha-3 code.
    async fn fetch_by_code(&self, code: &str) -> Result<Country, CatalogError>;
}

/// HTTP client for the REST Countries API.
#[derive(Debug, Clone)]
pub struct RestCountriesClient {
    base_url: String,
    client: reqwest::Client,
}

impl RestCountriesClient {
    /// Builds a client for an explicit API base URL with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, String> {
        Self::with_timeout(base_url, DEFAULT_HTTP_TIMEOUT)
    }

    /// Builds a client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, String> {
        let base_url = normalize_base_url(base_url.into().as_str())?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| format!("Failed to construct HTTP client: {error}"))?;
        Ok(Self { base_url, client })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn all_url(&self) -> String {
        format!("{}/all?fields={COUNTRY_FIELDS}", self.base_url)
    }

    fn by_code_url(&self, code: &str) -> String {
        format!("{}/alpha/{}", self.base_url, urlencoding::encode(code))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| CatalogError::NetworkError(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(
                %url,
                status = status.as_u16(),
                body = %compact_text(&body),
                "Catalog request failed"
            );
            return Err(CatalogError::ServerError(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| CatalogError::NetworkError(error.to_string()))?;
        decode_body(&body)
    }
}

#[async_trait]
impl CatalogSource for RestCountriesClient {
    async fn fetch_all(&self) -> Result<Vec<Country>, CatalogError> {
        let countries: Vec<Country> = self.get_json(&self.all_url()).await?;
        tracing::debug!(count = countries.len(), "Fetched remote catalog");
        Ok(countries)
    }

    async fn fetch_by_code(&self, code: &str) -> Result<Country, CatalogError> {
        let code =
            normalize_country_code(code).ok_or_else(|| CatalogError::InvalidCode(code.into()))?;

        match self.get_json(&self.by_code_url(&code)).await {
            Err(CatalogError::ServerError(status)) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(CatalogError::NotFound(code))
            }
            other => other,
        }
    }
}

fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, CatalogError> {
    serde_json::from_slice(body).map_err(|error| CatalogError::DecodeError(error.to_string()))
}
