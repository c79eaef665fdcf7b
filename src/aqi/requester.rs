//! HTTP client for the World Air Quality Index API.
//!
//! This module provides the [`WaqiRequester`] struct for searching stations
//! and fetching their latest readings.

use async_trait::async_trait;
use log::{debug, info};
use mockall::automock;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::aqi::{
    ProviderError,
    response_structs::{ApiResponse, Reading, SearchResult, Station},
};

/// Source of air quality data.
///
/// This trait abstracts the HTTP operations for easier testing with mocks.
#[automock]
#[async_trait]
pub trait AirQualityProvider: Send + Sync {
    /// Returns the best station matching `keyword`.
    async fn search(&self, keyword: &str) -> Result<Station, ProviderError>;
    /// Returns the latest reading of the station identified by `slug`.
    async fn fetch_reading(&self, slug: &str) -> Result<Reading, ProviderError>;
}

/// HTTP client for requesting data from the WAQI API.
///
/// # Examples
///
/// ```ignore
/// let requester = WaqiRequester::new("https://api.waqi.info", "your_token");
/// let station = requester.search("okhla delhi").await?;
/// let reading = requester.fetch_reading(&station.url).await?;
/// ```
pub struct WaqiRequester {
    /// WAQI api url
    url: String,
    /// WAQI api token
    token: String,
    /// HTTP client
    client: Client,
}

impl WaqiRequester {
    /// Create a new [WaqiRequester].
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL of the WAQI API, without trailing slash.
    /// * `token` - The API token.
    pub fn new(url: &str, token: &str) -> Self {
        WaqiRequester {
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client: Client::new(),
        }
    }

    /// Performs a GET request and unwraps the WAQI envelope.
    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response: ApiResponse = self
            .client
            .get(url)
            .query(&[("token", self.token.as_str())])
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.is_ok() {
            return Err(ProviderError::Unavailable(response.message()));
        }

        Ok(serde_json::from_value(response.data)?)
    }
}

#[async_trait]
impl AirQualityProvider for WaqiRequester {
    /// Request `/search/?keyword={keyword}` and keep the first station.
    ///
    /// This api call returns the stations matching the keyword, best first:
    /// ```json
    /// {
    ///   "status": "ok",
    ///   "data": [
    ///     { "uid": 2553, "aqi": "158", "station": { "name": "Okhla Phase-2, Delhi", "url": "india/delhi/okhla-phase-2" } }
    ///   ]
    /// }
    /// ```
    async fn search(&self, keyword: &str) -> Result<Station, ProviderError> {
        let url = format!("{}/search/", &self.url);
        info!("search station {}", keyword);

        let results: Vec<SearchResult> = self.get(&url, &[("keyword", keyword)]).await?;
        debug!("response from {}?keyword={} -> {:?}", &url, keyword, &results);

        results
            .into_iter()
            .next()
            .map(|result| result.station)
            .ok_or_else(|| ProviderError::NotFound(keyword.to_string()))
    }

    /// Request `/feed/{slug}/` to get the latest reading of a station.
    ///
    /// An unknown station is reported as `{"status": "error", "data": "Unknown station"}`.
    async fn fetch_reading(&self, slug: &str) -> Result<Reading, ProviderError> {
        let url = format!("{}/feed/{}/", &self.url, slug.trim_matches('/'));
        info!("request reading of {}", slug);

        let reading: Reading = self.get(&url, &[]).await?;
        debug!("response from {} -> {:?}", &url, &reading);

        Ok(reading)
    }
}
