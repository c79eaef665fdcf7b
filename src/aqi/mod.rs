//! World Air Quality Index integration.
//!
//! This module provides the data side of the bot: an HTTP client for the WAQI
//! API and the pure functions turning its readings into messages.
//!
//! # Modules
//!
//! - `requester` - HTTP client for the WAQI search and feed endpoints
//! - `response_structs` - Data structures for API responses
//! - `format` - Severity bands, reading codes and message formatting

use thiserror::Error;

pub mod format;
mod requester;
mod response_structs;

#[cfg(test)]
pub use crate::aqi::requester::MockAirQualityProvider;
pub use crate::aqi::requester::{AirQualityProvider, WaqiRequester};
#[cfg(test)]
pub use crate::aqi::response_structs::{Attribution, ReadingTime};
pub use crate::aqi::response_structs::{Reading, Station};

/// Errors that can occur while requesting the WAQI API.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No station matches the searched keyword
    #[error("no station found for `{0}`")]
    NotFound(String),
    /// The API answered with an error status, e.g. an unknown station or an invalid token
    #[error("air quality data unavailable: {0}")]
    Unavailable(String),
    /// The request failed or the server answered with an error code
    #[error("request to the air quality api failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The response payload does not have the expected shape
    #[error("unexpected air quality api payload: {0}")]
    Decode(#[from] serde_json::Error),
}
