//! Response structures for WAQI API endpoints.
//!
//! This module contains structures for deserializing JSON responses from
//! the World Air Quality Index API.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Envelope shared by every WAQI endpoint.
///
/// `data` holds the payload when `status` is `ok` and an error message
/// (a plain string) when `status` is `error`.
#[derive(Deserialize, Debug)]
pub struct ApiResponse {
    /// `ok` or `error`
    pub status: String,
    /// Payload or error message
    #[serde(default)]
    pub data: Value,
}

impl ApiResponse {
    /// Whether the API reported a success.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// Error message reported by the API, if any.
    pub fn message(&self) -> String {
        match &self.data {
            Value::String(message) => message.clone(),
            Value::Null => self.status.clone(),
            other => other.to_string(),
        }
    }
}

/// One entry of `/search/?keyword={keyword}`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Matching station
    pub station: Station,
}

/// A monitoring station.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Station {
    /// Human readable name, e.g. `Okhla Phase-2, Delhi, Delhi, India`
    pub name: String,
    /// Slug used to request the station feed, e.g. `india/delhi/okhla-phase-2`
    pub url: String,
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "name={}, url={}", self.name, self.url)
    }
}

/// Station readings from `/feed/{slug}/`.
///
/// Every field is optional: stations report different sets of values, and
/// some report `"-"` as index when the sensor is offline.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Reading {
    /// Overall air quality index
    #[serde(default, deserialize_with = "lenient_index")]
    pub aqi: Option<i64>,
    /// Code of the dominant pollutant, e.g. `pm25`
    #[serde(default)]
    pub dominentpol: Option<String>,
    /// Individual readings keyed by code
    #[serde(default)]
    pub iaqi: HashMap<String, SubReading>,
    /// Time of the measure
    #[serde(default)]
    pub time: Option<ReadingTime>,
    /// Data sources, the first one being the station operator
    #[serde(default)]
    pub attributions: Vec<Attribution>,
}

/// A single pollutant or weather value.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SubReading {
    /// Raw value, kept as sent to render integers and decimals faithfully
    #[serde(default)]
    pub v: Option<Value>,
}

/// Time of a reading.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ReadingTime {
    /// ISO 8601 timestamp with offset
    #[serde(default)]
    pub iso: Option<String>,
    /// Local time as `YYYY-MM-DD HH:MM:SS`
    #[serde(default)]
    pub s: Option<String>,
}

/// Data source of a reading.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Attribution {
    /// Name of the source
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Accepts numbers, numeric strings and anything else as "no index".
fn lenient_index<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|index| index.round() as i64)),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|index| index.is_finite())
            .map(|index| index.round() as i64),
        _ => None,
    })
}
