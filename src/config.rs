//! Configuration file structures for the bot.
//!
//! The configuration is read from a YAML file, then every value can be
//! overridden with an environment variable prefixed by `AQIBOT_`, nested keys
//! being separated by `__`.
//!
//! # Configuration File Format
//!
//! ```yaml
//! # World Air Quality Index API
//! waqi:
//!   url: "https://api.waqi.info"
//!   token: "your-waqi-token"
//!
//! # Matrix account, enables the chat transport
//! matrix:
//!   user_id: "@aqibot:matrix.org"
//!   password: "secret-password"
//!   store_passphrase: "sqlite-store-passphrase"
//!   trigger: "!aqi"
//!
//! # Vonage Messages webhook, enables the webhook transport
//! webhook:
//!   bind: "0.0.0.0:3070"
//!   vonage:
//!     url: "https://messages-sandbox.nexmo.com"
//!     api_key: "your-api-key"
//!     api_secret: "your-api-secret"
//!     number: "14157386102"
//!     page_id: "107083064136738"
//! ```
//!
//! # Environment Variable Overrides
//!
//! ```bash
//! export AQIBOT_WAQI__TOKEN="your-waqi-token"
//! export AQIBOT_MATRIX__PASSWORD="secret-from-env"
//! export AQIBOT_WEBHOOK__VONAGE__API_SECRET="secret-from-env"
//! ```

use std::net::SocketAddr;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file or an environment variable could not be read or parsed
    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),
    /// Neither the `matrix` nor the `webhook` section is present
    #[error("no transport configured, add a `matrix` or a `webhook` section")]
    NoTransport,
    /// `matrix.trigger` is blank, which would answer every room message
    #[error("matrix trigger must not be empty")]
    EmptyTrigger,
}

/// Root configuration structure.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Air quality provider
    pub waqi: Waqi,
    /// Chat transport, disabled when absent
    pub matrix: Option<Matrix>,
    /// Webhook transport, disabled when absent
    pub webhook: Option<Webhook>,
}

/// World Air Quality Index API configuration.
#[derive(Debug, Deserialize)]
pub struct Waqi {
    /// Base URL of the API
    #[serde(default = "default_waqi_url")]
    pub url: String,
    /// API token, see <https://aqicn.org/data-platform/token/>
    pub token: String,
}

/// Matrix account configuration.
#[derive(Debug, Deserialize)]
pub struct Matrix {
    /// Fully qualified Matrix user ID, e.g. `@aqibot:matrix.org`
    pub user_id: String,

    /// Matrix account password.
    ///
    /// Used for the first login. The session is then persisted in the data
    /// directory and restored on the next starts.
    pub password: String,

    /// Passphrase encrypting the SQLite store of the Matrix SDK.
    pub store_passphrase: Option<String>,

    /// Prefix a room message must start with to be handled as a command
    #[serde(default = "default_trigger")]
    pub trigger: String,
}

/// Inbound webhook configuration.
#[derive(Debug, Deserialize)]
pub struct Webhook {
    /// Address the HTTP server listens on
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// Account used to push the replies
    pub vonage: Vonage,
}

/// Vonage Messages API account.
#[derive(Debug, Deserialize)]
pub struct Vonage {
    /// Base URL of the Messages API
    #[serde(default = "default_vonage_url")]
    pub url: String,
    pub api_key: String,
    pub api_secret: String,
    /// Sender number for sms, mms, whatsapp and viber
    pub number: String,
    /// Sender page id for messenger
    pub page_id: String,
}

fn default_waqi_url() -> String {
    "https://api.waqi.info".to_string()
}

fn default_trigger() -> String {
    "!aqi".to_string()
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3070))
}

fn default_vonage_url() -> String {
    "https://messages-sandbox.nexmo.com".to_string()
}

impl Config {
    /// Loads the configuration from the YAML file at `path`, applying the
    /// `AQIBOT_` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a value is missing or malformed,
    /// [`ConfigError::NoTransport`] if no transport is configured and
    /// [`ConfigError::EmptyTrigger`] if the Matrix trigger is blank.
    pub fn load(path: &str) -> Result<Config, ConfigError> {
        let mut config: Config = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("AQIBOT_").split("__"))
            .extract()
            .map_err(Box::new)?;

        if config.matrix.is_none() && config.webhook.is_none() {
            return Err(ConfigError::NoTransport);
        }

        if let Some(matrix) = config.matrix.as_mut() {
            matrix.trigger = matrix.trigger.trim().to_string();
            if matrix.trigger.is_empty() {
                return Err(ConfigError::EmptyTrigger);
            }
        }

        trim_url(&mut config.waqi.url);
        if let Some(webhook) = config.webhook.as_mut() {
            trim_url(&mut webhook.vonage.url);
        }

        Ok(config)
    }
}

fn trim_url(url: &mut String) {
    while url.ends_with('/') {
        url.pop();
    }
}
