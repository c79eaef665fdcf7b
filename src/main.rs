//! aqibot - A chat and messaging bot answering air quality questions.
//!
//! Users ask for a monitoring station by name and the bot answers with the
//! current air quality index of the best matching station, taken from the
//! World Air Quality Index project.
//!
//! # Transports
//!
//! - **Matrix**: the bot joins the rooms it is invited to and answers messages
//!   starting with its trigger prefix (`!aqi` by default)
//! - **Vonage Messages webhook**: the bot answers every sms, mms, whatsapp,
//!   viber or messenger message sent to its number or page
//!
//! # Configuration
//!
//! Create a `config.yaml` file, see the [`config`] module for every key:
//!
//! ```yaml
//! waqi:
//!   token: "your-waqi-token"
//!
//! matrix:
//!   user_id: "@aqibot:matrix.org"
//!   password: "your-password"
//! ```
//!
//! # Usage
//!
//! ```bash
//! aqibot --config config.yaml --data ./aqibot-data
//! ```
//!
//! # Bot Commands
//!
//! - `!aqi brief <station-name>` (alias `b`) - Current index and health advice
//! - `!aqi info <station-name>` (alias `i`) - Pollutant and weather details
//! - `!aqi act` - What one can do about air pollution
//! - `!aqi help` (alias `h`) - Display help information
//!
//! Over the webhook, commands are sent without the `!aqi` prefix.
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)
//! - `AQIBOT_*` - Overrides configuration values, e.g. `AQIBOT_WAQI__TOKEN`

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::{bot::Bot, config::Config};

mod aqi;
mod bot;
mod commands;
mod config;
mod intake;
mod matrix;
mod reply;
mod webhook;

/// Command-line arguments of the bot.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    config: String,

    /// Path to the directory for storing persistent data.
    ///
    /// Holds the Matrix session, including the access token of the bot
    /// account. Keep it readable by the bot only.
    #[arg(short, long)]
    data: String,
}

#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting aqibot {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            return;
        }
    };

    let bot = match Bot::new(config, &args.data).await {
        Ok(bot) => bot,
        Err(e) => {
            error!("Failed to initialize bot: {:?}", e);
            return;
        }
    };
    bot.start().await;
}
