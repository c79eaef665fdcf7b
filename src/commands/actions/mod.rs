//! Command action handlers.
//!
//! One [`CommandHandler`](crate::commands::CommandHandler) per bot command.
//! Handlers receive the parsed arguments and a
//! [`HandlerContext`](crate::commands::HandlerContext), and answer through
//! [`HandlerContext::reply`](crate::commands::HandlerContext::reply).
//!
//! # Available Handlers
//!
//! - [`BriefHandler`] - Current index and severity of a station
//! - [`InfoHandler`] - Pollutant and weather details of a station
//! - [`ActHandler`] - What one can do about air pollution
//! - [`HelpHandler`] - Display help information
//!
//! # Provider Failures
//!
//! Provider errors never leave a handler: an unknown station or an
//! unavailable feed is answered with a short "try again" text.

use std::sync::Arc;

use log::{debug, warn};

use crate::{
    aqi::{AirQualityProvider, ProviderError, Reading, Station},
    commands::{Arity, CommandDefinition, Commander, HandlerContext, RegistrationError, responses},
};

mod act;
mod brief;
mod help;
mod info;

pub use crate::commands::actions::{
    act::ActHandler, brief::BriefHandler, help::HelpHandler, info::InfoHandler,
};

/// Registers every bot command on `commander`.
///
/// # Errors
///
/// Returns [`RegistrationError`] if `commander` already knows one of the
/// command names or aliases.
pub fn register_commands(
    commander: &mut Commander,
    provider: Arc<dyn AirQualityProvider>,
) -> Result<(), RegistrationError> {
    commander.register(
        CommandDefinition::new("brief", Arc::new(BriefHandler::new(Arc::clone(&provider))))
            .alias("b")
            .arity(Arity::variadic(1))
            .usage("<station-name>")
            .description("Brief Information about the Air Quality"),
    )?;
    commander.register(
        CommandDefinition::new("info", Arc::new(InfoHandler::new(provider)))
            .alias("i")
            .arity(Arity::variadic(1))
            .usage("<station-name>")
            .description("Detailed Information about the Air Quality"),
    )?;
    commander.register(
        CommandDefinition::new("act", Arc::new(ActHandler))
            .description("Resources about the effects of Air Pollution"),
    )?;
    commander.register(
        CommandDefinition::new("help", Arc::new(HelpHandler))
            .alias("h")
            .description("Help Information"),
    )?;

    debug!("registered {} commands", commander.definitions().len());
    Ok(())
}

/// Searches the station matching `keyword` and fetches its reading.
///
/// Provider failures are answered to the sender and reported as `Ok(None)`.
async fn fetch_station_reading(
    provider: &dyn AirQualityProvider,
    keyword: &str,
    context: &HandlerContext<'_>,
) -> anyhow::Result<Option<(Station, Reading)>> {
    let station = match provider.search(keyword).await {
        Ok(station) => station,
        Err(ProviderError::NotFound(_)) => {
            context.reply(responses::station_not_found()).await?;
            return Ok(None);
        }
        Err(e) => {
            warn!("failed to search station {}: {}", keyword, e);
            context.reply(responses::data_unavailable()).await?;
            return Ok(None);
        }
    };

    match provider.fetch_reading(&station.url).await {
        Ok(reading) => Ok(Some((station, reading))),
        Err(e) => {
            warn!("failed to fetch reading of {}: {}", station, e);
            context.reply(responses::data_unavailable()).await?;
            Ok(None)
        }
    }
}
