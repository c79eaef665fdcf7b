//! Info command handler.
//!
//! Same lookup as the brief command, answered with the dominant pollutant,
//! every pollutant and weather value the station reports, and the data source.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::{
    aqi::{AirQualityProvider, format::format_detailed},
    commands::{CommandHandler, HandlerContext, actions::fetch_station_reading, responses},
    reply::ReplyPayload,
};

/// Handler of `info <station-name>`.
pub struct InfoHandler {
    provider: Arc<dyn AirQualityProvider>,
}

impl InfoHandler {
    pub fn new(provider: Arc<dyn AirQualityProvider>) -> Self {
        InfoHandler { provider }
    }
}

#[async_trait]
impl CommandHandler for InfoHandler {
    async fn handle(&self, args: &[String], context: &HandlerContext<'_>) -> anyhow::Result<()> {
        let keyword = args.join(" ");
        debug!("handling info command for {}", keyword);

        let Some((station, reading)) =
            fetch_station_reading(self.provider.as_ref(), &keyword, context).await?
        else {
            return Ok(());
        };

        let text = format!(
            "{}\n\n{}",
            format_detailed(&station, &reading),
            responses::detailed_footer(context.commander)
        );
        context.reply(ReplyPayload::text(text)).await?;

        Ok(())
    }
}
