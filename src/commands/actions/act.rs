//! Act command handler.

use async_trait::async_trait;
use log::debug;

use crate::commands::{CommandHandler, HandlerContext, responses};

/// Handler of `act`: why air pollution matters and where to learn what to do.
pub struct ActHandler;

#[async_trait]
impl CommandHandler for ActHandler {
    async fn handle(&self, _args: &[String], context: &HandlerContext<'_>) -> anyhow::Result<()> {
        debug!("handling act command");
        context.reply(responses::act()).await?;
        Ok(())
    }
}
