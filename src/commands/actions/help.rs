//! Help command handler.
//!
//! Lists every registered command with its description. The menu is built
//! from the [`Commander`](crate::commands::Commander) registry, so commands
//! show up with the trigger prefix of the transport the help was asked on.

use async_trait::async_trait;
use log::debug;

use crate::commands::{CommandHandler, HandlerContext, responses};

/// Handler of `help`.
pub struct HelpHandler;

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn handle(&self, _args: &[String], context: &HandlerContext<'_>) -> anyhow::Result<()> {
        debug!("handling help command");
        context
            .reply(responses::help_menu(context.commander))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        aqi::MockAirQualityProvider,
        commands::actions::tests::{create_commander, create_context},
        reply::ReplyPayload,
    };

    #[tokio::test]
    async fn test_help_menu() {
        let (commander, sink) = create_commander(MockAirQualityProvider::new(), Some("!aqi"));

        commander
            .parse_and_dispatch("!aqi h", &create_context())
            .await
            .unwrap();

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        let ReplyPayload::Structured { title, description, .. } = &sent[0].1 else {
            panic!("Expected structured payload");
        };
        assert_eq!(title, "Help Menu");
        assert!(description.contains("!aqi brief: Brief Information about the Air Quality"));
        assert!(description.contains("!aqi help: Help Information"));
    }
}
