//! Brief command handler.
//!
//! Looks up the station matching the given terms and answers with its current
//! index, severity band and health advice.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::{
    aqi::{AirQualityProvider, format::format_brief},
    commands::{CommandHandler, HandlerContext, actions::fetch_station_reading, responses},
    reply::ReplyPayload,
};

/// Handler of `brief <station-name>`.
pub struct BriefHandler {
    provider: Arc<dyn AirQualityProvider>,
}

impl BriefHandler {
    pub fn new(provider: Arc<dyn AirQualityProvider>) -> Self {
        BriefHandler { provider }
    }
}

#[async_trait]
impl CommandHandler for BriefHandler {
    async fn handle(&self, args: &[String], context: &HandlerContext<'_>) -> anyhow::Result<()> {
        let keyword = args.join(" ");
        debug!("handling brief command for {}", keyword);

        let Some((station, reading)) =
            fetch_station_reading(self.provider.as_ref(), &keyword, context).await?
        else {
            return Ok(());
        };

        let text = format!(
            "{}\n\n{}",
            format_brief(&station, &reading),
            responses::brief_footer(context.commander)
        );
        context.reply(ReplyPayload::text(text)).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use crate::{
        aqi::{MockAirQualityProvider, ProviderError},
        commands::{
            ReplyTarget,
            actions::tests::{create_commander, create_context, create_reading, create_station},
        },
        reply::ReplyPayload,
    };

    #[tokio::test]
    async fn test_brief_reply() {
        let mut provider = MockAirQualityProvider::new();
        provider
            .expect_search()
            .with(eq("Okhla Delhi"))
            .times(1)
            .returning(|_| Ok(create_station()));
        provider
            .expect_fetch_reading()
            .with(eq("india/delhi/okhla-phase-2"))
            .times(1)
            .returning(|_| Ok(create_reading()));

        let (commander, sink) = create_commander(provider, Some("!aqi"));
        let context = create_context();
        commander
            .parse_and_dispatch("!aqi brief Okhla Delhi", &context)
            .await
            .unwrap();

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, context.reply_to);
        let ReplyPayload::Text(text) = &sent[0].1 else {
            panic!("Expected text payload");
        };
        assert!(text.contains("Current AQI: 55 (Moderate)"));
        assert!(text.contains("Station: Okhla Phase-2, Delhi, Delhi, India"));
        assert!(text.ends_with("send *!aqi help*."));
    }

    #[tokio::test]
    async fn test_brief_alias_without_trigger() {
        let mut provider = MockAirQualityProvider::new();
        provider
            .expect_search()
            .with(eq("kolkata"))
            .times(1)
            .returning(|_| Ok(create_station()));
        provider
            .expect_fetch_reading()
            .times(1)
            .returning(|_| Ok(create_reading()));

        let (commander, sink) = create_commander(provider, None);
        let context = crate::commands::InboundContext::channel(
            crate::commands::ChannelKind::Sms,
            "447700900000",
        );
        commander.parse_and_dispatch("B kolkata", &context).await.unwrap();

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0].0, ReplyTarget::Channel { .. }));
        let ReplyPayload::Text(text) = &sent[0].1 else {
            panic!("Expected text payload");
        };
        assert!(text.contains("send *info <station>*"));
    }

    #[tokio::test]
    async fn test_brief_station_not_found() {
        let mut provider = MockAirQualityProvider::new();
        provider
            .expect_search()
            .times(1)
            .returning(|keyword| Err(ProviderError::NotFound(keyword.to_string())));
        provider.expect_fetch_reading().never();

        let (commander, sink) = create_commander(provider, Some("!aqi"));
        commander
            .parse_and_dispatch("!aqi b atlantis", &create_context())
            .await
            .unwrap();

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, ReplyPayload::text("No Stations Found. Try Again."));
    }

    #[tokio::test]
    async fn test_brief_reading_unavailable() {
        let mut provider = MockAirQualityProvider::new();
        provider
            .expect_search()
            .times(1)
            .returning(|_| Ok(create_station()));
        provider
            .expect_fetch_reading()
            .times(1)
            .returning(|_| Err(ProviderError::Unavailable("Unknown station".to_string())));

        let (commander, sink) = create_commander(provider, Some("!aqi"));
        commander
            .parse_and_dispatch("!aqi b okhla", &create_context())
            .await
            .unwrap();

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, ReplyPayload::text("Could not get data. Try Again."));
    }
}
