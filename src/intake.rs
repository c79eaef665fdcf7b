//! Hand-off from a transport to the command router.
//!
//! Both transports pass every inbound text through [`handle_message`], which
//! dispatches it and turns routing failures into answers or log lines.

use log::{debug, error, warn};

use crate::commands::{Commander, DispatchError, InboundContext, responses};

/// Dispatches `body` and deals with every error on the way.
///
/// A message the router cannot make sense of (no command, unknown command or
/// missing argument) is answered with the list of supported commands. A
/// message without the trigger prefix is ignored. Handler and delivery
/// failures are only logged.
pub async fn handle_message(commander: &Commander, body: &str, context: &InboundContext) {
    match commander.parse_and_dispatch(body, context).await {
        Ok(()) => debug!("handled {:?} message from {}", context.transport, context.sender),
        Err(DispatchError::Parse(e)) if e.is_user_facing() => {
            debug!("invalid command from {}: {}", context.sender, e);
            let payload = responses::supported_commands(commander);
            if let Err(e) = commander.reply(&payload, context).await {
                warn!("failed to send supported commands to {}: {}", context.sender, e);
            }
        }
        Err(DispatchError::Parse(e)) => debug!("ignored message from {}: {}", context.sender, e),
        Err(DispatchError::Handler { command, error }) => {
            error!(
                "command {} from {} failed: {:?}",
                command, context.sender, error
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        aqi::MockAirQualityProvider,
        commands::{ChannelKind, actions::register_commands},
        reply::{ReplyPayload, testing::RecordingSink},
    };

    fn create_commander(trigger: Option<&str>) -> (Commander, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let mut commander = Commander::new(trigger, sink.clone());
        register_commands(&mut commander, Arc::new(MockAirQualityProvider::new())).unwrap();
        (commander, sink)
    }

    #[tokio::test]
    async fn test_unknown_command_answers_supported_commands() {
        let (commander, sink) = create_commander(Some("!aqi"));
        let context = InboundContext::room("@alice:example.com", "!room:example.com", "$event");

        handle_message(&commander, "!aqi xyz foo", &context).await;

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, context.reply_to);
        assert_eq!(sent[0].1, responses::supported_commands(&commander));
    }

    #[tokio::test]
    async fn test_missing_argument_answers_supported_commands() {
        let (commander, sink) = create_commander(None);
        let context = InboundContext::channel(ChannelKind::Sms, "447700900000");

        handle_message(&commander, "info", &context).await;

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        let ReplyPayload::Structured { title, description, .. } = &sent[0].1 else {
            panic!("Expected structured payload");
        };
        assert_eq!(title, "Supported Commands");
        assert!(description.contains("info <station-name> (alias: i)"));
    }

    #[tokio::test]
    async fn test_untriggered_message_is_ignored() {
        let (commander, sink) = create_commander(Some("!aqi"));
        let context = InboundContext::room("@alice:example.com", "!room:example.com", "$event");

        handle_message(&commander, "hello everyone", &context).await;
        handle_message(&commander, "!aqiinfo okhla", &context).await;

        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_bare_trigger_answers_supported_commands() {
        let (commander, sink) = create_commander(Some("!aqi"));
        let context = InboundContext::room("@alice:example.com", "!room:example.com", "$event");

        handle_message(&commander, "!AQI", &context).await;

        assert_eq!(sink.sent().len(), 1);
    }
}
