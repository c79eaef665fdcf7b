//! HTTP server receiving the Vonage Messages webhooks.

use std::{net::SocketAddr, sync::Arc};

use axum::{Router, body::Bytes, extract::State, http::StatusCode, routing::post};
use log::{debug, error, info, warn};
use tokio::net::TcpListener;

use crate::{
    commands::Commander,
    intake::handle_message,
    webhook::payload::{InboundMessage, StatusMessage},
};

/// Shared state of the webhook handlers.
struct WebhookState {
    /// Router of the webhook transport, without trigger prefix
    commander: Arc<Commander>,
}

/// Builds the routes of the webhook transport.
pub fn router(commander: Arc<Commander>) -> Router {
    let state = Arc::new(WebhookState { commander });

    Router::new()
        .route("/webhook/inbound", post(handle_inbound))
        .route("/webhook/status", post(handle_status))
        .with_state(state)
}

/// Binds `addr` and serves the webhook routes until the server fails.
pub async fn serve(addr: SocketAddr, commander: Arc<Commander>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("webhook server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(commander)).await
}

/// Answers an inbound message.
///
/// Always acknowledges with `200`, once the reply was attempted. The Messages
/// API retries unacknowledged webhooks, which would answer the sender twice.
async fn handle_inbound(State(state): State<Arc<WebhookState>>, body: Bytes) -> StatusCode {
    let message: InboundMessage = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            warn!("malformed inbound message: {}", e);
            return StatusCode::OK;
        }
    };

    let message_uuid = message.message_uuid.clone().unwrap_or_default();
    info!("{} received", message_uuid);

    let Some((text, context)) = message.into_parts() else {
        warn!("{} has no text or no sender, ignored", message_uuid);
        return StatusCode::OK;
    };

    let commander = Arc::clone(&state.commander);
    let processing =
        tokio::spawn(async move { handle_message(&commander, &text, &context).await });
    if let Err(e) = processing.await {
        error!("processing of {} failed: {}", message_uuid, e);
    }

    StatusCode::OK
}

/// Logs a delivery receipt of a pushed message.
async fn handle_status(body: Bytes) -> StatusCode {
    match serde_json::from_slice::<StatusMessage>(&body) {
        Ok(status) => info!(
            "{} {} at {}",
            status.message_uuid.as_deref().unwrap_or("unknown message"),
            status.status.as_deref().unwrap_or("unknown status"),
            status.timestamp.as_deref().unwrap_or("unknown time"),
        ),
        Err(e) => debug!("malformed status message: {}", e),
    }

    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{
        aqi::{MockAirQualityProvider, ProviderError},
        commands::{
            ChannelKind, CommandDefinition, CommandHandler, HandlerContext, ReplyTarget,
            actions::register_commands, responses,
        },
        reply::{ReplyPayload, testing::RecordingSink},
    };

    struct PanickingHandler;

    #[async_trait]
    impl CommandHandler for PanickingHandler {
        async fn handle(&self, _args: &[String], _context: &HandlerContext<'_>) -> anyhow::Result<()> {
            panic!("handler panicked");
        }
    }

    /// Serves the routes on an ephemeral port and returns the base url.
    async fn start_server(commander: Commander) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Arc::new(commander));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn create_commander(provider: MockAirQualityProvider) -> (Commander, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let mut commander = Commander::new(None, sink.clone());
        register_commands(&mut commander, Arc::new(provider)).unwrap();
        (commander, sink)
    }

    fn inbound(text: &str) -> serde_json::Value {
        json!({
            "message_uuid": "aaaaaaaa-bbbb-cccc-dddd-0123456789ab",
            "from": {"type": "sms", "number": "447700900000"},
            "to": {"type": "sms", "number": "14157386102"},
            "message": {"content": {"type": "text", "text": text}}
        })
    }

    #[tokio::test]
    async fn test_inbound_provider_error_is_acknowledged() {
        let mut provider = MockAirQualityProvider::new();
        provider
            .expect_search()
            .times(1)
            .returning(|_| Err(ProviderError::Unavailable("Invalid key".to_string())));
        let (commander, sink) = create_commander(provider);
        let url = start_server(commander).await;

        let response = reqwest::Client::new()
            .post(format!("{}/webhook/inbound", url))
            .json(&inbound("brief okhla"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        // The reply is sent before the acknowledgement
        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].0,
            ReplyTarget::Channel {
                kind: ChannelKind::Sms,
                address: "447700900000".to_string(),
            }
        );
        assert_eq!(sent[0].1, ReplyPayload::text("Could not get data. Try Again."));
    }

    #[tokio::test]
    async fn test_inbound_unknown_command_is_acknowledged() {
        let (commander, sink) = create_commander(MockAirQualityProvider::new());
        let expected = responses::supported_commands(&commander);
        let url = start_server(commander).await;

        let response = reqwest::Client::new()
            .post(format!("{}/webhook/inbound", url))
            .json(&inbound("xyz foo"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, expected);
    }

    #[tokio::test]
    async fn test_inbound_malformed_body_is_acknowledged() {
        let (commander, sink) = create_commander(MockAirQualityProvider::new());
        let url = start_server(commander).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/webhook/inbound", url))
            .body("not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let response = client
            .post(format!("{}/webhook/inbound", url))
            .json(&json!({"message_uuid": "x", "from": {"type": "sms"}, "message": {"content": {}}}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_inbound_handler_panic_is_acknowledged() {
        let sink = Arc::new(RecordingSink::default());
        let mut commander = Commander::new(None, sink.clone());
        commander
            .register(CommandDefinition::new("boom", Arc::new(PanickingHandler)))
            .unwrap();
        let url = start_server(commander).await;

        let response = reqwest::Client::new()
            .post(format!("{}/webhook/inbound", url))
            .json(&inbound("boom"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_status_is_acknowledged() {
        let (commander, _) = create_commander(MockAirQualityProvider::new());
        let url = start_server(commander).await;

        let response = reqwest::Client::new()
            .post(format!("{}/webhook/status", url))
            .json(&json!({
                "message_uuid": "aaaaaaaa-bbbb-cccc-dddd-0123456789ab",
                "status": "delivered",
                "timestamp": "2020-06-05T14:00:00.000Z"
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }
}
