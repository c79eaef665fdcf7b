//! Reply sink pushing messages through the Vonage Messages API.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    commands::{ChannelKind, InboundContext, ReplyTarget},
    reply::{DeliveryError, ReplyPayload, ReplySink},
};

/// Account and sender identities used to push messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VonageCredentials {
    /// Base url of the Messages API, without trailing slash
    pub url: String,
    pub api_key: String,
    pub api_secret: String,
    /// Number the bot sends sms, mms, whatsapp and viber messages from
    pub number: String,
    /// Facebook page id the bot sends messenger messages from
    pub page_id: String,
}

/// Request body of `POST /v0.1/messages`.
#[derive(Debug, Serialize)]
struct OutboundMessage {
    from: Value,
    to: Value,
    message: MessageBody,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    content: MessageContent,
}

#[derive(Debug, Serialize)]
struct MessageContent {
    #[serde(rename = "type")]
    content_type: &'static str,
    text: String,
}

/// Response body of a successful push.
#[derive(Debug, Deserialize)]
struct PushResponse {
    message_uuid: Option<String>,
}

/// Builds `{"type": <channel>, <id|number>: <address>}`.
fn endpoint(kind: ChannelKind, address: &str) -> Value {
    let mut endpoint = Map::new();
    endpoint.insert("type".to_string(), Value::from(kind.as_str()));
    endpoint.insert(kind.address_field().to_string(), Value::from(address));
    Value::Object(endpoint)
}

/// Delivers replies to the channel address of the inbound webhook message.
///
/// Structured payloads are flattened with [`ReplyPayload::to_plain_text`].
pub struct VonageSink {
    credentials: VonageCredentials,
    client: Client,
}

impl VonageSink {
    pub fn new(credentials: VonageCredentials) -> Self {
        VonageSink {
            credentials: VonageCredentials {
                url: credentials.url.trim_end_matches('/').to_string(),
                ..credentials
            },
            client: Client::new(),
        }
    }

    /// Identity the bot sends from on `kind`.
    fn sender(&self, kind: ChannelKind) -> &str {
        match kind {
            ChannelKind::Messenger => &self.credentials.page_id,
            _ => &self.credentials.number,
        }
    }
}

#[async_trait]
impl ReplySink for VonageSink {
    async fn send(
        &self,
        payload: &ReplyPayload,
        context: &InboundContext,
    ) -> Result<(), DeliveryError> {
        let ReplyTarget::Channel { kind, address } = &context.reply_to else {
            return Err(DeliveryError::InvalidTarget(format!(
                "cannot push a message to {:?}",
                context.reply_to
            )));
        };

        let url = format!("{}/v0.1/messages", &self.credentials.url);
        let body = OutboundMessage {
            from: endpoint(*kind, self.sender(*kind)),
            to: endpoint(*kind, address),
            message: MessageBody {
                content: MessageContent {
                    content_type: "text",
                    text: payload.to_plain_text(),
                },
            },
        };
        debug!("push to {} -> {:?}", &url, &body);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let message_uuid = response
            .json::<PushResponse>()
            .await
            .ok()
            .and_then(|response| response.message_uuid);
        info!(
            "pushed {} message to {}: {}",
            kind.as_str(),
            address,
            message_uuid.as_deref().unwrap_or("no uuid")
        );

        Ok(())
    }
}
