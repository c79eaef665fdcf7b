//! Request bodies posted by the Vonage Messages API.

use serde::Deserialize;

use crate::commands::{ChannelKind, InboundContext};

/// Body of `POST /webhook/inbound`.
///
/// ```json
/// {
///   "message_uuid": "aaaaaaaa-bbbb-cccc-dddd-0123456789ab",
///   "from": { "type": "sms", "number": "447700900000" },
///   "to": { "type": "sms", "number": "14157386102" },
///   "message": { "content": { "type": "text", "text": "brief okhla" } }
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub message_uuid: Option<String>,
    pub from: Party,
    pub message: Message,
}

/// Sender or recipient of a message.
#[derive(Debug, Deserialize)]
pub struct Party {
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    /// Page-scoped id, messenger only
    pub id: Option<String>,
    /// Phone number, every channel but messenger
    pub number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub content: Content,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    /// Absent for images, audio and other non text contents
    pub text: Option<String>,
}

impl InboundMessage {
    /// Returns the text and the context to answer it, if the message has both.
    pub fn into_parts(self) -> Option<(String, InboundContext)> {
        let address = match self.from.kind {
            ChannelKind::Messenger => self.from.id,
            _ => self.from.number,
        }?;
        let text = self.message.content.text?;

        Some((text, InboundContext::channel(self.from.kind, &address)))
    }
}

/// Body of `POST /webhook/status`.
#[derive(Debug, Deserialize)]
pub struct StatusMessage {
    pub message_uuid: Option<String>,
    pub status: Option<String>,
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ReplyTarget;

    #[test]
    fn test_sms_into_parts() {
        let message: InboundMessage = serde_json::from_str(
            r#"{
                "message_uuid": "aaaaaaaa-bbbb-cccc-dddd-0123456789ab",
                "from": {"type": "sms", "number": "447700900000"},
                "to": {"type": "sms", "number": "14157386102"},
                "message": {"content": {"type": "text", "text": "Brief Okhla"}}
            }"#,
        )
        .unwrap();

        let (text, context) = message.into_parts().unwrap();

        assert_eq!(text, "Brief Okhla");
        assert_eq!(context.sender, "447700900000");
        assert_eq!(
            context.reply_to,
            ReplyTarget::Channel {
                kind: ChannelKind::Sms,
                address: "447700900000".to_string(),
            }
        );
    }

    #[test]
    fn test_messenger_uses_id() {
        let message: InboundMessage = serde_json::from_str(
            r#"{
                "from": {"type": "messenger", "id": "2724316534347445"},
                "message": {"content": {"type": "text", "text": "help"}}
            }"#,
        )
        .unwrap();

        let (_, context) = message.into_parts().unwrap();

        assert_eq!(context.sender, "2724316534347445");
    }

    #[test]
    fn test_non_text_message() {
        let message: InboundMessage = serde_json::from_str(
            r#"{
                "from": {"type": "whatsapp", "number": "447700900000"},
                "message": {"content": {"type": "image", "image": {"url": "https://example.com/a.png"}}}
            }"#,
        )
        .unwrap();

        assert!(message.into_parts().is_none());
    }

    #[test]
    fn test_messenger_without_id() {
        let message: InboundMessage = serde_json::from_str(
            r#"{
                "from": {"type": "messenger", "number": "447700900000"},
                "message": {"content": {"type": "text", "text": "help"}}
            }"#,
        )
        .unwrap();

        assert!(message.into_parts().is_none());
    }
}
