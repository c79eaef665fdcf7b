//! Bot command parsing and dispatching.
//!
//! This module provides the command pipeline shared by every transport the bot
//! listens on.
//!
//! # Overview
//!
//! 1. **Parsing** - the [`Commander`] strips the trigger prefix, tokenizes the
//!    text and matches the first token against registered names and aliases
//! 2. **Validation** - required positional arguments are counted and the
//!    trailing variadic capture is joined into one argument
//! 3. **Execution** - the matching action handler runs with the parsed
//!    arguments and the [`InboundContext`] of the message
//! 4. **Response** - the handler pushes its answer through the
//!    [`ReplySink`](crate::reply::ReplySink) bound to the transport
//!
//! # Architecture
//!
//! ```text
//! Inbound message
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Commander  │  ← parse() + parse_and_dispatch()
//! └─────────────┘
//!      │
//!      ├── ParseError ──────────► help payload (sent by the intake)
//!      │
//!      ▼
//! ┌─────────────────────┐
//! │ Action Handlers     │
//! │  - brief            │
//! │  - info             │
//! │  - act              │
//! │  - help             │
//! └─────────────────────┘
//!      │
//!      ▼
//!  ReplySink::send(payload, context)
//! ```
//!
//! # Available Commands
//!
//! | Command | Aliases | Arguments | Description |
//! |---------|---------|-----------|-------------|
//! | `brief` | `b` | `<station-terms...>` | Current AQI and severity of a station |
//! | `info` | `i` | `<station-terms...>` | Pollutant and weather details of a station |
//! | `act` | | None | What one can do about air pollution |
//! | `help` | `h` | None | Display help information |
//!
//! # Context Scoping
//!
//! An [`InboundContext`] is built once per inbound event and passed by
//! reference down to the sink. It is never stored anywhere shared, so two
//! messages handled concurrently cannot swap their reply targets.

use serde::Deserialize;

pub mod actions;
mod command;
mod commander;
pub mod responses;

pub use crate::commands::command::{
    Arity, CommandDefinition, CommandHandler, DispatchError, HandlerContext, Invocation,
    ParseError, RegistrationError,
};
pub use crate::commands::commander::Commander;

/// The transport an inbound message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// A long-lived chat session (Matrix)
    ChatSession,
    /// A one-shot inbound webhook (Vonage Messages)
    Webhook,
}

/// Messaging channel of a webhook sender, as named by the Vonage Messages API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Messenger,
    Sms,
    Mms,
    Whatsapp,
    ViberServiceMsg,
}

impl ChannelKind {
    /// Name of the channel in the Messages API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Messenger => "messenger",
            ChannelKind::Sms => "sms",
            ChannelKind::Mms => "mms",
            ChannelKind::Whatsapp => "whatsapp",
            ChannelKind::ViberServiceMsg => "viber_service_msg",
        }
    }

    /// Messenger addresses parties by page-scoped id, every other channel by phone number.
    pub fn address_field(&self) -> &'static str {
        match self {
            ChannelKind::Messenger => "id",
            _ => "number",
        }
    }
}

/// Where a reply to an inbound message must be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyTarget {
    /// Reply in a Matrix room, threaded on the triggering event
    Room {
        /// Matrix room ID
        room_id: String,
        /// Event ID of the message being answered
        event_id: String,
    },
    /// Push a message back to a webhook sender
    Channel {
        /// Channel the sender used
        kind: ChannelKind,
        /// Phone number or messenger id of the sender
        address: String,
    },
}

/// Per-message context threaded from the intake down to the reply sink.
///
/// # Examples
///
/// ```ignore
/// let context = InboundContext {
///     sender: "@alice:example.com".to_string(),
///     transport: TransportKind::ChatSession,
///     reply_to: ReplyTarget::Room {
///         room_id: "!room:example.com".to_string(),
///         event_id: "$event:example.com".to_string(),
///     },
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundContext {
    /// Identity of the sender (Matrix user id, phone number or messenger id)
    pub sender: String,
    /// Transport the message arrived on
    pub transport: TransportKind,
    /// Address used by the sink to answer
    pub reply_to: ReplyTarget,
}

impl InboundContext {
    /// Builds the context of a Matrix room message.
    pub fn room(sender: &str, room_id: &str, event_id: &str) -> Self {
        InboundContext {
            sender: sender.to_string(),
            transport: TransportKind::ChatSession,
            reply_to: ReplyTarget::Room {
                room_id: room_id.to_string(),
                event_id: event_id.to_string(),
            },
        }
    }

    /// Builds the context of an inbound webhook message.
    pub fn channel(kind: ChannelKind, address: &str) -> Self {
        InboundContext {
            sender: address.to_string(),
            transport: TransportKind::Webhook,
            reply_to: ReplyTarget::Channel {
                kind,
                address: address.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_context() {
        let context = InboundContext::room("@alice:example.com", "!room:example.com", "$ev");

        assert_eq!(context.sender, "@alice:example.com");
        assert_eq!(context.transport, TransportKind::ChatSession);
        assert_eq!(
            context.reply_to,
            ReplyTarget::Room {
                room_id: "!room:example.com".to_string(),
                event_id: "$ev".to_string(),
            }
        );
    }

    #[test]
    fn test_channel_context() {
        let context = InboundContext::channel(ChannelKind::Whatsapp, "447700900000");

        assert_eq!(context.sender, "447700900000");
        assert_eq!(context.transport, TransportKind::Webhook);
    }

    #[test]
    fn test_channel_kind_addressing() {
        assert_eq!(ChannelKind::Messenger.address_field(), "id");
        assert_eq!(ChannelKind::Whatsapp.address_field(), "number");
        assert_eq!(ChannelKind::Sms.address_field(), "number");
    }

    #[test]
    fn test_channel_kind_deserialize() {
        let kind: ChannelKind = serde_json::from_str(r#""viber_service_msg""#).unwrap();
        assert_eq!(kind, ChannelKind::ViberServiceMsg);
        assert_eq!(kind.as_str(), "viber_service_msg");
    }
}
