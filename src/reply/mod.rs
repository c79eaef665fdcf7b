//! Transport-agnostic reply delivery.
//!
//! Command handlers never talk to Matrix or to the Vonage API directly. They
//! build a [`ReplyPayload`] and hand it to a [`ReplySink`] together with the
//! [`InboundContext`] of the message being answered. The sink uses the reply
//! target captured in that context to address the answer.
//!
//! # Implementations
//!
//! - [`MatrixSink`] - replies in the Matrix room the message came from,
//!   threaded on the triggering event
//! - [`VonageSink`] - pushes a text message through the Vonage Messages API to
//!   the number or messenger id that sent the inbound webhook

use async_trait::async_trait;
use thiserror::Error;

use crate::commands::InboundContext;

mod matrix_sink;
mod vonage_sink;

pub use crate::reply::matrix_sink::MatrixSink;
pub use crate::reply::vonage_sink::{VonageCredentials, VonageSink};

/// A message ready to be delivered to the sender of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPayload {
    /// Plain text, sent as is.
    Text(String),
    /// A titled message with an optional list of fields.
    ///
    /// Chat transports render it as rich text, the webhook transport
    /// flattens it to plain text.
    Structured {
        /// Title of the message
        title: String,
        /// Main body
        description: String,
        /// Additional `(name, value)` pairs
        fields: Vec<(String, String)>,
    },
}

impl ReplyPayload {
    /// Creates a plain text payload.
    pub fn text(text: impl Into<String>) -> Self {
        ReplyPayload::Text(text.into())
    }

    /// Creates a structured payload without fields.
    pub fn structured(title: impl Into<String>, description: impl Into<String>) -> Self {
        ReplyPayload::Structured {
            title: title.into(),
            description: description.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field to a structured payload. Plain text payloads are left untouched.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let ReplyPayload::Structured { fields, .. } = &mut self {
            fields.push((name.into(), value.into()));
        }
        self
    }

    /// Renders the payload as Markdown.
    ///
    /// The structured description is wrapped in a code block so command
    /// listings keep their alignment.
    pub fn to_markdown(&self) -> String {
        match self {
            ReplyPayload::Text(text) => text.clone(),
            ReplyPayload::Structured {
                title,
                description,
                fields,
            } => {
                let mut body = format!("**{}**\n\n```\n{}\n```", title, description);
                for (name, value) in fields {
                    body.push_str(&format!("\n- **{}**: {}", name, value));
                }
                body
            }
        }
    }

    /// Renders the payload as plain text.
    pub fn to_plain_text(&self) -> String {
        match self {
            ReplyPayload::Text(text) => text.clone(),
            ReplyPayload::Structured {
                title,
                description,
                fields,
            } => {
                let mut body = format!("{}:\n{}", title, description);
                for (name, value) in fields {
                    body.push_str(&format!("\n{}: {}", name, value));
                }
                body
            }
        }
    }
}

/// Errors raised while delivering a reply.
///
/// Delivery failures are logged by the caller and never retried: the user has
/// no channel left to receive an error about the channel itself.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The push API answered with a non-success status.
    #[error("push api answered {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as returned by the API
        body: String,
    },
    /// The HTTP request could not be performed.
    #[error("push request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The inbound context does not carry a target this sink can address.
    #[error("invalid reply target: {0}")]
    InvalidTarget(String),
    /// The chat session refused or dropped the message.
    #[error("chat transport error: {0}")]
    Transport(String),
}

/// Delivers replies to the party who sent an inbound message.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Sends `payload` to the reply target captured in `context`.
    async fn send(
        &self,
        payload: &ReplyPayload,
        context: &InboundContext,
    ) -> Result<(), DeliveryError>;
}
