//! Webhook transport of the bot.
//!
//! The Vonage Messages API posts every message sent to the bot's number or
//! Facebook page to `/webhook/inbound`, and delivery receipts of the bot's own
//! messages to `/webhook/status`. Replies are not part of the HTTP response:
//! they are pushed back through [`VonageSink`](crate::reply::VonageSink).

mod payload;
mod server;

pub use crate::webhook::server::serve;
