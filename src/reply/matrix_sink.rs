//! Reply sink answering in Matrix rooms.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    commands::{InboundContext, ReplyTarget},
    matrix::MatrixClient,
    reply::{DeliveryError, ReplyPayload, ReplySink},
};

/// Delivers replies as Markdown messages threaded on the triggering event.
pub struct MatrixSink {
    client: Arc<MatrixClient>,
}

impl MatrixSink {
    pub fn new(client: Arc<MatrixClient>) -> Self {
        MatrixSink { client }
    }
}

#[async_trait]
impl ReplySink for MatrixSink {
    async fn send(
        &self,
        payload: &ReplyPayload,
        context: &InboundContext,
    ) -> Result<(), DeliveryError> {
        let ReplyTarget::Room { room_id, event_id } = &context.reply_to else {
            return Err(DeliveryError::InvalidTarget(format!(
                "cannot reply in a room to {:?}",
                context.reply_to
            )));
        };

        self.client
            .send_reply(room_id, &context.sender, event_id, &payload.to_markdown())
            .await
    }
}
