//! Matrix client wrapper.
//!
//! [`MatrixClient`] hides the Matrix SDK behind the three things the bot
//! needs: logging in, receiving room messages and replying to them.

use std::path::Path;

use log::{error, info, warn};
use matrix_sdk::{
    Client,
    ruma::{
        EventId, RoomId, UserId,
        events::room::message::{
            AddMentions, ForwardThread, ReplyMetadata, RoomMessageEventContent,
        },
    },
};

use crate::{
    matrix::{
        UserCredentials,
        login::setup_client,
        session::MatrixSession,
        sync::{MatrixSync, RoomMessage},
    },
    reply::DeliveryError,
};

/// Logged in Matrix client of the bot.
pub struct MatrixClient {
    /// Synchronization service for handling real-time events
    matrix_sync: MatrixSync,
    /// Underlying Matrix SDK client
    client: Client,
}

impl MatrixClient {
    /// Logs in (or restores the session stored in `session_path`) and sets
    /// the display name of the bot.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be opened or the
    /// homeserver refuses the login.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let credentials = UserCredentials {
    ///     user_id: "@aqibot:example.com".to_string(),
    ///     password: "secure_password".to_string(),
    ///     store_passphrase: None,
    /// };
    ///
    /// let client = MatrixClient::new(&credentials, Path::new("./data/matrix"), "AQI Bot").await?;
    /// ```
    pub async fn new(
        user_credentials: &UserCredentials,
        session_path: &Path,
        display_name: &str,
    ) -> anyhow::Result<Self> {
        let mut matrix_session = MatrixSession::new(session_path).await?;
        let client = setup_client(user_credentials, &mut matrix_session).await?;

        if let Err(e) = client.account().set_display_name(Some(display_name)).await {
            warn!("failed to set display name: {}", e);
        }

        let matrix_sync = MatrixSync::new(&client, &matrix_session);

        Ok(MatrixClient {
            matrix_sync,
            client,
        })
    }

    /// Runs the sync loop, calling `on_message` for each new text message.
    ///
    /// Only returns once the sync loop ended, which is logged.
    pub async fn sync<F>(&self, on_message: F)
    where
        F: Fn(RoomMessage) + Send + Sync + 'static,
    {
        match self.matrix_sync.sync(on_message).await {
            Ok(_) => info!("matrix sync ended successfully"),
            Err(e) => error!("matrix sync ended with error: {:?}", e),
        }
    }

    /// Sends `body` as Markdown, in reply to the event `event_id` of `sender_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::InvalidTarget`] if an identifier is malformed
    /// or the bot is not in the room, and [`DeliveryError::Transport`] if the
    /// homeserver rejects the message.
    pub async fn send_reply(
        &self,
        room_id: &str,
        sender_id: &str,
        event_id: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        let room_id = RoomId::parse(room_id)
            .map_err(|e| DeliveryError::InvalidTarget(format!("room {}: {}", room_id, e)))?;
        let sender = UserId::parse(sender_id)
            .map_err(|e| DeliveryError::InvalidTarget(format!("user {}: {}", sender_id, e)))?;
        let event = EventId::parse(event_id)
            .map_err(|e| DeliveryError::InvalidTarget(format!("event {}: {}", event_id, e)))?;

        let room = self.client.get_room(&room_id).ok_or_else(|| {
            DeliveryError::InvalidTarget(format!("bot is not in room {}", room_id))
        })?;

        let content = RoomMessageEventContent::text_markdown(body).make_reply_to(
            ReplyMetadata::new(&event, &sender, None),
            ForwardThread::No,
            AddMentions::No,
        );

        room.send(content)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        Ok(())
    }
}
