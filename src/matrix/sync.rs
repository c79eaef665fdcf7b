//! Matrix client synchronization and event handling.
//!
//! The [`MatrixSync::sync`] method:
//! 1. Registers the auto-join handler for invitations
//! 2. Performs an initial sync to catch up on events received while offline
//! 3. Registers the message handler, so only new messages are answered
//! 4. Enters the sync loop, persisting the sync token after each response

use std::sync::Arc;

use log::{error, info, warn};
use matrix_sdk::{
    Client, LoopCtrl, Room, RoomState,
    config::SyncSettings,
    ruma::{
        UserId,
        api::client::filter::FilterDefinition,
        events::room::{
            member::StrippedRoomMemberEvent,
            message::{MessageType, OriginalSyncRoomMessageEvent},
        },
    },
};
use tokio::time::{Duration, sleep};

use crate::matrix::session::MatrixSession;

/// Longest wait between two attempts to join a room, in seconds.
const MAX_JOIN_DELAY: u64 = 3600;

/// A text message received in a joined room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMessage {
    /// Text of the message
    pub body: String,
    pub room_id: String,
    /// User who sent the message
    pub sender: String,
    /// Event to reply to
    pub event_id: String,
}

/// Drives the sync loop of a logged in [`Client`].
pub struct MatrixSync {
    client: Client,
    session: MatrixSession,
}

impl MatrixSync {
    pub fn new(client: &Client, session: &MatrixSession) -> Self {
        MatrixSync {
            client: client.to_owned(),
            session: session.to_owned(),
        }
    }

    /// Syncs forever, calling `on_message` for every new text message.
    ///
    /// Messages sent by the bot itself are never passed to `on_message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync loop stops on a fatal error. Failing to
    /// persist the sync token is only logged.
    pub async fn sync<F>(&self, on_message: F) -> anyhow::Result<()>
    where
        F: Fn(RoomMessage) + Send + Sync + 'static,
    {
        info!("start syncing");

        self.client.add_event_handler(auto_join_rooms);

        // See <https://spec.matrix.org/v1.6/client-server-api/#lazy-loading-room-members>.
        let filter = FilterDefinition::with_lazy_loading();
        let mut sync_settings = SyncSettings::default().filter(filter.into());

        if let Some(sync_token) = self.session.sync_token() {
            sync_settings = sync_settings.token(sync_token);
        }

        // Catch up on invitations received while offline
        let mut delay = 2;
        let next_batch = loop {
            match self.client.sync_once(sync_settings.clone()).await {
                Ok(response) => break response.next_batch,
                Err(e) => {
                    error!("an error occurred during initial sync: {e}, retrying in {delay}s");
                    sleep(Duration::from_secs(delay)).await;
                    delay = (delay * 2).min(MAX_JOIN_DELAY);
                }
            }
        };
        self.persist_sync_token(next_batch.clone()).await;

        let on_message = Arc::new(on_message);
        self.client.add_event_handler({
            let on_message = Arc::clone(&on_message);
            move |event: OriginalSyncRoomMessageEvent, room: Room, client: Client| {
                let on_message = Arc::clone(&on_message);
                async move { on_room_message(event, room, client, on_message.as_ref()) }
            }
        });

        sync_settings = sync_settings.token(next_batch);
        self.client
            .sync_with_result_callback(sync_settings, |sync_result| async move {
                let response = sync_result?;
                self.persist_sync_token(response.next_batch).await;
                Ok(LoopCtrl::Continue)
            })
            .await?;

        Ok(())
    }

    async fn persist_sync_token(&self, sync_token: String) {
        if let Err(err) = self.session.persist_sync_token(sync_token).await {
            error!("failed to persist sync token: {:?}", err);
        }
    }
}

/// Joins the room the bot is invited to.
///
/// Synapse may send an invite before the invited user is able to join, so
/// joining is retried with a doubling delay.
/// See <https://github.com/matrix-org/synapse/issues/4345>.
async fn auto_join_rooms(room_member: StrippedRoomMemberEvent, client: Client, room: Room) {
    let Some(user_id) = client.user_id() else {
        warn!("could not get user id from client");
        return;
    };

    if room_member.state_key != user_id {
        return;
    }

    tokio::spawn(async move {
        info!("auto joining room {}", room.room_id());
        let mut delay = 2;

        while let Err(err) = room.join().await {
            error!(
                "failed to join room {} ({err:?}), retrying in {delay}s",
                room.room_id()
            );

            sleep(Duration::from_secs(delay)).await;
            delay *= 2;

            if delay > MAX_JOIN_DELAY {
                error!("can't join room {} ({err:?})", room.room_id());
                return;
            }
        }
        info!("successfully joined room {}", room.room_id());
    });
}

/// Whether a room message is handed to the command router.
///
/// Only text messages of joined rooms are, and never the ones the bot sent
/// itself.
fn should_forward(
    own_user: Option<&UserId>,
    sender: &UserId,
    state: RoomState,
    msgtype: &MessageType,
) -> bool {
    state == RoomState::Joined
        && own_user != Some(sender)
        && matches!(msgtype, MessageType::Text(_))
}

/// Forwards text messages of joined rooms, except the bot's own.
fn on_room_message<F>(event: OriginalSyncRoomMessageEvent, room: Room, client: Client, on_message: &F)
where
    F: Fn(RoomMessage),
{
    if !should_forward(
        client.user_id(),
        &event.sender,
        room.state(),
        &event.content.msgtype,
    ) {
        return;
    }

    let MessageType::Text(text_content) = event.content.msgtype else {
        return;
    };

    on_message(RoomMessage {
        body: text_content.body,
        room_id: room.room_id().to_string(),
        sender: event.sender.to_string(),
        event_id: event.event_id.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use matrix_sdk::ruma::user_id;

    use super::*;

    #[test]
    fn test_should_forward_text_of_joined_room() {
        let bot = user_id!("@aqibot:example.com");
        let alice = user_id!("@alice:example.com");

        assert!(should_forward(
            Some(bot),
            alice,
            RoomState::Joined,
            &MessageType::text_plain("!aqi help")
        ));
        // Logged out client, the sender can't be the bot
        assert!(should_forward(
            None,
            alice,
            RoomState::Joined,
            &MessageType::text_plain("!aqi help")
        ));
    }

    #[test]
    fn test_should_forward_ignores_own_messages() {
        let bot = user_id!("@aqibot:example.com");

        assert!(!should_forward(
            Some(bot),
            bot,
            RoomState::Joined,
            &MessageType::text_plain("!aqi help")
        ));
    }

    #[test]
    fn test_should_forward_ignores_rooms_not_joined() {
        let bot = user_id!("@aqibot:example.com");
        let alice = user_id!("@alice:example.com");

        for state in [RoomState::Invited, RoomState::Left, RoomState::Banned] {
            assert!(!should_forward(
                Some(bot),
                alice,
                state,
                &MessageType::text_plain("!aqi help")
            ));
        }
    }

    #[test]
    fn test_should_forward_ignores_non_text() {
        let bot = user_id!("@aqibot:example.com");
        let alice = user_id!("@alice:example.com");

        assert!(!should_forward(
            Some(bot),
            alice,
            RoomState::Joined,
            &MessageType::notice_plain("!aqi help")
        ));
        assert!(!should_forward(
            Some(bot),
            alice,
            RoomState::Joined,
            &MessageType::emote_plain("!aqi help")
        ));
    }
}
