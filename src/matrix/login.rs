//! Login and session restoration.
//!
//! The first start logs in with the account password and persists the
//! resulting access token. Later starts restore that token from disk. Only a
//! token the homeserver reports as unknown, or a session of another account,
//! leads to a new password login, on a fresh store.

use anyhow::Context;
use log::{debug, info, warn};
use matrix_sdk::{
    Client,
    ruma::{OwnedUserId, api::client::error::ErrorKind},
};

use crate::matrix::{UserCredentials, session::MatrixSession};

/// Name of the device the bot registers on login.
const DEVICE_DISPLAY_NAME: &str = "aqibot";

/// Returns a logged in client, restoring the persisted session when possible.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the password login
/// fails.
pub async fn setup_client(
    user_credentials: &UserCredentials,
    matrix_session: &mut MatrixSession,
) -> anyhow::Result<Client> {
    if let Some(user_session) = matrix_session.user_session().cloned() {
        if user_session.meta.user_id.as_str() == user_credentials.user_id {
            info!("restoring matrix session from disk");

            let (client, _) = build_client(user_credentials, matrix_session).await?;
            client
                .restore_session(user_session)
                .await
                .context("error restoring matrix session")?;

            match client.whoami().await {
                Ok(_) => {
                    info!("matrix session restored successfully");
                    return Ok(client);
                }
                Err(e) if is_token_revoked(e.client_api_error_kind()) => {
                    warn!("matrix access token was revoked, logging in again");
                }
                Err(e) => {
                    warn!("could not check matrix session, keeping it: {}", e);
                    return Ok(client);
                }
            }
        } else {
            warn!(
                "persisted session belongs to {}, logging in as {}",
                user_session.meta.user_id, user_credentials.user_id
            );
        }

        matrix_session
            .clear()
            .await
            .context("error clearing matrix session")?;
    }

    create_session(user_credentials, matrix_session).await
}

/// Whether the homeserver refused the access token itself.
///
/// Any other failure (network, rate limit, server error) says nothing about
/// the token.
fn is_token_revoked(kind: Option<&ErrorKind>) -> bool {
    matches!(kind, Some(ErrorKind::UnknownToken { .. }))
}

async fn build_client(
    user_credentials: &UserCredentials,
    matrix_session: &MatrixSession,
) -> anyhow::Result<(Client, OwnedUserId)> {
    let user_id: OwnedUserId = user_credentials
        .user_id
        .as_str()
        .try_into()
        .with_context(|| format!("invalid matrix user id {}", user_credentials.user_id))?;

    let client = Client::builder()
        .server_name(user_id.server_name())
        .sqlite_store(
            matrix_session.sqlite_path(),
            user_credentials.store_passphrase.as_deref(),
        )
        .build()
        .await?;
    debug!("matrix client created");

    Ok((client, user_id))
}

async fn create_session(
    user_credentials: &UserCredentials,
    matrix_session: &MatrixSession,
) -> anyhow::Result<Client> {
    info!("logging in as {}", user_credentials.user_id);

    let (client, user_id) = build_client(user_credentials, matrix_session).await?;
    client
        .matrix_auth()
        .login_username(user_id, &user_credentials.password)
        .initial_device_display_name(DEVICE_DISPLAY_NAME)
        .send()
        .await?;

    let user_session = client
        .matrix_auth()
        .session()
        .context("no matrix session after login")?;
    matrix_session
        .persist_user_session(&user_session)
        .await
        .context("error persisting user session")?;

    info!("matrix login complete");
    Ok(client)
}
