//! Persistence of the Matrix login between restarts.

use std::path::{Path, PathBuf};

use tokio::fs;

use log::{debug, trace};
use matrix_sdk::authentication::matrix;
use serde::{Deserialize, Serialize};

/// Login and sync position, stored as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Session {
    /// Access token and device of the bot
    user_session: matrix::MatrixSession,

    /// Position of the last sync, absent until the first sync completes
    #[serde(skip_serializing_if = "Option::is_none")]
    sync_token: Option<String>,
}

/// Session store of the Matrix transport.
///
/// # File Structure
///
/// The session directory contains:
/// - `session`: JSON file with the login and the sync token
/// - `sqlite`: SQLite store of the Matrix SDK
#[derive(Debug, Clone)]
pub struct MatrixSession {
    /// The stored login, if any
    session: Option<Session>,
    /// Value is `dir_path/sqlite`
    sqlite_path: PathBuf,
    /// Value is `dir_path/session`
    session_path: PathBuf,
}

impl MatrixSession {
    /// Opens the session store in `dir_path`, creating the directory if needed.
    ///
    /// A missing or unreadable session file means the bot has to log in again.
    pub async fn new(dir_path: &Path) -> anyhow::Result<MatrixSession> {
        debug!("read session at {}", dir_path.display());
        fs::create_dir_all(dir_path).await?;

        let sqlite_path = dir_path.join("sqlite");
        let session_path = dir_path.join("session");

        let session = match MatrixSession::get_session(&session_path).await {
            Ok(session) => Some(session),
            Err(e) => {
                debug!("no usable session at {}: {}", session_path.display(), e);
                None
            }
        };

        Ok(MatrixSession {
            session,
            sqlite_path,
            session_path,
        })
    }

    async fn get_session(session_path: &Path) -> anyhow::Result<Session> {
        if !fs::try_exists(session_path).await.unwrap_or_default() {
            anyhow::bail!("session file does not exist");
        }

        let session_data = fs::read_to_string(session_path).await?;
        Ok(serde_json::from_str(&session_data)?)
    }

    /// Path of the SQLite store of the Matrix SDK.
    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn user_session(&self) -> Option<&matrix::MatrixSession> {
        self.session.as_ref().map(|s| &s.user_session)
    }

    /// Position to resume syncing from.
    pub fn sync_token(&self) -> Option<String> {
        self.session.as_ref().and_then(|s| s.sync_token.clone())
    }

    /// Stores `sync_token` next to the persisted login.
    pub async fn persist_sync_token(&self, sync_token: String) -> anyhow::Result<()> {
        trace!("persist sync token {}", sync_token);

        let mut full_session = MatrixSession::get_session(&self.session_path).await?;
        full_session.sync_token = Some(sync_token);
        fs::write(&self.session_path, serde_json::to_string(&full_session)?).await?;

        trace!("sync token persisted");
        Ok(())
    }

    /// Stores a fresh login, dropping any previous sync token.
    pub async fn persist_user_session(
        &self,
        user_session: &matrix::MatrixSession,
    ) -> anyhow::Result<()> {
        trace!("persist user session");

        let session = Session {
            user_session: user_session.clone(),
            sync_token: None,
        };
        fs::write(&self.session_path, serde_json::to_string(&session)?).await?;

        trace!("user session persisted");
        Ok(())
    }

    /// Deletes the stored login and the SQLite store.
    ///
    /// The store holds the encryption keys of the logged in device, so it has
    /// to go before logging in as a new device.
    pub async fn clear(&mut self) -> anyhow::Result<()> {
        debug!("clear session at {}", self.session_path.display());

        if fs::try_exists(&self.sqlite_path).await? {
            fs::remove_dir_all(&self.sqlite_path).await?;
        }
        if fs::try_exists(&self.session_path).await? {
            fs::remove_file(&self.session_path).await?;
        }
        self.session = None;

        Ok(())
    }
}
