//! Matrix transport of the bot.
//!
//! # Architecture
//!
//! The module is structured around [`MatrixClient`], which coordinates:
//! - **Login**: password login or restoration of the persisted access token
//! - **Session**: the JSON session file and the SQLite store of the SDK
//! - **Sync**: auto-joining invited rooms and forwarding room messages

mod client;
mod login;
mod session;
mod sync;

pub use crate::matrix::client::MatrixClient;
pub use crate::matrix::sync::RoomMessage;

/// Credentials of the bot's Matrix account.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    /// User ID of the matrix account
    pub user_id: String,
    /// Password of the matrix account
    pub password: String,
    /// Passphrase encrypting the local SQLite store, none to keep it in clear
    pub store_passphrase: Option<String>,
}
