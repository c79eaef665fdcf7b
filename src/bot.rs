//! Bot module wiring the transports to the command router.
//!
//! # Architecture
//!
//! Every configured transport gets its own [`Commander`], holding the same
//! commands and the same air quality provider but its own reply sink:
//!
//! 1. **Matrix Sync Task**: listens to the rooms the bot joined, answers the
//!    messages starting with the trigger prefix through a [`MatrixSink`].
//! 2. **Webhook Server Task**: receives the Vonage Messages webhooks, answers
//!    every inbound text through a [`VonageSink`].
//!
//! Each inbound message is handled in its own task with its own
//! [`InboundContext`], so a slow provider request never holds back other
//! senders.
//!
//! # Command Processing Flow
//!
//! ```text
//! Inbound Message → Inbound Context → Parse Command → Handler → Reply Sink
//! ```

use std::{net::SocketAddr, path::Path, sync::Arc};

use futures::future::join_all;
use log::{error, info};
use tokio::task::JoinHandle;

use crate::{
    aqi::{AirQualityProvider, WaqiRequester},
    commands::{Commander, InboundContext, actions::register_commands},
    config::Config,
    intake::handle_message,
    matrix::{MatrixClient, RoomMessage, UserCredentials},
    reply::{MatrixSink, VonageCredentials, VonageSink},
    webhook,
};

/// Display name of the bot in Matrix rooms.
const DISPLAY_NAME: &str = "AQI Bot";

/// Chat transport: the logged in client and its router.
struct MatrixTransport {
    client: Arc<MatrixClient>,
    commander: Arc<Commander>,
}

/// Webhook transport: the listening address and its router.
struct WebhookTransport {
    bind: SocketAddr,
    commander: Arc<Commander>,
}

/// The configured transports, ready to be started.
pub struct Bot {
    matrix: Option<MatrixTransport>,
    webhook: Option<WebhookTransport>,
}

impl Bot {
    /// Builds the routers of every configured transport.
    ///
    /// Logs in to Matrix when the `matrix` section is present, storing the
    /// session in `data_path/matrix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Matrix login fails or if two commands share a
    /// name.
    pub async fn new(config: Config, data_path: &str) -> anyhow::Result<Self> {
        let provider: Arc<dyn AirQualityProvider> =
            Arc::new(WaqiRequester::new(&config.waqi.url, &config.waqi.token));

        let matrix = match config.matrix {
            Some(matrix) => {
                let client = Arc::new(
                    MatrixClient::new(
                        &UserCredentials {
                            user_id: matrix.user_id,
                            password: matrix.password,
                            store_passphrase: matrix.store_passphrase,
                        },
                        &Path::new(data_path).join("matrix"),
                        DISPLAY_NAME,
                    )
                    .await?,
                );

                let mut commander = Commander::new(
                    Some(matrix.trigger.as_str()),
                    Arc::new(MatrixSink::new(Arc::clone(&client))),
                );
                register_commands(&mut commander, Arc::clone(&provider))?;

                Some(MatrixTransport {
                    client,
                    commander: Arc::new(commander),
                })
            }
            None => None,
        };

        let webhook = match config.webhook {
            Some(section) => {
                let vonage = section.vonage;
                let sink = VonageSink::new(VonageCredentials {
                    url: vonage.url,
                    api_key: vonage.api_key,
                    api_secret: vonage.api_secret,
                    number: vonage.number,
                    page_id: vonage.page_id,
                });

                let mut commander = Commander::new(None, Arc::new(sink));
                register_commands(&mut commander, Arc::clone(&provider))?;

                Some(WebhookTransport {
                    bind: section.bind,
                    commander: Arc::new(commander),
                })
            }
            None => None,
        };

        Ok(Bot { matrix, webhook })
    }

    /// Runs every transport until all of them stopped.
    pub async fn start(self) {
        let mut tasks: Vec<JoinHandle<()>> = Vec::new();

        if let Some(matrix) = self.matrix {
            info!("starting matrix transport");
            tasks.push(tokio::spawn(Self::run_matrix(matrix)));
        }

        if let Some(transport) = self.webhook {
            info!("starting webhook transport on {}", transport.bind);
            tasks.push(tokio::spawn(async move {
                if let Err(e) = webhook::serve(transport.bind, transport.commander).await {
                    error!("webhook server stopped: {}", e);
                }
            }));
        }

        for result in join_all(tasks).await {
            if let Err(e) = result {
                error!("transport task failed: {}", e);
            }
        }
    }

    async fn run_matrix(matrix: MatrixTransport) {
        let commander = matrix.commander;

        matrix
            .client
            .sync(move |message: RoomMessage| {
                let commander = Arc::clone(&commander);
                tokio::spawn(async move {
                    let context =
                        InboundContext::room(&message.sender, &message.room_id, &message.event_id);
                    handle_message(&commander, &message.body, &context).await;
                });
            })
            .await;
    }
}
