use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::MessageStyle;
use crate::db::entity::{Entity, EntityType};
use crate::db::queries::entities::{DirectoryError, fetch_entity};
use crate::protocol::Message;

use super::{RelayState, router};

/// Maximum bytes per relay frame.
const MAX_FRAME_LENGTH: usize = 4096;
/// Idle timeout — disconnect game servers that send nothing for 5 minutes.
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Handle one game-server connection from accept to close.
///
/// Each socket read yields one frame. A frame that fails to decode, or whose
/// origin entity is unknown, is logged and skipped; the connection carries
/// on with the next frame.
pub async fn handle_relay_connection(stream: TcpStream, peer: String, state: Arc<RelayState>) {
    info!(%peer, "game server connected");

    let (mut reader, mut writer) = stream.into_split();

    // Channel for outbound frames (server-bound traffic routed to us)
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    let write_handle = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if writer.write_all(&frame).await.is_err() {
                break;
            }
        }
    });

    // Entity id this connection authenticated as (by its frame headers)
    let mut bound_entity: Option<String> = None;
    let mut buf = vec![0u8; MAX_FRAME_LENGTH];

    loop {
        let n = match tokio::time::timeout(IDLE_TIMEOUT, reader.read(&mut buf)).await {
            Ok(Ok(0)) => break, // EOF
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                debug!(%peer, error = %e, "read error");
                break;
            }
            Err(_) => {
                info!(%peer, "idle timeout");
                break;
            }
        };

        let message = match Message::decode(&buf[..n]) {
            Ok(message) => message,
            Err(e) => {
                warn!(%peer, error = %e, "dropping malformed frame");
                continue;
            }
        };

        let origin = match fetch_entity(&state.db, message.entity_name()).await {
            Ok(origin) => origin,
            Err(DirectoryError::NotFound) => {
                warn!(%peer, entity = message.entity_name(), "frame from unregistered entity");
                continue;
            }
            Err(e) => {
                warn!(%peer, error = %e, "directory lookup failed");
                continue;
            }
        };

        if origin.entity_type != EntityType::Server {
            warn!(%peer, entity = %origin.id, "relay socket frames must originate from a server entity");
            continue;
        }

        // First valid frame binds the connection, so channel-bound replies
        // and cross-server relay can find their way back.
        if bound_entity.as_deref() != Some(origin.id.as_str()) {
            state.registry.register(&origin.id, out_tx.clone());
            bound_entity = Some(origin.id.clone());
        }

        dispatch(&state, &origin, &message).await;
    }

    if let Some(id) = bound_entity {
        state.registry.unregister(&id);
    }
    drop(out_tx);
    let _ = write_handle.await;
    info!(%peer, "game server disconnected");
}

/// Route one message and fan deliveries out. Destinations are independent:
/// each delivery runs as its own task and failures only affect that
/// destination.
pub async fn dispatch(state: &Arc<RelayState>, origin: &Entity, message: &Message) {
    let destinations = match router::route(&state.db, origin).await {
        Ok(destinations) => destinations,
        Err(e) => {
            warn!(error = %e, entity = %origin.id, "routing failed");
            return;
        }
    };

    for dest in destinations {
        let state = state.clone();
        let message = message.clone();
        tokio::spawn(async move {
            deliver(&state, &dest, &message).await;
        });
    }
}

/// Deliver one message to one destination entity.
async fn deliver(state: &RelayState, dest: &Entity, message: &Message) {
    match dest.entity_type {
        EntityType::Server => {
            if !state.registry.send(&dest.id, message.marshal()) {
                debug!(entity = %dest.id, "destination server not connected");
            }
        }
        EntityType::Channel => {
            let result = match state.config.bot.message_style {
                MessageStyle::Plain => {
                    state
                        .discord
                        .send_plain(&dest.id, &message.plain(&state.config.messages))
                        .await
                }
                MessageStyle::Embed => state.discord.send_embed(&dest.id, &message.embed()).await,
                MessageStyle::Webhook => {
                    let params = message
                        .webhook(&state.resolver, &state.config.messages)
                        .await;
                    state.discord.send_webhook(&dest.id, &params).await
                }
            };
            if let Err(e) = result {
                warn!(channel = %dest.id, error = %e, "discord delivery failed");
            }
        }
        EntityType::All => {
            // Wildcard rows are rejected at create time; nothing to do.
            warn!(entity = %dest.id, "wildcard entity reached delivery");
        }
    }
}
