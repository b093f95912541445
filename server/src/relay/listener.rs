use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::RelayState;
use super::connection::handle_relay_connection;

/// Start the game-server relay listener. Accepts connections and spawns a
/// handler task for each. Stops accepting when the cancellation token is
/// triggered.
pub async fn start_relay_listener(
    bind_addr: &str,
    state: Arc<RelayState>,
    cancel: CancellationToken,
) {
    let listener = TcpListener::bind(bind_addr)
        .await
        .expect("failed to bind relay listener");

    info!("relay listener started on {}", bind_addr);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("relay listener shutting down");
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        let state = state.clone();
                        let peer = addr.to_string();
                        tokio::spawn(async move {
                            handle_relay_connection(stream, peer, state).await;
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "failed to accept relay connection");
                    }
                }
            }
        }
    }
}
