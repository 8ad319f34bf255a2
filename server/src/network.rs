//! WebSocket transport layer
//!
//! Owns the listening socket and one task per connection. Each connection is
//! reduced to the two channels the engine understands: a write pump that
//! turns request frames into JSON text on the socket, and a read loop that
//! turns well-formed responses into answer strings. Anything garbled is
//! logged and dropped; the engine only ever hears "an answer arrived" or
//! "the connection went away".

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};

use shared::parse_answer;

use crate::error::Result;
use crate::manager::GameManager;

/// Accepts player connections and hands each one to the game manager.
pub struct WsServer {
    listener: TcpListener,
}

impl WsServer {
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self, manager: Arc<GameManager>) -> Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer, manager).await {
                    warn!("Connection from {} ended with error: {}", peer, e);
                }
            });
        }
    }
}

/// Runs one connection from WebSocket handshake to terminal status.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    manager: Arc<GameManager>,
) -> Result<()> {
    let ws = accept_async(stream).await?;
    let (mut sink, mut source) = ws.split();

    let (request_tx, mut request_rx) = mpsc::unbounded_channel();
    let (answer_tx, answer_rx) = mpsc::unbounded_channel();

    // Write pump: frames from the proxy onto the socket. When the proxy is
    // released and dropped the channel closes; the pump drains whatever is
    // still queued first, so eliminated players get their final messages.
    let writer = tokio::spawn(async move {
        while let Some(request) = request_rx.recv().await {
            let text = match serde_json::to_string(&request) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Dropping unencodable frame: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Read loop: responses into the answer channel. Exiting drops the
    // sender, which is exactly what the proxy observes as a disconnect.
    let reader = tokio::spawn(async move {
        while let Some(message) = source.next().await {
            match message {
                Ok(Message::Text(text)) => match parse_answer(&text) {
                    Some(answer) => {
                        if answer_tx.send(answer).is_err() {
                            break;
                        }
                    }
                    None => warn!("Ignoring malformed message from client"),
                },
                Ok(Message::Close(_)) | Err(_) => break,
                // Pings are answered by tungstenite; nothing else is protocol
                Ok(_) => {}
            }
        }
    });

    let (player_id, done) = manager.register(request_tx, answer_rx).await;
    debug!("Player {} connected from {}", player_id, peer);

    // Park here until the engine hands control back.
    match done.await {
        Ok(status) => info!("Player {} released with status {:?}", player_id, status),
        Err(_) => warn!(
            "Player {} released without a status (session went away)",
            player_id
        ),
    }

    // The proxy is gone by now, so the pump drains and closes the socket.
    let _ = writer.await;
    reader.abort();
    Ok(())
}
