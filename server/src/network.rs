//! Server network layer: TCP accept loop and per-connection relay tasks

use crate::client_manager::ClientManager;
use log::{debug, error, info, trace, warn};
use shared::protocol::read_action;
use shared::{Action, RelayedAction};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};

/// Relay server
///
/// Holds no game state. Every action a client sends is forwarded, prefixed
/// by the sender's UID, to all other connected clients.
pub struct Server {
    listener: TcpListener,
    clients: Arc<RwLock<ClientManager>>,
}

impl Server {
    pub async fn new(addr: &str, max_clients: usize) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
        })
    }

    /// Address actually bound; useful when binding to port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn clients(&self) -> Arc<RwLock<ClientManager>> {
        Arc::clone(&self.clients)
    }

    /// Accepts connections until the task is dropped
    ///
    /// Registration happens on this task, in accept order, so UIDs follow
    /// connection order. Everything after the handshake runs on the
    /// connection's own tasks.
    pub async fn run(&self) -> io::Result<()> {
        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    accept_client(Arc::clone(&self.clients), stream, addr).await;
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

/// Registers a fresh connection and spawns its writer and handler tasks.
async fn accept_client(
    clients: Arc<RwLock<ClientManager>>,
    stream: TcpStream,
    addr: SocketAddr,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not disable Nagle for {}: {}", addr, e);
    }

    let (reader, writer) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel();

    let registered = {
        let mut clients = clients.write().await;
        clients.add_client(addr, tx)
    };

    let client_id = match registered {
        Ok(Some(id)) => id,
        Ok(None) => {
            warn!("Refusing connection from {}: server full", addr);
            return;
        }
        Err(e) => {
            error!("Failed to build handshake for {}: {}", addr, e);
            return;
        }
    };

    spawn_writer(client_id, writer, rx);
    spawn_handler(client_id, reader, clients);
}

/// Spawns the task that drains one client's outgoing queue onto its socket
///
/// The task ends when the client is removed from the roster (the queue's
/// sender is dropped) or when a write fails.
fn spawn_writer(
    client_id: u32,
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    tokio::spawn(async move {
        while let Some(bytes) = rx.recv().await {
            if let Err(e) = writer.write_all(&bytes).await {
                debug!("Write to client {} failed: {}", client_id, e);
                break;
            }
        }
        let _ = writer.shutdown().await;
        trace!("Writer for client {} finished", client_id);
    });
}

/// Spawns the read loop of one connection
///
/// Any read failure, protocol error or an explicit Disconnect ends the loop.
/// The client is then removed and `(uid, Disconnect)` goes to everyone else.
fn spawn_handler(client_id: u32, reader: OwnedReadHalf, clients: Arc<RwLock<ClientManager>>) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);

        loop {
            match read_action(&mut reader).await {
                Ok(Action::Disconnect) => {
                    info!("Client {} sent disconnect", client_id);
                    break;
                }
                Ok(action) => {
                    trace!("Client {} -> {:?}", client_id, action);
                    let bytes = match RelayedAction::new(client_id, action).to_bytes() {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            error!("Failed to encode relay from client {}: {}", client_id, e);
                            break;
                        }
                    };
                    let clients = clients.read().await;
                    clients.relay(client_id, &bytes);
                }
                Err(e) if e.is_disconnect() => {
                    info!("Client {} closed the connection", client_id);
                    break;
                }
                Err(e) => {
                    warn!("Dropping client {}: {}", client_id, e);
                    break;
                }
            }
        }

        disconnect_client(client_id, &clients).await;
    });
}

async fn disconnect_client(client_id: u32, clients: &Arc<RwLock<ClientManager>>) {
    let mut clients = clients.write().await;
    if !clients.remove_client(&client_id) {
        return;
    }

    match RelayedAction::new(client_id, Action::Disconnect).to_bytes() {
        Ok(bytes) => {
            let notified = clients.relay(client_id, &bytes);
            debug!("Announced disconnect of {} to {} clients", client_id, notified);
        }
        Err(e) => error!("Failed to encode disconnect for {}: {}", client_id, e),
    }
}
