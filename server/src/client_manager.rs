//! Connection roster for the relay server
//!
//! This module tracks every connected client and owns the fan-out path:
//! - UID assignment (monotonic, starting at 0, never reused)
//! - Capacity enforcement against the configured client limit
//! - Queuing the handshake as the first message of each connection
//! - Relaying encoded actions to every client except the sender
//!
//! Clients never hold a socket here. Each one is represented by the sending
//! half of its writer task's channel, so relaying never waits on I/O.

use log::{debug, info, warn};
use shared::{Handshake, ProtocolError};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;

/// Outgoing byte queue of one connection's writer task.
pub type Outbox = mpsc::UnboundedSender<Vec<u8>>;

/// A connected client as the relay sees it
#[derive(Debug)]
pub struct Client {
    /// UID assigned on accept
    pub id: u32,
    /// Remote address, kept for logging
    pub addr: SocketAddr,
    /// When the connection was accepted
    pub connected_at: Instant,
    sender: Outbox,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr, sender: Outbox) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            sender,
        }
    }

    /// Queues raw bytes for this client's writer task.
    ///
    /// Returns false when the writer task has already gone away.
    pub fn send(&self, bytes: Vec<u8>) -> bool {
        self.sender.send(bytes).is_ok()
    }
}

/// Manages all connected clients of one relay server
///
/// The roster is shared between connection handlers behind a lock. Insertion
/// and the handshake happen under the same write lock, so a new client sees
/// a UID set that matches exactly the clients its relays will come from.
pub struct ClientManager {
    /// Connected clients indexed by UID
    clients: BTreeMap<u32, Client>,
    /// Next UID to hand out
    next_client_id: u32,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    /// Creates an empty roster. UIDs start from 0.
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: BTreeMap::new(),
            next_client_id: 0,
            max_clients,
        }
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }

    /// Attempts to register a new connection
    ///
    /// Returns the assigned UID, or None if the server is full. On success the
    /// handshake (own UID, count, every connected UID including this one) is
    /// queued on `sender` before any relayed action can be.
    pub fn add_client(
        &mut self,
        addr: SocketAddr,
        sender: Outbox,
    ) -> Result<Option<u32>, ProtocolError> {
        if self.clients.len() >= self.max_clients {
            return Ok(None);
        }

        let client_id = self.next_client_id;
        let mut uids = self.client_ids();
        uids.push(client_id);
        let handshake = Handshake {
            uid: client_id,
            uids,
        }
        .to_bytes()?;

        let client = Client::new(client_id, addr, sender);
        if !client.send(handshake) {
            warn!("Client from {} went away before its handshake", addr);
            return Ok(None);
        }

        self.next_client_id += 1;
        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, client);

        Ok(Some(client_id))
    }

    /// Removes a client from the roster
    ///
    /// Returns true if the client was found. Dropping the entry closes the
    /// writer task's channel once the queued bytes are flushed.
    pub fn remove_client(&mut self, client_id: &u32) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!(
                "Client {} disconnected after {:.1}s",
                client.id,
                client.connected_at.elapsed().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    /// Sends `bytes` to every client except `from`
    ///
    /// Returns the number of clients the bytes were queued for. Clients whose
    /// writer already stopped are skipped; their own handler cleans them up.
    pub fn relay(&self, from: u32, bytes: &[u8]) -> usize {
        let mut delivered = 0;
        for (id, client) in &self.clients {
            if *id == from {
                continue;
            }
            if client.send(bytes.to_vec()) {
                delivered += 1;
            } else {
                debug!("Skipping relay to closed client {}", id);
            }
        }
        delivered
    }

    /// UIDs of every connected client in ascending order
    pub fn client_ids(&self) -> Vec<u32> {
        self.clients.keys().copied().collect()
    }

    pub fn get(&self, client_id: &u32) -> Option<&Client> {
        self.clients.get(client_id)
    }

    /// Finds a client ID by its remote address
    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
