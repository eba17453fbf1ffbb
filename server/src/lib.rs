//! # Relay Server Library
//!
//! The server is a message relay. It keeps no game state and performs no
//! validation: every action a client sends is forwarded, tagged with the
//! sender's UID, to every other connected client. Each client runs its own
//! copy of the simulation and applies what it receives.
//!
//! ## Connection lifecycle
//!
//! 1. Accept a TCP connection and assign the next UID (starting at 0).
//! 2. Send the handshake: the new UID, the player count and every UID.
//! 3. Read actions until the client disconnects or breaks the protocol.
//! 4. Remove the client and tell the others with a relayed Disconnect.
//!
//! Connections past the client limit are closed right after accept.
//!
//! ## Module Organization
//!
//! - [`client_manager`]: the roster, UID assignment and fan-out.
//! - [`network`]: the accept loop and per-connection reader/writer tasks.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::new("127.0.0.1:8080", 4).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod network;
