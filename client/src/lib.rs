//! # Game Client Library
//!
//! Everything a player's process runs: the controller that owns the local
//! world mirror, the buffered input it reads each tick, the relay connection
//! and the seam a renderer plugs into.
//!
//! ## Architecture Overview
//!
//! Every client simulates the whole world itself. There is no authoritative
//! server state: the relay only forwards what each client announces about its
//! own player (position, shots, weapon, health and score), and each client
//! applies those announcements to its copy of the remote players.
//!
//! The loop is fixed-step. Each tick drains relayed actions queued by the
//! connection's reader task, applies local input, advances every room, and
//! sends whatever changed about the local player. Drawing happens after a
//! tick only when the loop is on schedule.
//!
//! ## Module Organization
//!
//! - [`game`]: the `Controller` and the `FixedStep` scheduler
//! - [`input`]: held keys, aiming and one-shot commands between ticks
//! - [`network`]: relay connection and the run loop
//! - [`rendering`]: scene capture, the `Renderer` trait and a headless renderer
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use client::rendering::HeadlessRenderer;
//! use shared::{GameConfig, Strategy, World};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let world = World::load(Path::new("Resources"), GameConfig::default(), Strategy::wait())?;
//!     let mut client = Client::connect("127.0.0.1:8080", world).await?;
//!     client.run(&mut HeadlessRenderer::new()).await?;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
