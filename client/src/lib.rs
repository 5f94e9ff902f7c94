//! # Robots Client Library
//!
//! The client sits between an authoritative game server (TCP) and a display
//! front-end (UDP). It relays the player's input to the server and re-renders
//! the server's view of the game for the display.
//!
//! ## Architecture Overview
//!
//! Two loops run for the lifetime of the process:
//!
//! - the **server loop** decodes server messages, feeds them to the
//!   [`session::Session`] state machine and sends the resulting frames to
//!   the display;
//! - the **display loop** decodes display input and, depending on the
//!   session phase, turns it into a Join request, drops it, or forwards it.
//!
//! The only value the two loops share is the [`session::SessionPhase`],
//! guarded by a mutex. The game state and parameters belong to the server
//! loop alone.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! Phase transitions (`AwaitingJoin` → `Lobby` → `Game` → `AwaitingJoin`)
//! and server message dispatch.
//!
//! ### Game Module (`game`)
//! Turn aggregation: bomb timers, explosions, movement, blocks and scores.
//!
//! ### Input Module (`input`)
//! Display input translation and join handling.
//!
//! ### Rendering Module (`rendering`)
//! Lobby and game frames, and the UDP sender.
//!
//! ### Network Module (`network`)
//! Socket setup and the two loops.
//!
//! ## Usage Example
//!
//! ```no_run
//! use client::config::ClientConfig;
//! use client::network::Client;
//!
//! # async fn start() -> Result<(), client::error::ClientError> {
//! let config = ClientConfig {
//!     gui_address: "localhost:2023".to_string(),
//!     player_name: "bob".to_string(),
//!     port: 2024,
//!     server_address: "localhost:2022".to_string(),
//! };
//!
//! Client::connect(&config).await?.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
pub mod session;
