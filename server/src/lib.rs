//! # Robots Reference Server
//!
//! A small authoritative server for exercising the client end to end. It
//! speaks the same protocol as a full game server but serves a single peer
//! on a single board.
//!
//! ## Module Organization
//!
//! ### Config Module (`config`)
//! Command-line settings, validation and the Hello parameters.
//!
//! ### Game Module (`game`)
//! Turn simulation: seeded spawns and blocks, bomb timers, explosions via
//! the shared blast rule, respawns and scoring.
//!
//! ### Network Module (`network`)
//! Accepts the peer, decodes its requests on a reader task and drives the
//! lobby and turn loop on a fixed interval.
//!
//! ## Session Flow
//!
//! Hello on connect; on Join, AcceptedPlayer, GameStarted and turn 0; one
//! Turn per interval until `game_length`; then GameEnded and back to the
//! lobby, where the same peer may join again.

pub mod config;
pub mod error;
pub mod game;
pub mod network;
