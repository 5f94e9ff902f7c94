//! # Robots Protocol Library
//!
//! Everything the client and the reference server must agree on byte for
//! byte: the data model, the message sum types, the binary codec and the
//! blast propagation rule.
//!
//! ## Module Organization
//!
//! - `types`: positions, players, bombs and game parameters
//! - `messages`: one enum per channel (server, client, display input, display output)
//! - `buffer`: [`WireBuffer`], which reassembles typed fields from an unframed TCP stream
//! - `codec`: `encode`/`decode` for every message
//! - `explosion`: [`explosion_cells`], shared by the client's aggregator and the server
//!
//! ## Wire Format
//!
//! Integers are unsigned big-endian, strings carry a 1-byte length and
//! collections a 4-byte count. Messages carry no length header: a decoder
//! knows where a message ends only by walking its layout, which is why the
//! TCP side reads through a [`WireBuffer`].

mod buffer;
mod codec;
mod error;
mod explosion;
mod messages;
mod types;

pub use buffer::{WireBuffer, TCP_BUFFER_LENGTH};
pub use error::ProtocolError;
pub use explosion::explosion_cells;
pub use messages::{ClientMessage, DisplayMessage, Event, InputMessage, ServerMessage};
pub use types::{Bomb, BombId, Direction, GameParameters, Player, PlayerId, Position, Score};

/// Largest payload a single UDP datagram can carry.
pub const UDP_BUFFER_LENGTH: usize = 65507;
