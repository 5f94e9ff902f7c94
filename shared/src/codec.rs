//! Binary encoding of every protocol message.
//!
//! Layout rules shared by all channels:
//!
//! ```text
//! integers     unsigned, big-endian
//! string       u8 length | bytes
//! list / map   u32 count | elements (maps in ascending key order)
//! position     x: u16 | y: u16
//! ```
//!
//! Encoders compute the exact output size first and return an owned buffer
//! of that size. Decoders pull fields from a [`WireBuffer`] and stop on the
//! last byte of the message, leaving the buffer at the next message.

use std::collections::BTreeMap;

use tokio::io::AsyncRead;

use crate::buffer::WireBuffer;
use crate::messages::{ClientMessage, DisplayMessage, Event, InputMessage, ServerMessage};
use crate::types::{Bomb, Direction, GameParameters, Player, PlayerId, Position, Score};
use crate::ProtocolError;

const U8: usize = 1;
const U16: usize = 2;
const U32: usize = 4;
const POSITION: usize = 2 * U16;
const BOMB: usize = POSITION + U16;

/// Upper bound on elements reserved up front for a decoded collection, so a
/// hostile count cannot force a huge allocation before any element arrives.
const PREALLOC_LIMIT: usize = 1024;

mod server_kind {
    pub const HELLO: u8 = 0;
    pub const ACCEPTED_PLAYER: u8 = 1;
    pub const GAME_STARTED: u8 = 2;
    pub const TURN: u8 = 3;
    pub const GAME_ENDED: u8 = 4;
}

mod event_kind {
    pub const BOMB_PLACED: u8 = 0;
    pub const BOMB_EXPLODED: u8 = 1;
    pub const PLAYER_MOVED: u8 = 2;
    pub const BLOCK_PLACED: u8 = 3;
}

mod client_kind {
    pub const JOIN: u8 = 0;
    pub const PLACE_BOMB: u8 = 1;
    pub const PLACE_BLOCK: u8 = 2;
    pub const MOVE: u8 = 3;
}

mod input_kind {
    pub const PLACE_BOMB: u8 = 0;
    pub const PLACE_BLOCK: u8 = 1;
    pub const MOVE: u8 = 2;
}

mod display_kind {
    pub const LOBBY: u8 = 0;
    pub const GAME: u8 = 1;
}

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

fn string_len(value: &str) -> usize {
    U8 + value.len()
}

fn players_len(players: &BTreeMap<PlayerId, Player>) -> usize {
    U32 + players
        .values()
        .map(|p| U8 + string_len(&p.name) + string_len(&p.address))
        .sum::<usize>()
}

fn positions_len(positions: &[Position]) -> usize {
    U32 + positions.len() * POSITION
}

impl Event {
    fn encoded_len(&self) -> usize {
        U8 + match self {
            Event::BombPlaced { .. } => U32 + POSITION,
            Event::BombExploded {
                robots_destroyed,
                blocks_destroyed,
                ..
            } => U32 + U32 + robots_destroyed.len() * U8 + positions_len(blocks_destroyed),
            Event::PlayerMoved { .. } => U8 + POSITION,
            Event::BlockPlaced { .. } => POSITION,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

struct Encoder {
    bytes: Vec<u8>,
    expected: usize,
}

impl Encoder {
    fn with_len(expected: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(expected),
            expected,
        }
    }

    fn u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    fn u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    fn string(&mut self, value: &str) -> Result<(), ProtocolError> {
        let len = u8::try_from(value.len()).map_err(|_| ProtocolError::StringTooLong(value.len()))?;
        self.u8(len);
        self.bytes.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn count(&mut self, count: usize) -> Result<(), ProtocolError> {
        let count = u32::try_from(count).map_err(|_| ProtocolError::CollectionTooLarge(count))?;
        self.u32(count);
        Ok(())
    }

    fn position(&mut self, position: Position) {
        self.u16(position.x);
        self.u16(position.y);
    }

    fn positions<'a>(
        &mut self,
        count: usize,
        positions: impl Iterator<Item = &'a Position>,
    ) -> Result<(), ProtocolError> {
        self.count(count)?;
        for position in positions {
            self.position(*position);
        }
        Ok(())
    }

    fn players(&mut self, players: &BTreeMap<PlayerId, Player>) -> Result<(), ProtocolError> {
        self.count(players.len())?;
        for (id, player) in players {
            self.u8(*id);
            self.string(&player.name)?;
            self.string(&player.address)?;
        }
        Ok(())
    }

    fn scores(&mut self, scores: &BTreeMap<PlayerId, Score>) -> Result<(), ProtocolError> {
        self.count(scores.len())?;
        for (id, score) in scores {
            self.u8(*id);
            self.u32(*score);
        }
        Ok(())
    }

    fn event(&mut self, event: &Event) -> Result<(), ProtocolError> {
        match event {
            Event::BombPlaced { bomb_id, position } => {
                self.u8(event_kind::BOMB_PLACED);
                self.u32(*bomb_id);
                self.position(*position);
            }
            Event::BombExploded {
                bomb_id,
                robots_destroyed,
                blocks_destroyed,
            } => {
                self.u8(event_kind::BOMB_EXPLODED);
                self.u32(*bomb_id);
                self.count(robots_destroyed.len())?;
                for id in robots_destroyed {
                    self.u8(*id);
                }
                self.positions(blocks_destroyed.len(), blocks_destroyed.iter())?;
            }
            Event::PlayerMoved {
                player_id,
                position,
            } => {
                self.u8(event_kind::PLAYER_MOVED);
                self.u8(*player_id);
                self.position(*position);
            }
            Event::BlockPlaced { position } => {
                self.u8(event_kind::BLOCK_PLACED);
                self.position(*position);
            }
        }
        Ok(())
    }

    fn finish(self) -> Vec<u8> {
        debug_assert_eq!(self.bytes.len(), self.expected);
        self.bytes
    }
}

// ---------------------------------------------------------------------------
// Decoding helpers
// ---------------------------------------------------------------------------

async fn read_str<R: AsyncRead + Unpin>(
    buffer: &mut WireBuffer<R>,
) -> Result<String, ProtocolError> {
    let len = buffer.read_u8().await?;
    buffer.read_string(len as usize).await
}

async fn read_count<R: AsyncRead + Unpin>(
    buffer: &mut WireBuffer<R>,
) -> Result<usize, ProtocolError> {
    Ok(buffer.read_u32().await? as usize)
}

async fn read_position<R: AsyncRead + Unpin>(
    buffer: &mut WireBuffer<R>,
) -> Result<Position, ProtocolError> {
    let x = buffer.read_u16().await?;
    let y = buffer.read_u16().await?;
    Ok(Position { x, y })
}

async fn read_positions<R: AsyncRead + Unpin>(
    buffer: &mut WireBuffer<R>,
) -> Result<Vec<Position>, ProtocolError> {
    let count = read_count(buffer).await?;
    let mut positions = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        positions.push(read_position(buffer).await?);
    }
    Ok(positions)
}

async fn read_player<R: AsyncRead + Unpin>(
    buffer: &mut WireBuffer<R>,
) -> Result<(PlayerId, Player), ProtocolError> {
    let id = buffer.read_u8().await?;
    let name = read_str(buffer).await?;
    let address = read_str(buffer).await?;
    Ok((id, Player { name, address }))
}

async fn read_players<R: AsyncRead + Unpin>(
    buffer: &mut WireBuffer<R>,
) -> Result<BTreeMap<PlayerId, Player>, ProtocolError> {
    let count = read_count(buffer).await?;
    let mut players = BTreeMap::new();
    for _ in 0..count {
        let (id, player) = read_player(buffer).await?;
        players.insert(id, player);
    }
    Ok(players)
}

async fn read_scores<R: AsyncRead + Unpin>(
    buffer: &mut WireBuffer<R>,
) -> Result<BTreeMap<PlayerId, Score>, ProtocolError> {
    let count = read_count(buffer).await?;
    let mut scores = BTreeMap::new();
    for _ in 0..count {
        let id = buffer.read_u8().await?;
        let score = buffer.read_u32().await?;
        scores.insert(id, score);
    }
    Ok(scores)
}

async fn read_event<R: AsyncRead + Unpin>(
    buffer: &mut WireBuffer<R>,
) -> Result<Event, ProtocolError> {
    let kind = buffer.read_u8().await?;
    let event = match kind {
        event_kind::BOMB_PLACED => Event::BombPlaced {
            bomb_id: buffer.read_u32().await?,
            position: read_position(buffer).await?,
        },
        event_kind::BOMB_EXPLODED => {
            let bomb_id = buffer.read_u32().await?;
            let count = read_count(buffer).await?;
            let mut robots_destroyed = Vec::with_capacity(count.min(PREALLOC_LIMIT));
            for _ in 0..count {
                robots_destroyed.push(buffer.read_u8().await?);
            }
            let blocks_destroyed = read_positions(buffer).await?;
            Event::BombExploded {
                bomb_id,
                robots_destroyed,
                blocks_destroyed,
            }
        }
        event_kind::PLAYER_MOVED => Event::PlayerMoved {
            player_id: buffer.read_u8().await?,
            position: read_position(buffer).await?,
        },
        event_kind::BLOCK_PLACED => Event::BlockPlaced {
            position: read_position(buffer).await?,
        },
        other => return Err(ProtocolError::UnknownEvent(other)),
    };
    Ok(event)
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

impl ServerMessage {
    /// Exact number of bytes [`ServerMessage::encode`] produces.
    pub fn encoded_len(&self) -> usize {
        U8 + match self {
            ServerMessage::Hello(params) => string_len(&params.server_name) + U8 + 5 * U16,
            ServerMessage::AcceptedPlayer { player, .. } => {
                U8 + string_len(&player.name) + string_len(&player.address)
            }
            ServerMessage::GameStarted { players } => players_len(players),
            ServerMessage::Turn { events, .. } => {
                U16 + U32 + events.iter().map(Event::encoded_len).sum::<usize>()
            }
            ServerMessage::GameEnded { scores } => U32 + scores.len() * (U8 + U32),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut out = Encoder::with_len(self.encoded_len());
        match self {
            ServerMessage::Hello(params) => {
                out.u8(server_kind::HELLO);
                out.string(&params.server_name)?;
                out.u8(params.players_count);
                out.u16(params.size_x);
                out.u16(params.size_y);
                out.u16(params.game_length);
                out.u16(params.explosion_radius);
                out.u16(params.bomb_timer);
            }
            ServerMessage::AcceptedPlayer { id, player } => {
                out.u8(server_kind::ACCEPTED_PLAYER);
                out.u8(*id);
                out.string(&player.name)?;
                out.string(&player.address)?;
            }
            ServerMessage::GameStarted { players } => {
                out.u8(server_kind::GAME_STARTED);
                out.players(players)?;
            }
            ServerMessage::Turn { turn, events } => {
                out.u8(server_kind::TURN);
                out.u16(*turn);
                out.count(events.len())?;
                for event in events {
                    out.event(event)?;
                }
            }
            ServerMessage::GameEnded { scores } => {
                out.u8(server_kind::GAME_ENDED);
                out.scores(scores)?;
            }
        }
        Ok(out.finish())
    }

    pub async fn decode<R: AsyncRead + Unpin>(
        buffer: &mut WireBuffer<R>,
    ) -> Result<Self, ProtocolError> {
        let kind = buffer.read_u8().await?;
        let message = match kind {
            server_kind::HELLO => ServerMessage::Hello(GameParameters {
                server_name: read_str(buffer).await?,
                players_count: buffer.read_u8().await?,
                size_x: buffer.read_u16().await?,
                size_y: buffer.read_u16().await?,
                game_length: buffer.read_u16().await?,
                explosion_radius: buffer.read_u16().await?,
                bomb_timer: buffer.read_u16().await?,
            }),
            server_kind::ACCEPTED_PLAYER => {
                let (id, player) = read_player(buffer).await?;
                ServerMessage::AcceptedPlayer { id, player }
            }
            server_kind::GAME_STARTED => ServerMessage::GameStarted {
                players: read_players(buffer).await?,
            },
            server_kind::TURN => {
                let turn = buffer.read_u16().await?;
                let count = read_count(buffer).await?;
                let mut events = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    events.push(read_event(buffer).await?);
                }
                ServerMessage::Turn { turn, events }
            }
            server_kind::GAME_ENDED => ServerMessage::GameEnded {
                scores: read_scores(buffer).await?,
            },
            value => {
                return Err(ProtocolError::UnknownMessage {
                    kind: "server",
                    value,
                })
            }
        };
        Ok(message)
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

impl ClientMessage {
    pub fn encoded_len(&self) -> usize {
        U8 + match self {
            ClientMessage::Join { name } => string_len(name),
            ClientMessage::PlaceBomb | ClientMessage::PlaceBlock => 0,
            ClientMessage::Move { .. } => U8,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut out = Encoder::with_len(self.encoded_len());
        match self {
            ClientMessage::Join { name } => {
                out.u8(client_kind::JOIN);
                out.string(name)?;
            }
            ClientMessage::PlaceBomb => out.u8(client_kind::PLACE_BOMB),
            ClientMessage::PlaceBlock => out.u8(client_kind::PLACE_BLOCK),
            ClientMessage::Move { direction } => {
                out.u8(client_kind::MOVE);
                out.u8(*direction as u8);
            }
        }
        Ok(out.finish())
    }

    pub async fn decode<R: AsyncRead + Unpin>(
        buffer: &mut WireBuffer<R>,
    ) -> Result<Self, ProtocolError> {
        let kind = buffer.read_u8().await?;
        let message = match kind {
            client_kind::JOIN => ClientMessage::Join {
                name: read_str(buffer).await?,
            },
            client_kind::PLACE_BOMB => ClientMessage::PlaceBomb,
            client_kind::PLACE_BLOCK => ClientMessage::PlaceBlock,
            client_kind::MOVE => {
                let value = buffer.read_u8().await?;
                let direction =
                    Direction::try_from(value).map_err(ProtocolError::InvalidDirection)?;
                ClientMessage::Move { direction }
            }
            value => {
                return Err(ProtocolError::UnknownMessage {
                    kind: "client",
                    value,
                })
            }
        };
        Ok(message)
    }
}

// ---------------------------------------------------------------------------
// Display → client
// ---------------------------------------------------------------------------

impl InputMessage {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            InputMessage::PlaceBomb => vec![input_kind::PLACE_BOMB],
            InputMessage::PlaceBlock => vec![input_kind::PLACE_BLOCK],
            InputMessage::Move { direction } => vec![input_kind::MOVE, *direction as u8],
        }
    }

    /// Decodes one whole datagram. The datagram length must match the
    /// message's fixed layout exactly.
    pub fn decode(datagram: &[u8]) -> Result<Self, ProtocolError> {
        let (&kind, rest) = datagram.split_first().ok_or(ProtocolError::EmptyDatagram)?;

        let expect_len = |kind: &'static str, expected: usize| {
            if datagram.len() == expected {
                Ok(())
            } else {
                Err(ProtocolError::InvalidLength {
                    kind,
                    expected,
                    actual: datagram.len(),
                })
            }
        };

        match kind {
            input_kind::PLACE_BOMB => {
                expect_len("PlaceBomb", 1)?;
                Ok(InputMessage::PlaceBomb)
            }
            input_kind::PLACE_BLOCK => {
                expect_len("PlaceBlock", 1)?;
                Ok(InputMessage::PlaceBlock)
            }
            input_kind::MOVE => {
                expect_len("Move", 2)?;
                let direction =
                    Direction::try_from(rest[0]).map_err(ProtocolError::InvalidDirection)?;
                Ok(InputMessage::Move { direction })
            }
            value => Err(ProtocolError::UnknownMessage {
                kind: "input",
                value,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Client → display
// ---------------------------------------------------------------------------

impl DisplayMessage {
    pub fn encoded_len(&self) -> usize {
        U8 + match self {
            DisplayMessage::Lobby {
                server_name,
                players,
                ..
            } => string_len(server_name) + U8 + 5 * U16 + players_len(players),
            DisplayMessage::Game {
                server_name,
                players,
                player_positions,
                blocks,
                bombs,
                explosions,
                scores,
                ..
            } => {
                string_len(server_name)
                    + 4 * U16
                    + players_len(players)
                    + U32
                    + player_positions.len() * (U8 + POSITION)
                    + positions_len(blocks)
                    + U32
                    + bombs.len() * BOMB
                    + positions_len(explosions)
                    + U32
                    + scores.len() * (U8 + U32)
            }
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut out = Encoder::with_len(self.encoded_len());
        match self {
            DisplayMessage::Lobby {
                server_name,
                players_count,
                size_x,
                size_y,
                game_length,
                explosion_radius,
                bomb_timer,
                players,
            } => {
                out.u8(display_kind::LOBBY);
                out.string(server_name)?;
                out.u8(*players_count);
                out.u16(*size_x);
                out.u16(*size_y);
                out.u16(*game_length);
                out.u16(*explosion_radius);
                out.u16(*bomb_timer);
                out.players(players)?;
            }
            DisplayMessage::Game {
                server_name,
                size_x,
                size_y,
                game_length,
                turn,
                players,
                player_positions,
                blocks,
                bombs,
                explosions,
                scores,
            } => {
                out.u8(display_kind::GAME);
                out.string(server_name)?;
                out.u16(*size_x);
                out.u16(*size_y);
                out.u16(*game_length);
                out.u16(*turn);
                out.players(players)?;
                out.count(player_positions.len())?;
                for (id, position) in player_positions {
                    out.u8(*id);
                    out.position(*position);
                }
                out.positions(blocks.len(), blocks.iter())?;
                out.count(bombs.len())?;
                for bomb in bombs {
                    out.position(bomb.position);
                    out.u16(bomb.timer);
                }
                out.positions(explosions.len(), explosions.iter())?;
                out.scores(scores)?;
            }
        }
        Ok(out.finish())
    }

    pub async fn decode<R: AsyncRead + Unpin>(
        buffer: &mut WireBuffer<R>,
    ) -> Result<Self, ProtocolError> {
        let kind = buffer.read_u8().await?;
        match kind {
            display_kind::LOBBY => Ok(DisplayMessage::Lobby {
                server_name: read_str(buffer).await?,
                players_count: buffer.read_u8().await?,
                size_x: buffer.read_u16().await?,
                size_y: buffer.read_u16().await?,
                game_length: buffer.read_u16().await?,
                explosion_radius: buffer.read_u16().await?,
                bomb_timer: buffer.read_u16().await?,
                players: read_players(buffer).await?,
            }),
            display_kind::GAME => {
                let server_name = read_str(buffer).await?;
                let size_x = buffer.read_u16().await?;
                let size_y = buffer.read_u16().await?;
                let game_length = buffer.read_u16().await?;
                let turn = buffer.read_u16().await?;
                let players = read_players(buffer).await?;

                let count = read_count(buffer).await?;
                let mut player_positions = BTreeMap::new();
                for _ in 0..count {
                    let id = buffer.read_u8().await?;
                    player_positions.insert(id, read_position(buffer).await?);
                }

                let blocks = read_positions(buffer).await?;

                let count = read_count(buffer).await?;
                let mut bombs = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    let position = read_position(buffer).await?;
                    let timer = buffer.read_u16().await?;
                    bombs.push(Bomb { position, timer });
                }

                let explosions = read_positions(buffer).await?;
                let scores = read_scores(buffer).await?;

                Ok(DisplayMessage::Game {
                    server_name,
                    size_x,
                    size_y,
                    game_length,
                    turn,
                    players,
                    player_positions,
                    blocks,
                    bombs,
                    explosions,
                    scores,
                })
            }
            value => Err(ProtocolError::UnknownMessage {
                kind: "display",
                value,
            }),
        }
    }
}
