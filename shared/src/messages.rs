//! Every message that crosses a socket, one sum type per channel.

use std::collections::BTreeMap;

use crate::types::{Bomb, BombId, Direction, GameParameters, Player, PlayerId, Position, Score};

/// Server → client, over TCP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Hello(GameParameters),
    AcceptedPlayer {
        id: PlayerId,
        player: Player,
    },
    GameStarted {
        players: BTreeMap<PlayerId, Player>,
    },
    Turn {
        turn: u16,
        events: Vec<Event>,
    },
    GameEnded {
        scores: BTreeMap<PlayerId, Score>,
    },
}

impl ServerMessage {
    pub fn name(&self) -> &'static str {
        match self {
            ServerMessage::Hello(_) => "Hello",
            ServerMessage::AcceptedPlayer { .. } => "AcceptedPlayer",
            ServerMessage::GameStarted { .. } => "GameStarted",
            ServerMessage::Turn { .. } => "Turn",
            ServerMessage::GameEnded { .. } => "GameEnded",
        }
    }
}

/// One state change reported inside a Turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BombPlaced {
        bomb_id: BombId,
        position: Position,
    },
    BombExploded {
        bomb_id: BombId,
        robots_destroyed: Vec<PlayerId>,
        blocks_destroyed: Vec<Position>,
    },
    PlayerMoved {
        player_id: PlayerId,
        position: Position,
    },
    BlockPlaced {
        position: Position,
    },
}

/// Client → server, over TCP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Join { name: String },
    PlaceBomb,
    PlaceBlock,
    Move { direction: Direction },
}

/// Display → client, one per UDP datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMessage {
    PlaceBomb,
    PlaceBlock,
    Move { direction: Direction },
}

impl From<InputMessage> for ClientMessage {
    fn from(input: InputMessage) -> Self {
        match input {
            InputMessage::PlaceBomb => ClientMessage::PlaceBomb,
            InputMessage::PlaceBlock => ClientMessage::PlaceBlock,
            InputMessage::Move { direction } => ClientMessage::Move { direction },
        }
    }
}

/// Client → display, one per UDP datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMessage {
    Lobby {
        server_name: String,
        players_count: u8,
        size_x: u16,
        size_y: u16,
        game_length: u16,
        explosion_radius: u16,
        bomb_timer: u16,
        players: BTreeMap<PlayerId, Player>,
    },
    Game {
        server_name: String,
        size_x: u16,
        size_y: u16,
        game_length: u16,
        turn: u16,
        players: BTreeMap<PlayerId, Player>,
        player_positions: BTreeMap<PlayerId, Position>,
        blocks: Vec<Position>,
        bombs: Vec<Bomb>,
        explosions: Vec<Position>,
        scores: BTreeMap<PlayerId, Score>,
    },
}
