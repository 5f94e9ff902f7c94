use crate::game::GameState;
use log::debug;
use shared::{DisplayMessage, GameParameters, Player, PlayerId};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// Builds the lobby view for the display.
pub fn lobby_frame(
    parameters: &GameParameters,
    players: &BTreeMap<PlayerId, Player>,
) -> DisplayMessage {
    DisplayMessage::Lobby {
        server_name: parameters.server_name.clone(),
        players_count: parameters.players_count,
        size_x: parameters.size_x,
        size_y: parameters.size_y,
        game_length: parameters.game_length,
        explosion_radius: parameters.explosion_radius,
        bomb_timer: parameters.bomb_timer,
        players: players.clone(),
    }
}

/// Builds the in-game view. Blocks and explosions come out in position
/// order, bombs in bomb id order.
pub fn game_frame(parameters: &GameParameters, state: &GameState) -> DisplayMessage {
    DisplayMessage::Game {
        server_name: parameters.server_name.clone(),
        size_x: parameters.size_x,
        size_y: parameters.size_y,
        game_length: parameters.game_length,
        turn: state.turn,
        players: state.players.clone(),
        player_positions: state.player_positions.clone(),
        blocks: state.blocks.iter().copied().collect(),
        bombs: state.bombs.values().copied().collect(),
        explosions: state.explosions.iter().copied().collect(),
        scores: state.scores.clone(),
    }
}

/// Sends frames to the display over the client's UDP socket.
pub struct Renderer {
    socket: Arc<UdpSocket>,
    display_addr: SocketAddr,
}

impl Renderer {
    pub fn new(socket: Arc<UdpSocket>, display_addr: SocketAddr) -> Self {
        Renderer {
            socket,
            display_addr,
        }
    }

    pub async fn send(&self, frame: &DisplayMessage) -> Result<(), crate::error::ClientError> {
        let data = frame.encode()?;
        self.socket.send_to(&data, self.display_addr).await?;
        debug!("Sent {} byte frame to {}", data.len(), self.display_addr);
        Ok(())
    }
}
