//! Server settings and the game parameters derived from them.

use crate::error::ServerError;
use shared::GameParameters;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bomb_timer: u16,
    pub players_count: u8,
    /// Milliseconds per turn.
    pub turn_duration: u64,
    pub explosion_radius: u16,
    pub initial_blocks: u16,
    pub game_length: u16,
    pub server_name: String,
    pub port: u16,
    /// Fixed RNG seed; entropy when unset.
    pub seed: Option<u64>,
    pub size_x: u16,
    pub size_y: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bomb_timer: 5,
            players_count: 1,
            turn_duration: 500,
            explosion_radius: 3,
            initial_blocks: 10,
            game_length: 100,
            server_name: "robots".to_string(),
            port: 2022,
            seed: None,
            size_x: 10,
            size_y: 10,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.size_x == 0 || self.size_y == 0 {
            return Err(ServerError::InvalidConfig(
                "board size must be positive".to_string(),
            ));
        }
        if self.turn_duration == 0 {
            return Err(ServerError::InvalidConfig(
                "turn duration must be positive".to_string(),
            ));
        }
        if self.game_length == 0 {
            return Err(ServerError::InvalidConfig(
                "game length must be positive".to_string(),
            ));
        }
        if self.players_count == 0 {
            return Err(ServerError::InvalidConfig(
                "players count must be positive".to_string(),
            ));
        }
        if self.server_name.len() > u8::MAX as usize {
            return Err(ServerError::InvalidConfig(format!(
                "server name is {} bytes, at most {} allowed",
                self.server_name.len(),
                u8::MAX
            )));
        }
        Ok(())
    }

    pub fn turn_duration(&self) -> Duration {
        Duration::from_millis(self.turn_duration)
    }

    /// Parameters announced to the peer in Hello.
    pub fn parameters(&self) -> GameParameters {
        GameParameters {
            server_name: self.server_name.clone(),
            players_count: self.players_count,
            size_x: self.size_x,
            size_y: self.size_y,
            game_length: self.game_length,
            explosion_radius: self.explosion_radius,
            bomb_timer: self.bomb_timer,
        }
    }
}
