//! Client session state machine.
//!
//! The phase is the only value the server loop and the display loop share.
//! It sits behind a [`SharedPhase`] mutex; everything else in [`Session`] is
//! owned by the server loop and leaves it only as rendered frames.

use crate::error::ClientError;
use crate::game::GameState;
use crate::rendering::{game_frame, lobby_frame};
use log::{info, warn};
use shared::{DisplayMessage, GameParameters, Player, PlayerId, ServerMessage};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Coarse protocol state of the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    AwaitingJoin,
    Lobby,
    Game,
}

/// Handle to the phase, cloned into both loops.
#[derive(Debug, Clone, Default)]
pub struct SharedPhase(Arc<Mutex<SessionPhase>>);

impl SharedPhase {
    pub fn new(phase: SessionPhase) -> Self {
        Self(Arc::new(Mutex::new(phase)))
    }

    pub async fn get(&self) -> SessionPhase {
        *self.0.lock().await
    }

    /// Locks the phase for a check-and-transition. Hold the guard for the
    /// whole decision so the other loop never sees a half-made transition.
    pub async fn lock(&self) -> MutexGuard<'_, SessionPhase> {
        self.0.lock().await
    }
}

/// What the server loop should do after a message was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send this frame to the display.
    Render(DisplayMessage),
    /// State changed but there is nothing new to show yet.
    Updated,
    /// The message does not belong to the current phase and was ignored.
    Unexpected,
}

pub struct Session {
    parameters: GameParameters,
    lobby_players: BTreeMap<PlayerId, Player>,
    game_state: GameState,
    phase: SharedPhase,
}

impl Session {
    /// Starts a session from the parameters announced in Hello.
    pub fn new(parameters: GameParameters, phase: SharedPhase) -> Self {
        Self {
            parameters,
            lobby_players: BTreeMap::new(),
            game_state: GameState::default(),
            phase,
        }
    }

    pub fn lobby_players(&self) -> &BTreeMap<PlayerId, Player> {
        &self.lobby_players
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn lobby_frame(&self) -> DisplayMessage {
        lobby_frame(&self.parameters, &self.lobby_players)
    }

    pub fn game_frame(&self) -> DisplayMessage {
        game_frame(&self.parameters, &self.game_state)
    }

    /// Dispatches one server message on the current phase.
    ///
    /// Only a repeated Hello is an error; anything else that does not fit
    /// the phase comes back as [`Outcome::Unexpected`].
    pub async fn handle(&mut self, message: ServerMessage) -> Result<Outcome, ClientError> {
        let phase = self.phase.clone();
        let mut current = phase.lock().await;

        match (*current, message) {
            (_, ServerMessage::Hello(_)) => Err(ClientError::UnexpectedHello),

            (SessionPhase::Lobby, ServerMessage::AcceptedPlayer { id, player }) => {
                info!("Player {} ({}) joined the lobby", id, player.name);
                self.lobby_players.insert(id, player);
                Ok(Outcome::Render(self.lobby_frame()))
            }

            (SessionPhase::Lobby, ServerMessage::GameStarted { players }) => {
                info!("Game started with {} players", players.len());
                self.lobby_players = players.clone();
                self.game_state = GameState::new(players);
                *current = SessionPhase::Game;
                Ok(Outcome::Updated)
            }

            (SessionPhase::Lobby, ServerMessage::Turn { turn, events }) => {
                info!("Joined a game already in progress at turn {}", turn);
                self.game_state = GameState::new(self.lobby_players.clone());
                self.game_state.apply_turn(turn, &events, &self.parameters);
                *current = SessionPhase::Game;
                Ok(Outcome::Render(self.game_frame()))
            }

            (SessionPhase::Game, ServerMessage::Turn { turn, events }) => {
                self.game_state.explosions.clear();
                self.game_state.apply_turn(turn, &events, &self.parameters);
                Ok(Outcome::Render(self.game_frame()))
            }

            (SessionPhase::Game, ServerMessage::GameEnded { scores }) => {
                for (id, local, reported) in self.game_state.score_mismatches(&scores) {
                    warn!(
                        "Score mismatch for player {}: counted {:?}, server reported {:?}",
                        id, local, reported
                    );
                }
                info!("Game ended after turn {}", self.game_state.turn);
                self.lobby_players.clear();
                *current = SessionPhase::AwaitingJoin;
                Ok(Outcome::Render(self.lobby_frame()))
            }

            (other, message) => {
                warn!("Ignoring {} in phase {:?}", message.name(), other);
                Ok(Outcome::Unexpected)
            }
        }
    }
}
