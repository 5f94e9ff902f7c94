//! Translation of display input into server requests.

use crate::session::{SessionPhase, SharedPhase};
use log::{debug, info};
use shared::{ClientMessage, InputMessage, ProtocolError};

/// Decides what, if anything, a display datagram turns into.
pub struct InputHandler {
    player_name: String,
    phase: SharedPhase,
}

impl InputHandler {
    pub fn new(player_name: impl Into<String>, phase: SharedPhase) -> Self {
        Self {
            player_name: player_name.into(),
            phase,
        }
    }

    /// Returns the message to send to the server for one datagram.
    ///
    /// The first valid input while awaiting a join becomes a Join request,
    /// in the lobby input is dropped, in game it is forwarded as-is.
    /// Malformed datagrams are reported so the caller can discard them.
    pub async fn handle_datagram(
        &self,
        datagram: &[u8],
    ) -> Result<Option<ClientMessage>, ProtocolError> {
        let input = InputMessage::decode(datagram)?;
        let mut phase = self.phase.lock().await;

        match *phase {
            SessionPhase::AwaitingJoin => {
                info!("Joining as {}", self.player_name);
                *phase = SessionPhase::Lobby;
                Ok(Some(ClientMessage::Join {
                    name: self.player_name.clone(),
                }))
            }
            SessionPhase::Lobby => {
                debug!("Dropping {:?} while in the lobby", input);
                Ok(None)
            }
            SessionPhase::Game => Ok(Some(input.into())),
        }
    }
}
