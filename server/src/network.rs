//! Server network layer: one TCP peer, a reader task and the turn loop.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::game::{ServerGame, PLAYER_ID};
use log::{debug, info, warn};
use shared::{ClientMessage, Player, ProtocolError, ServerMessage, WireBuffer};
use std::net::{Ipv4Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Lobby,
    Game,
}

pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.port)).await?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Server { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves a single peer until it disconnects.
    pub async fn run(&self) -> Result<(), ServerError> {
        let (stream, peer) = self.listener.accept().await?;
        stream.set_nodelay(true)?;
        info!("Peer connected from {}", peer);

        self.serve(stream, peer).await?;
        info!("Peer {} disconnected", peer);
        Ok(())
    }

    async fn serve(&self, stream: TcpStream, peer: SocketAddr) -> Result<(), ServerError> {
        let (reader, mut writer) = stream.into_split();
        send(&mut writer, &ServerMessage::Hello(self.config.parameters())).await?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let reader_task = tokio::spawn(receive_client_messages(WireBuffer::new(reader), tx));

        let result = self.drive(&mut writer, &mut rx, peer).await;
        reader_task.abort();
        result
    }

    /// Lobby/game loop. Returns once the reader task hangs up.
    async fn drive<W: AsyncWrite + Unpin>(
        &self,
        writer: &mut W,
        rx: &mut mpsc::UnboundedReceiver<ClientMessage>,
        peer: SocketAddr,
    ) -> Result<(), ServerError> {
        let mut game = ServerGame::new(
            self.config.parameters(),
            self.config.initial_blocks,
            self.config.seed,
        );
        let mut phase = Phase::Lobby;
        let mut ticker = interval(self.config.turn_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                message = rx.recv() => {
                    let Some(message) = message else {
                        return Ok(());
                    };
                    debug!("Received {:?} in {:?}", message, phase);

                    match (phase, message) {
                        (Phase::Lobby, ClientMessage::Join { name }) => {
                            info!("{} joined as player {}", name, PLAYER_ID);
                            let player = Player::new(name, peer.to_string());
                            send(writer, &ServerMessage::AcceptedPlayer {
                                id: PLAYER_ID,
                                player: player.clone(),
                            }).await?;
                            send(writer, &ServerMessage::GameStarted {
                                players: [(PLAYER_ID, player)].into_iter().collect(),
                            }).await?;
                            send(writer, &game.start()).await?;
                            ticker.reset();
                            phase = Phase::Game;
                        }
                        (Phase::Game, message) => game.record_action(message),
                        (Phase::Lobby, _) => {}
                    }
                }

                _ = ticker.tick(), if phase == Phase::Game => {
                    send(writer, &game.next_turn()).await?;

                    if game.is_finished() {
                        info!("Game over after {} turns", game.turn());
                        send(writer, &ServerMessage::GameEnded { scores: game.scores() }).await?;
                        phase = Phase::Lobby;
                    }
                }
            }
        }
    }
}

async fn send<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &ServerMessage,
) -> Result<(), ServerError> {
    let data = message.encode()?;
    writer.write_all(&data).await?;
    debug!("Sent {} ({} bytes)", message.name(), data.len());
    Ok(())
}

/// Decodes client messages into `tx` until the stream ends or breaks.
async fn receive_client_messages<R: AsyncRead + Unpin>(
    mut buffer: WireBuffer<R>,
    tx: mpsc::UnboundedSender<ClientMessage>,
) {
    loop {
        match ClientMessage::decode(&mut buffer).await {
            Ok(message) => {
                if tx.send(message).is_err() {
                    break;
                }
            }
            Err(ProtocolError::ConnectionClosed) => break,
            Err(e) => {
                warn!("Dropping peer after malformed message: {}", e);
                break;
            }
        }
    }
}
