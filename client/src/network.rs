//! The client's two I/O loops and the sockets they run on.

use crate::config::{resolve, ClientConfig};
use crate::error::ClientError;
use crate::input::InputHandler;
use crate::rendering::Renderer;
use crate::session::{Outcome, Session, SharedPhase};
use log::{debug, error, info, warn};
use shared::{ServerMessage, WireBuffer, UDP_BUFFER_LENGTH};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, UdpSocket};

pub struct Client {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    socket: Arc<UdpSocket>,
    display_addr: SocketAddr,
    player_name: String,
    phase: SharedPhase,
}

impl Client {
    /// Connects to the server and binds the display socket.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let server_addr = resolve(&config.server_address).await?;
        let display_addr = resolve(&config.gui_address).await?;

        let stream = TcpStream::connect(server_addr).await?;
        stream.set_nodelay(true)?;
        info!("Connected to server at {}", server_addr);

        let bind_addr = match display_addr {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, config.port)),
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        info!(
            "Listening for display input on {}, sending frames to {}",
            socket.local_addr()?,
            display_addr
        );

        let (reader, writer) = stream.into_split();

        Ok(Client {
            reader,
            writer,
            socket: Arc::new(socket),
            display_addr,
            player_name: config.player_name.clone(),
            phase: SharedPhase::default(),
        })
    }

    /// Address the display should send its input to.
    pub fn local_display_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn phase(&self) -> SharedPhase {
        self.phase.clone()
    }

    /// Runs both loops until one of them stops, then returns its error.
    /// Dropping the returned future stops both loops.
    pub async fn run(self) -> Result<(), ClientError> {
        let renderer = Renderer::new(Arc::clone(&self.socket), self.display_addr);
        let handler = InputHandler::new(self.player_name, self.phase.clone());

        let server_loop = run_server_loop(WireBuffer::new(self.reader), renderer, self.phase);
        let display_loop = run_display_loop(self.socket, self.writer, handler);

        let (name, result) = tokio::select! {
            result = server_loop => ("server", result),
            result = display_loop => ("display", result),
        };

        if let Err(e) = &result {
            error!("{} loop failed: {}", name, e);
        }
        result
    }
}

/// Reads server messages, drives the session and renders the results.
///
/// The first message must be Hello. Any read or decode failure ends the
/// loop.
pub async fn run_server_loop<R: AsyncRead + Unpin>(
    mut buffer: WireBuffer<R>,
    renderer: Renderer,
    phase: SharedPhase,
) -> Result<(), ClientError> {
    let parameters = match ServerMessage::decode(&mut buffer).await? {
        ServerMessage::Hello(parameters) => parameters,
        other => return Err(ClientError::MissingHello(other.name())),
    };
    info!(
        "Server {} ({}x{}, {} turns, {} players)",
        parameters.server_name,
        parameters.size_x,
        parameters.size_y,
        parameters.game_length,
        parameters.players_count
    );

    let mut session = Session::new(parameters, phase);
    renderer.send(&session.lobby_frame()).await?;

    loop {
        let message = ServerMessage::decode(&mut buffer).await?;
        debug!("Received {}", message.name());

        if let Outcome::Render(frame) = session.handle(message).await? {
            renderer.send(&frame).await?;
        }
    }
}

/// Reads display input and forwards what the session allows to the server.
pub async fn run_display_loop<W: AsyncWrite + Unpin>(
    socket: Arc<UdpSocket>,
    mut writer: W,
    handler: InputHandler,
) -> Result<(), ClientError> {
    let mut buf = vec![0u8; UDP_BUFFER_LENGTH];

    loop {
        let (len, from) = socket.recv_from(&mut buf).await?;

        match handler.handle_datagram(&buf[..len]).await {
            Ok(Some(message)) => {
                let data = message.encode()?;
                writer.write_all(&data).await?;
                debug!("Forwarded {:?} to the server", message);
            }
            Ok(None) => {}
            Err(e) => warn!("Discarding input from {}: {}", from, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionPhase;
    use shared::{ClientMessage, DisplayMessage, GameParameters, Player};
    use std::time::Duration;
    use tokio::time::timeout;

    fn hello() -> ServerMessage {
        ServerMessage::Hello(GameParameters {
            server_name: "S".to_string(),
            players_count: 1,
            size_x: 5,
            size_y: 5,
            game_length: 10,
            explosion_radius: 1,
            bomb_timer: 2,
        })
    }

    async fn display_pair() -> (UdpSocket, Renderer) {
        let display = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let renderer = Renderer::new(socket, display.local_addr().unwrap());
        (display, renderer)
    }

    async fn recv_frame(display: &UdpSocket) -> DisplayMessage {
        let mut buf = vec![0u8; UDP_BUFFER_LENGTH];
        let (len, _) = timeout(Duration::from_secs(5), display.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let mut wire = WireBuffer::new(&buf[..len]);
        DisplayMessage::decode(&mut wire).await.unwrap()
    }

    #[tokio::test]
    async fn test_server_loop_requires_hello() {
        let (_display, renderer) = display_pair().await;
        let bytes = ServerMessage::GameEnded {
            scores: Default::default(),
        }
        .encode()
        .unwrap();

        let result =
            run_server_loop(WireBuffer::new(&bytes[..]), renderer, SharedPhase::default()).await;
        assert!(matches!(result, Err(ClientError::MissingHello("GameEnded"))));
    }

    #[tokio::test]
    async fn test_server_loop_renders_hello_and_lobby() {
        let (display, renderer) = display_pair().await;
        let mut bytes = hello().encode().unwrap();
        bytes.extend(
            ServerMessage::AcceptedPlayer {
                id: 0,
                player: Player::new("A", "127.0.0.1:1"),
            }
            .encode()
            .unwrap(),
        );

        let phase = SharedPhase::new(SessionPhase::Lobby);
        let result = run_server_loop(WireBuffer::new(&bytes[..]), renderer, phase).await;
        match result {
            Err(ClientError::Transport(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof)
            }
            other => panic!("expected a closed connection, got {:?}", other),
        }

        match recv_frame(&display).await {
            DisplayMessage::Lobby { players, .. } => assert!(players.is_empty()),
            other => panic!("expected a lobby frame, got {:?}", other),
        }
        match recv_frame(&display).await {
            DisplayMessage::Lobby { players, .. } => assert_eq!(players[&0].name, "A"),
            other => panic!("expected a lobby frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_loop_rejects_non_utf8_name() {
        let (display, renderer) = display_pair().await;
        let mut bytes = hello().encode().unwrap();
        // AcceptedPlayer { id: 0, name: 100 x 0xE9, address: "a" }
        bytes.extend([1, 0, 100]);
        bytes.extend([0xE9; 100]);
        bytes.extend([1, b'a']);

        let phase = SharedPhase::new(SessionPhase::Lobby);
        let result = run_server_loop(WireBuffer::new(&bytes[..]), renderer, phase).await;
        assert!(matches!(result, Err(ClientError::Protocol(shared::ProtocolError::InvalidUtf8))));

        // Only the Hello lobby frame went out.
        assert!(matches!(recv_frame(&display).await, DisplayMessage::Lobby { .. }));
    }

    #[tokio::test]
    async fn test_display_loop_joins_then_drops_lobby_input() {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let input_addr = socket.local_addr().unwrap();
        let display = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let join = ClientMessage::Join {
            name: "bob".to_string(),
        }
        .encode()
        .unwrap();
        // The mock writer fails the test if anything beyond Join is written.
        let writer = tokio_test::io::Builder::new().write(&join).build();

        let phase = SharedPhase::default();
        let handler = InputHandler::new("bob", phase.clone());
        let task = tokio::spawn(run_display_loop(socket, writer, handler));

        display.send_to(&[9], input_addr).await.unwrap();
        display.send_to(&[2, 1], input_addr).await.unwrap();
        display.send_to(&[0], input_addr).await.unwrap();

        timeout(Duration::from_secs(5), async {
            while phase.get().await != SessionPhase::Lobby {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
    }
}
