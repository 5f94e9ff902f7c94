use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;

/// Parses command-line arguments and serves one peer.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Turns until a bomb explodes
        #[clap(short = 'b', long, default_value = "5")]
        bomb_timer: u16,
        /// Players announced in Hello
        #[clap(short = 'c', long, default_value = "1")]
        players_count: u8,
        /// Milliseconds per turn
        #[clap(short = 'd', long, default_value = "500")]
        turn_duration: u64,
        /// Blast radius in cells
        #[clap(short = 'e', long, default_value = "3")]
        explosion_radius: u16,
        /// Blocks placed at turn 0
        #[clap(short = 'k', long, default_value = "10")]
        initial_blocks: u16,
        /// Number of turns per game
        #[clap(short = 'l', long, default_value = "100")]
        game_length: u16,
        /// Server name sent in Hello
        #[clap(short = 'n', long, default_value = "robots")]
        server_name: String,
        /// TCP port to listen on
        #[clap(short = 'p', long, default_value = "2022")]
        port: u16,
        /// RNG seed
        #[clap(short = 's', long)]
        seed: Option<u64>,
        /// Board width
        #[clap(short = 'x', long, default_value = "10")]
        size_x: u16,
        /// Board height
        #[clap(short = 'y', long, default_value = "10")]
        size_y: u16,
    }

    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig {
        bomb_timer: args.bomb_timer,
        players_count: args.players_count,
        turn_duration: args.turn_duration,
        explosion_radius: args.explosion_radius,
        initial_blocks: args.initial_blocks,
        game_length: args.game_length,
        server_name: args.server_name,
        port: args.port,
        seed: args.seed,
        size_x: args.size_x,
        size_y: args.size_y,
    };

    let server = Server::bind(config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
