use clap::Parser;
use client::config::ClientConfig;
use client::network::Client;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Display address as host:port (hostname, IPv4 or IPv6)
    #[arg(short = 'd', long)]
    gui_address: String,

    /// Name sent to the server when joining
    #[arg(short = 'n', long)]
    player_name: String,

    /// Local UDP port the display sends input to
    #[arg(short = 'p', long)]
    port: u16,

    /// Game server address as host:port
    #[arg(short = 's', long)]
    server_address: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Server: {}, display: {}", args.server_address, args.gui_address);

    let config = ClientConfig {
        gui_address: args.gui_address,
        player_name: args.player_name,
        port: args.port,
        server_address: args.server_address,
    };

    let client = Client::connect(&config).await?;
    client.run().await?;

    Ok(())
}
