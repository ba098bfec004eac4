use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::arena_bot::BotSession;
use crate::arena_transport::TcpLineTransport;

mod arena_bot;
mod arena_deck;
mod arena_game;
mod arena_proto;
mod arena_scoring;
mod arena_transport;

/// Heuristic client for the arena card game server.
#[derive(Parser)]
#[command(name = "rust-arena-bot", version)]
struct Cli {
    /// Game server hostname
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Game server port
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Team name announced to the server
    #[arg(long, default_value = "BUTiChat")]
    team_name: String,

    /// Log filter, e.g. "info" or "rust_arena_bot=debug"
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level)?)
        .init();

    info!(host = %cli.host, port = cli.port, "configured");

    let transport = TcpLineTransport::new(&cli.host, cli.port);
    let mut session = BotSession::new(cli.team_name, transport);
    session.run().await?;

    Ok(())
}
