// ABOUTME: Entry point for sessionchat — a terminal chat client with a session launcher.
// ABOUTME: Parses CLI args, loads config and .env, sets up logging, and launches the app.

use std::path::PathBuf;

use clap::Parser;

use sessionchat::app::App;
use sessionchat::channel;
use sessionchat::config::{Config, Overrides};
use sessionchat::logging;

#[derive(Debug, Parser)]
#[command(name = "sessionchat", version, about = "Terminal chat client with session launcher")]
struct Cli {
    /// Real-time channel base address (e.g. ws://localhost:8000/ws).
    #[arg(long)]
    socket_url: Option<String>,

    /// HTTP API base address (e.g. http://localhost:8000).
    #[arg(long)]
    http_url: Option<String>,

    /// Open this session directly instead of the launcher.
    #[arg(long)]
    session: Option<String>,

    /// Session store file (defaults to the user data directory).
    #[arg(long)]
    store: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    let mut config = Config::load()?;
    config.apply_env();
    config.apply_overrides(Overrides {
        socket_base: cli.socket_url,
        http_base: cli.http_url,
    });

    let _guard = logging::init(&Config::log_dir(), &cli.log_level)?;

    channel::install_crypto_provider();

    let store_path = cli.store.unwrap_or_else(Config::store_path);
    App::new(config, store_path, cli.session).run().await
}
