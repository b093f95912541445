use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crosstalk_server::admin::{self, EntityCommand};
use crosstalk_server::config::RelayConfig;
use crosstalk_server::db::pool::{create_pool, run_migrations};
use crosstalk_server::discord::DiscordClient;
use crosstalk_server::protocol::identification::ProfileResolver;
use crosstalk_server::relay::listener::start_relay_listener;
use crosstalk_server::relay::{ConnectionRegistry, RelayState};

#[derive(Parser)]
#[command(name = "crosstalk-server", about = "Relay between game-server chat and Discord")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "crosstalk.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the relay (the default when no subcommand is given)
    Run,
    /// Manage the entity directory
    Entity {
        #[command(subcommand)]
        command: EntityCommand,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = RelayConfig::load(&cli.config);

    let pool = create_pool(&config.database.url).await?;
    run_migrations(&pool).await?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Entity { command } => admin::run(command, &pool).await,
        Command::Run => {
            let relay_addr = config.server.relay_address.clone();
            let state = Arc::new(RelayState {
                db: pool,
                discord: DiscordClient::new(config.bot.token.clone()),
                resolver: ProfileResolver::new(),
                registry: ConnectionRegistry::new(),
                config,
            });

            let cancel = CancellationToken::new();
            let listener_cancel = cancel.clone();
            let listener = tokio::spawn(async move {
                start_relay_listener(&relay_addr, state, listener_cancel).await;
            });

            info!("crosstalk relay started");
            tokio::signal::ctrl_c().await?;
            info!("shutdown requested");
            cancel.cancel();
            listener.await?;
            Ok(())
        }
    }
}
