//! Bank dice game server.
//!
//! Every game runs in its own actor managed by a `GameManager`, with
//! committed states kept in memory or in PostgreSQL.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Error};
use bank_dice::{
    GameManager,
    db::{Database, GameStore, MemoryGameStore},
    nickname::HttpNicknameService,
};
use bd_server::{
    api,
    config::{ServerConfig, StoreBackend},
    logging,
};
use pico_args::Arguments;
use tracing::{error, info};

const HELP: &str = "\
Run a bank dice game server

USAGE:
  bd_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --store      STORE       memory or postgres          [default: env GAME_STORE or memory]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  GAME_STORE               Where games are kept (memory, postgres)
  DATABASE_URL             PostgreSQL connection string
  NICKNAME_URL             Nickname service endpoint (optional)
  NICKNAME_TIMEOUT_MS      How long a join waits for a nickname [default: 2000]
  GAME_NUM_ROUNDS          Rounds for new games [default: 10]
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let store: Option<StoreBackend> = pargs.opt_value_from_str("--store")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind, store, database_url)?;
    config.validate()?;

    let store: Arc<dyn GameStore> = match (config.store, &config.database) {
        (StoreBackend::Postgres, Some(db_config)) => {
            info!("Connecting to database");
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to database")?;
            let store = db
                .game_store()
                .await
                .context("Failed to prepare games table")?;
            info!("Database connected successfully");
            Arc::new(store)
        }
        _ => {
            info!("Keeping games in memory");
            Arc::new(MemoryGameStore::new())
        }
    };

    let mut manager = GameManager::new(store, config.game.clone());
    if let Some(endpoint) = &config.nickname.endpoint {
        info!("Generating nicknames with {}", endpoint);
        manager = manager.with_nickname_service(
            Arc::new(HttpNicknameService::new(endpoint.clone())),
            config.nickname.timeout,
        );
    }

    let loaded = manager
        .load_existing_games()
        .await
        .context("Failed to load stored games")?;
    info!("Server ready with {} stored game(s)", loaded);

    let app = api::create_router(api::AppState {
        games: Arc::new(manager),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
}
