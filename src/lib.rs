//! rTimeTrack library root.
//!
//! The offline-first sync core lives in [`sync`] (data manager, mutation
//! queue, queue processor, reconciler, change bus) on top of [`store`]
//! (local persistence) and [`remote`] (remote document store). The CLI in
//! [`cli`] is one consumer of its public API.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod remote;
pub mod store;
pub mod sync;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use tracing_subscriber::EnvFilter;

/// Central command dispatcher
pub async fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let offline = cli.offline;

    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
        Commands::Event { .. } => cli::commands::event::handle(&cli.command, cfg, offline).await,
        Commands::Record { .. } => cli::commands::record::handle(&cli.command, cfg, offline).await,
        Commands::List { .. } => cli::commands::list::handle(&cli.command, cfg, offline).await,
        Commands::Sync { .. } => cli::commands::sync::handle(&cli.command, cfg, offline).await,
        Commands::Status => cli::commands::status::handle(&cli.command, cfg, offline).await,
    }
}

/// Diagnostics to stderr; RUST_LOG wins over the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // a second init (e.g. in tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Entry point usato da main.rs
pub fn run() -> AppResult<()> {
    // 1️⃣ parse CLI
    let cli = Cli::parse();

    // 2️⃣ carica config UNA sola volta
    let mut cfg = Config::load()?;

    // 3️⃣ override da riga di comando
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }
    if let Some(custom_remote) = &cli.remote {
        cfg.remote_database = custom_remote.clone();
    }

    init_tracing(&cfg.log_level);

    // 4️⃣ runtime single-thread: il core non richiede altro
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(dispatch(&cli, &cfg))
}
