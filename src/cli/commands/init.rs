use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::initialize::open_db;
use crate::db::log;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};

/// Handle the `init` command
///
/// This initializes:
///  - the config directory and file (file skipped in test mode)
///  - the local SQLite database with its migrations
///  - the remote store file
pub fn handle(cli: &Cli) -> AppResult<()> {
    //
    // 1️⃣ CONFIGURAZIONE
    //
    let cfg = Config::init_all(cli.db.clone(), cli.remote.clone(), cli.test)?;

    println!("⚙️  Initializing rTimeTrack…");
    println!("📄 Config file : {}", Config::config_file().display());
    println!("🗄️  Database    : {}", cfg.database);
    println!("☁️  Remote      : {}", cfg.remote_database);

    //
    // 2️⃣ DATABASE LOCALE (tabelle + migrazioni)
    //
    let local = open_db(&cfg.database)?;
    success(format!("Database initialized at {}", cfg.database));

    //
    // 3️⃣ REMOTE STORE
    //
    open_db(&cfg.remote_database)?;
    success(format!("Remote store ready at {}", cfg.remote_database));

    //
    // 4️⃣ LOG INTERNO (non bloccante)
    //
    if let Err(e) = log::ttlog(
        &local.conn,
        "init",
        "Database initialized",
        &format!("Database initialized at {}", cfg.database),
    ) {
        warning(format!("Failed to write internal log: {e}"));
    }

    println!("🎉 rTimeTrack initialization completed!");
    Ok(())
}
