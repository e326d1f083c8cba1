use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::session::Session;
use crate::errors::AppResult;
use crate::ui::messages::{info, warning};

pub async fn handle(cmd: &Commands, cfg: &Config, offline: bool) -> AppResult<()> {
    let Commands::Sync { watch } = cmd else {
        return Ok(());
    };

    if !cfg.remote_enabled() {
        warning("No remote store configured (remote_database is empty).");
        return Ok(());
    }
    if offline {
        warning("Offline mode: nothing to sync.");
        return Ok(());
    }

    let session = Session::open(cfg, offline)?;

    // 1️⃣ push, 2️⃣ pull
    session.flush().await;
    session.pull().await;

    if *watch {
        info(format!(
            "Watching: flushing every {}s, Ctrl-C to stop.",
            session.manager.config().flush_interval.as_secs()
        ));
        let flusher = session.manager.spawn_background_sync();
        tokio::signal::ctrl_c().await?;
        flusher.abort();
        info("Stopped.");
    }

    Ok(())
}
