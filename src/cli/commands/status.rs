use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::session::Session;
use crate::errors::AppResult;
use crate::utils::colors::{GREEN, GREY, RESET, YELLOW, color_for_kind};

pub async fn handle(cmd: &Commands, cfg: &Config, offline: bool) -> AppResult<()> {
    if !matches!(cmd, Commands::Status) {
        return Ok(());
    }

    let session = Session::open(cfg, offline)?;
    let manager = &session.manager;

    let remote = if !cfg.remote_enabled() {
        format!("{GREY}disabled{RESET}")
    } else if session.is_online() {
        format!("{GREEN}{}{RESET}", cfg.remote_database)
    } else {
        format!("{YELLOW}{} (offline){RESET}", cfg.remote_database)
    };

    println!("🗄️  Database : {}", cfg.database);
    println!("☁️  Remote   : {}", remote);
    println!("📋 Events   : {}", manager.get_all_events().len());

    let tasks = manager.pending_tasks();
    if tasks.is_empty() {
        println!("✔ No pending changes");
        return Ok(());
    }

    println!("⏳ Pending  : {}", tasks.len());
    for task in &tasks {
        let color = color_for_kind(task.kind());
        println!(
            "   {color}{:<6}{RESET} event {:<13} {GREY}queued {}{RESET}",
            task.kind().as_str(),
            task.target_id(),
            task.enqueued_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}
