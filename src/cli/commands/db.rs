use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::initialize::open_db;
use crate::db::migrate::{applied_versions, run_pending_migrations};
use crate::db::pool::DbPool;
use crate::db::stats;
use crate::errors::{AppError, AppResult};
use crate::utils::colors::{CYAN, GREEN, RED, RESET};
use std::fs;

fn file_size(path: &str) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn migrate(pool: &DbPool) -> AppResult<()> {
    println!("{CYAN}▶ Running migrations…{RESET}");
    run_pending_migrations(&pool.conn)?;
    let applied = applied_versions(&pool.conn)?.len();
    println!("{GREEN}✔ Migration completed ({applied} applied).{RESET}\n");
    Ok(())
}

fn check(pool: &DbPool) -> AppResult<()> {
    println!("{CYAN}▶ Running integrity check…{RESET}");
    let integrity: String = pool
        .conn
        .query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;

    if integrity == "ok" {
        println!("{GREEN}✔ Integrity check passed.{RESET}\n");
    } else {
        println!("{RED}✘ Integrity check failed:{RESET} {integrity}\n");
    }
    Ok(())
}

fn vacuum(pool: &DbPool, path: &str) -> AppResult<()> {
    println!("{CYAN}▶ Running VACUUM…{RESET}");
    let before = file_size(path);
    pool.conn.execute_batch("VACUUM;")?;
    let after = file_size(path);
    println!("{GREEN}✔ Vacuum completed ({before} → {after} bytes).{RESET}\n");
    Ok(())
}

/// Maintenance of the local database, or of the remote store file with
/// `--shared`. Steps run in a fixed order: migrate, info, check, vacuum.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Db {
        migrate: do_migrate,
        check: do_check,
        vacuum: do_vacuum,
        info: do_info,
        shared,
    } = cmd
    else {
        return Ok(());
    };

    if !(*do_migrate || *do_check || *do_vacuum || *do_info) {
        println!("Nothing to do: use --migrate, --check, --vacuum or --info.");
        return Ok(());
    }

    let path = if *shared {
        if !cfg.remote_enabled() {
            return Err(AppError::RemoteDisabled);
        }
        cfg.remote_database.as_str()
    } else {
        cfg.database.as_str()
    };

    // open_db already brings the schema up to date; --migrate reports it
    let pool = if *do_migrate {
        DbPool::new(path)?
    } else {
        open_db(path)?
    };

    if *do_migrate {
        migrate(&pool)?;
    }
    if *do_info {
        stats::print_db_info(&pool, path)?;
    }
    if *do_check {
        check(&pool)?;
    }
    if *do_vacuum {
        vacuum(&pool, path)?;
    }

    Ok(())
}
