//! Wiring of the sync core for one CLI invocation.

use crate::config::Config;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::remote::{DisabledRemote, RemoteStore, SqliteRemote, StaticProbe};
use crate::store::{LocalStore, SqliteKv};
use crate::sync::{DataManager, FlushOutcome, ReconcileOutcome, SyncError};
use crate::ui::messages::{error, hint, success, sync, warning};
use std::sync::Arc;
use tracing::warn;

pub struct Session {
    pub manager: DataManager,
    online: bool,
    auto_flush: bool,
    log_db: DbPool,
}

impl Session {
    /// Open the local store and the configured remote, then load state.
    pub fn open(cfg: &Config, offline: bool) -> AppResult<Self> {
        let kv = SqliteKv::open(&cfg.database)?;

        let remote: Arc<dyn RemoteStore> = if cfg.remote_enabled() {
            Arc::new(SqliteRemote::open(&cfg.remote_database, &cfg.remote_owner)?)
        } else {
            Arc::new(DisabledRemote)
        };
        let online = !offline && cfg.remote_enabled();

        let manager = DataManager::new(
            LocalStore::new(kv),
            remote,
            Arc::new(StaticProbe(online)),
            cfg.sync.to_sync_config(),
        );
        manager.set_sync_error_callback(report_sync_error);
        manager.initialize();

        Ok(Self {
            manager,
            online,
            auto_flush: cfg.sync.auto_flush,
            log_db: DbPool::new(&cfg.database)?,
        })
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Internal log line; failures are reported but never abort a command.
    pub fn log(&self, operation: &str, target: &str, message: &str) {
        if let Err(e) = ttlog(&self.log_db.conn, operation, target, message) {
            warn!(error = %e, "failed to write internal log");
        }
    }

    /// End of a write command: push the queue when configured to.
    pub async fn finish(&self) {
        if !self.auto_flush {
            return;
        }
        if !self.online {
            let pending = self.manager.pending_changes_count();
            if pending > 0 {
                hint(format!("{pending} change(s) queued, will sync when online"));
            }
            return;
        }
        self.flush().await;
    }

    /// Push pending changes and print the outcome.
    pub async fn flush(&self) -> FlushOutcome {
        let outcome = self.manager.process_queue().await;

        match outcome {
            FlushOutcome::Drained { applied } => {
                sync(format!("{applied} change(s) pushed to remote"));
                self.log("sync", "push", &format!("{applied} task(s) applied"));
            }
            FlushOutcome::Halted { applied, retryable } => {
                let left = self.manager.pending_changes_count();
                if retryable {
                    warning(format!(
                        "Remote unreachable after {applied} change(s), {left} still queued"
                    ));
                }
                self.log(
                    "sync",
                    "push",
                    &format!("halted after {applied} task(s), {left} pending"),
                );
            }
            FlushOutcome::Offline => hint("Offline: changes stay queued"),
            FlushOutcome::Idle | FlushOutcome::AlreadyRunning => {}
        }

        outcome
    }

    /// Pull remote changes and print the outcome.
    pub async fn pull(&self) -> ReconcileOutcome {
        let outcome = self.manager.sync_from_remote().await;

        match &outcome {
            ReconcileOutcome::Merged { fetched, report } => {
                sync(format!(
                    "{fetched} remote event(s): {} added, {} updated",
                    report.added, report.updated
                ));
                self.log(
                    "sync",
                    "pull",
                    &format!("added {}, updated {}", report.added, report.updated),
                );
            }
            ReconcileOutcome::Unchanged { fetched } => {
                success(format!("Up to date ({fetched} remote event(s))"));
            }
            ReconcileOutcome::Failed(msg) => warning(format!("Remote pull failed: {msg}")),
        }

        outcome
    }
}

fn report_sync_error(err: SyncError) {
    error(format!(
        "{} ({} of event {}): {}",
        err.message, err.kind, err.event_id, err.error
    ));
    hint("Run `rtimetrack sync` to retry");
}
