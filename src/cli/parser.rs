use clap::{Parser, Subcommand};

/// Command-line interface definition for rTimeTrack
/// Offline-first time tracking: events and their timed records, synced to a shared store
#[derive(Parser)]
#[command(
    name = "rtimetrack",
    version = env!("CARGO_PKG_VERSION"),
    about = "Offline-first time tracking CLI: log events and records locally, sync them when online",
    long_about = None
)]
pub struct Cli {
    /// Override local database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Override the remote store path
    #[arg(global = true, long = "remote")]
    pub remote: Option<String>,

    /// Work offline: changes are queued, nothing is sent
    #[arg(global = true, long = "offline")]
    pub offline: bool,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the local database, the remote store and the configuration
    Init,

    /// Show the configuration file
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,

        #[arg(long = "shared", help = "Operate on the remote store file instead")]
        shared: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Create, edit or delete events
    Event {
        #[command(subcommand)]
        action: EventAction,
    },

    /// Create, edit or delete the records of an event
    Record {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// List events (or the records of one event)
    List {
        #[arg(long = "event", help = "Show the records of this event")]
        event: Option<i64>,
    },

    /// Push queued changes, then pull remote changes
    Sync {
        #[arg(long = "watch", help = "Keep flushing periodically until Ctrl-C")]
        watch: bool,
    },

    /// Show pending changes and sync state
    Status,
}

#[derive(Subcommand)]
pub enum EventAction {
    /// Create an event
    Add {
        title: String,

        #[arg(long, short = 'd', default_value = "")]
        description: String,
    },

    /// Change title and/or description
    Edit {
        id: i64,

        #[arg(long, short = 't')]
        title: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,
    },

    /// Delete an event and all its records
    Del {
        id: i64,

        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum RecordAction {
    /// Log a record under an event
    Add {
        event_id: i64,

        /// Start time (HH:MM)
        #[arg(long = "in")]
        start: String,

        /// End time (HH:MM)
        #[arg(long = "out")]
        end: String,

        /// Start date (YYYY-MM-DD), default today
        #[arg(long = "date")]
        date: Option<String>,

        /// End date (YYYY-MM-DD), default the start date
        #[arg(long = "end-date")]
        end_date: Option<String>,

        #[arg(long, short = 'n', default_value = "")]
        note: String,
    },

    /// Change fields of a record
    Edit {
        event_id: i64,
        record_id: i64,

        #[arg(long = "in")]
        start: Option<String>,

        #[arg(long = "out")]
        end: Option<String>,

        #[arg(long = "date")]
        date: Option<String>,

        #[arg(long = "end-date")]
        end_date: Option<String>,

        #[arg(long, short = 'n')]
        note: Option<String>,
    },

    /// Delete a record
    Del { event_id: i64, record_id: i64 },
}
