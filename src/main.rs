mod handlers;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use slipway::engine::db::Db;
use slipway::engine::error::ScheduleError;
use slipway::engine::types::{ScopeKey, StatusDuration};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slipway", version, about = "Business-day schedules that slip honestly")]
struct Cli {
    /// Path to the schedule store
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct ScopeArgs {
    #[arg(long, short = 'p')]
    project: i64,
    #[arg(long, short = 'b')]
    batch: i64,
    #[arg(long, short = 'i')]
    image: i64,
}

impl From<ScopeArgs> for ScopeKey {
    fn from(a: ScopeArgs) -> Self {
        Self::new(a.project, a.batch, a.image)
    }
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Create the schedule store and seed the default statuses
    Init,
    /// List statuses, or add one to the catalog
    Status {
        #[arg(long)]
        add: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show or change engine settings
    Config {
        key: Option<String>,
        value: Option<String>,
    },
    /// Lay out a status sequence over business days
    Plan {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Status and duration in business days, e.g. `4:3` (repeatable, in order)
        #[arg(long = "step", short = 's', required = true)]
        steps: Vec<StatusDuration>,
        /// First candidate day (defaults to today)
        #[arg(long)]
        anchor: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Set the status of cells on specific dates
    Paint {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Status name or id
        #[arg(long)]
        status: String,
        /// Mark the painted cells completed
        #[arg(long)]
        done: bool,
        #[arg(required = true)]
        dates: Vec<NaiveDate>,
    },
    /// Remove cells on specific dates
    Erase {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(required = true)]
        dates: Vec<NaiveDate>,
    },
    /// Show cells in a date range as stored
    Cells {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        #[arg(long)]
        json: bool,
    },
    /// Recompute delays for a scope and show the resulting range
    Delay {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        /// Override the current date
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let db = cli.db.unwrap_or_else(Db::default_path);

    let result = match cli.command {
        Commands::Init
        | Commands::Status { add: Some(_), .. }
        | Commands::Config { value: Some(_), .. }
        | Commands::Plan { .. }
        | Commands::Paint { .. }
        | Commands::Erase { .. }
        | Commands::Delay { .. } => dispatch_write_ops(&db, cli.command),
        Commands::Status { .. } | Commands::Config { .. } | Commands::Cells { .. } => {
            dispatch_read_ops(&db, cli.command)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red());
            let caller = e
                .downcast_ref::<ScheduleError>()
                .is_some_and(ScheduleError::is_caller_error);
            ExitCode::from(if caller { 2 } else { 1 })
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SLIPWAY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn dispatch_write_ops(db: &Path, cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Init => handlers::init::handle(db),
        Commands::Status { add: Some(name), json } => handlers::status::add(db, &name, json),
        Commands::Config {
            key: Some(key),
            value: Some(value),
        } => handlers::config::set(db, &key, &value),
        Commands::Plan {
            scope,
            steps,
            anchor,
            json,
        } => handlers::plan::handle(db, scope.into(), steps, anchor, json),
        Commands::Paint {
            scope,
            status,
            done,
            dates,
        } => handlers::paint::handle(db, scope.into(), &status, done, &dates),
        Commands::Erase { scope, dates } => handlers::erase::handle(db, scope.into(), &dates),
        Commands::Delay {
            scope,
            from,
            to,
            today,
            json,
        } => handlers::delay::handle(db, scope.into(), from, to, today, json),
        _ => unreachable!("Invalid write command dispatch"),
    }
}

fn dispatch_read_ops(db: &Path, cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Status { add: None, json } => handlers::status::list(db, json),
        Commands::Config { key, value: None } => handlers::config::show(db, key.as_deref()),
        Commands::Cells {
            scope,
            from,
            to,
            json,
        } => handlers::cells::handle(db, scope.into(), from, to, json),
        _ => unreachable!("Invalid read command dispatch"),
    }
}
