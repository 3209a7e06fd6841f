mod handlers;

use anyhow::Result;
use clap::{Parser, Subcommand};
use handlers::approve::Decision;
use std::path::PathBuf;
use techdash::config::{Config, ConfigOverrides, LoadOptions, LogFormat};
use techdash::{RequestStatus, TaskEdit, TaskStatus};

#[derive(Parser)]
#[command(name = "techdash", version, about = "Vehicle repair authorisation")]
struct Cli {
    /// Path to the request database
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Config file (defaults to ./techdash.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log more (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Create the request database
    Init,
    /// Submit a new authorisation request
    Submit {
        /// Workshop job (WIP) number
        #[arg(long)]
        wip: String,
        /// Vehicle registration
        #[arg(long)]
        reg: String,
        /// Description of the work
        #[arg(long)]
        work: String,
        /// Overall labour hours, used only when no tasks are given
        #[arg(long)]
        labour: Option<String>,
        /// Itemised task as "description:hours[:parts]" (repeatable)
        #[arg(long = "task", short = 't')]
        tasks: Vec<String>,
    },
    /// List all requests with hour totals
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one request in detail
    Show {
        request: String,
        #[arg(long)]
        json: bool,
        /// Strict mode: require exact id, WIP or registration (no fuzzy matching)
        #[arg(long)]
        strict: bool,
    },
    /// Edit one task of a request (1-based index)
    Task {
        request: String,
        index: usize,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        hours: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        parts: Option<bool>,
        #[arg(long)]
        strict: bool,
    },
    /// Authorise every task of a request
    Approve {
        request: String,
        #[arg(long)]
        strict: bool,
    },
    /// Decline every task of a request
    Decline {
        request: String,
        #[arg(long)]
        strict: bool,
    },
    /// Set the status of a request billed by overall labour
    Status {
        request: String,
        status: RequestStatus,
        #[arg(long)]
        strict: bool,
    },
    /// Show approved and requested hours
    Report {
        #[arg(long)]
        json: bool,
    },
    /// Delete a request and its tasks
    Delete {
        request: String,
        #[arg(long)]
        strict: bool,
    },
}

fn init_logging(config: &Config) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => None,
        1 => Some("info".to_string()),
        _ => Some("debug".to_string()),
    };
    let config = Config::load(LoadOptions {
        config_path: cli.config.clone(),
        overrides: ConfigOverrides {
            db_path: cli.db.clone(),
            log_level,
        },
    })?;
    init_logging(&config);
    tracing::debug!(db = %config.database.path.display(), "configuration loaded");

    match cli.command {
        Commands::Init
        | Commands::Submit { .. }
        | Commands::Task { .. }
        | Commands::Approve { .. }
        | Commands::Decline { .. }
        | Commands::Status { .. }
        | Commands::Delete { .. } => dispatch_write_ops(&config, cli.command),
        Commands::List { .. } | Commands::Show { .. } | Commands::Report { .. } => {
            dispatch_read_ops(&config, cli.command)
        }
    }
}

fn dispatch_write_ops(config: &Config, cmd: Commands) -> Result<()> {
    let db = config.database.path.as_path();
    match cmd {
        Commands::Init => handlers::init::handle(db),
        Commands::Submit {
            wip,
            reg,
            work,
            labour,
            tasks,
        } => handlers::submit::handle(db, &wip, &reg, &work, labour.as_deref(), &tasks),
        Commands::Task {
            request,
            index,
            status,
            hours,
            description,
            parts,
            strict,
        } => {
            let edit = TaskEdit {
                description,
                estimated_hours: hours.as_deref().map(techdash::engine::types::coerce_hours),
                parts_required: parts,
                status,
            };
            handlers::task::handle(db, &request, index, &edit, strict)
        }
        Commands::Approve { request, strict } => {
            handlers::approve::handle(db, &request, Decision::Approve, strict)
        }
        Commands::Decline { request, strict } => {
            handlers::approve::handle(db, &request, Decision::Decline, strict)
        }
        Commands::Status {
            request,
            status,
            strict,
        } => handlers::status::handle(db, &request, status, strict),
        Commands::Delete { request, strict } => handlers::delete::handle(db, &request, strict),
        _ => unreachable!("Invalid write command dispatch"),
    }
}

fn dispatch_read_ops(config: &Config, cmd: Commands) -> Result<()> {
    let db = config.database.path.as_path();
    match cmd {
        Commands::List { json } => handlers::list::handle(db, json),
        Commands::Show {
            request,
            json,
            strict,
        } => handlers::show::handle(db, &request, json, strict),
        Commands::Report { json } => handlers::report::handle(db, json),
        _ => unreachable!("Invalid read command dispatch"),
    }
}
