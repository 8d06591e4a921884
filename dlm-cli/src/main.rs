mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dlm",
    about = "dlm — run commands under a lease-based distributed lock",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hold a lock on a resource while a command runs
    Run(RunArgs),

    /// Show the stored lock record for a resource
    Status(StatusArgs),

    /// Print version information
    Version,
}

impl Commands {
    /// Only commands that touch a lock read the environment defaults, so a
    /// malformed variable cannot break `--help` or `version`.
    fn uses_lock_defaults(&self) -> bool {
        matches!(self, Commands::Run(_) | Commands::Status(_))
    }
}

#[derive(Args, Debug)]
pub struct StoreArgs {
    /// SQLite database shared by every participating process
    #[arg(long, env = "DLM_DB")]
    pub db: PathBuf,

    /// Lock table; defaults to DLM_TABLE_NAME or the built-in default
    #[arg(long)]
    pub table: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Lease length in seconds; defaults to DLM_DURATION_SECS or the built-in default
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub duration: Option<u64>,

    /// Milliseconds to sleep between contended attempts; 0 retries immediately
    #[arg(long, default_value = "100")]
    pub poll_ms: u64,

    /// Resource to lock
    pub resource: String,

    /// Command to run while the lock is held
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Resource to inspect
    pub resource: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.command.uses_lock_defaults() {
        if let Err(err) = dlm_core::config::init_from_env() {
            tracing::error!(error = %err, "invalid lock defaults in environment");
            return ExitCode::from(2);
        }
    }

    let result = match cli.command {
        Commands::Run(args) => commands::run(&args),
        Commands::Status(args) => commands::status(&args).map(|_| ExitCode::SUCCESS),
        Commands::Version => {
            println!("dlm {}", env!("CARGO_PKG_VERSION"));
            println!("Lease-based distributed locks over conditional writes");
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "dlm failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_trailing_command() {
        let cli = Cli::try_parse_from([
            "dlm", "run", "--db", "locks.db", "--duration", "30", "nightly-report", "--",
            "echo", "--flag",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.store.db, PathBuf::from("locks.db"));
                assert_eq!(args.store.table, None);
                assert_eq!(args.duration, Some(30));
                assert_eq!(args.poll_ms, 100);
                assert_eq!(args.resource, "nightly-report");
                assert_eq!(args.command, vec!["echo", "--flag"]);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn run_requires_a_command() {
        assert!(Cli::try_parse_from(["dlm", "run", "--db", "locks.db", "R"]).is_err());
    }

    #[test]
    fn only_lock_commands_load_env_defaults() {
        let version = Cli::try_parse_from(["dlm", "version"]).unwrap();
        assert!(!version.command.uses_lock_defaults());

        let status = Cli::try_parse_from(["dlm", "status", "--db", "l.db", "R"]).unwrap();
        assert!(status.command.uses_lock_defaults());
    }

    #[test]
    fn run_rejects_zero_duration() {
        let parsed = Cli::try_parse_from([
            "dlm", "run", "--db", "locks.db", "--duration", "0", "R", "--", "true",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_status() {
        let cli =
            Cli::try_parse_from(["dlm", "status", "--db", "l.db", "--table", "jobs", "R"]).unwrap();

        match cli.command {
            Commands::Status(args) => {
                assert_eq!(args.store.table.as_deref(), Some("jobs"));
                assert_eq!(args.resource, "R");
            }
            _ => panic!("expected status"),
        }
    }
}
