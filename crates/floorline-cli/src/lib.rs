// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod commands;

use clap::{error::ErrorKind, ArgAction, Parser, Subcommand};
use floorline_core::{ExitCode, MachineError, ENV_FLOORLINE_LOG_JSON};
use floorline_ingest::IngestError;
use floorline_store::{StoreError, StoreErrorCode};
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

pub const CRATE_NAME: &str = "floorline-cli";

/// Env var holding the comma-separated tokens `replay` and `events` check
/// `--token` against. Unset means local operator mode.
pub const ENV_FLOORLINE_API_TOKENS: &str = "FLOORLINE_API_TOKENS";

const FLOORLINE_HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
Usage: {usage}

Options:
{options}

Commands:
{subcommands}
{after-help}";

#[derive(Parser)]
#[command(name = "floorline")]
#[command(version)]
#[command(about = "Floorline event ledger operations CLI")]
#[command(help_template = FLOORLINE_HELP_TEMPLATE)]
#[command(
    after_help = "Environment:\n  FLOORLINE_DB_PATH     Default ledger path\n  FLOORLINE_API_TOKENS  Accepted tokens for replay/events\n  FLOORLINE_LOG_JSON    Emit JSON logs on stderr"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the ledger file and apply the schema.
    Init {
        #[arg(long, env = "FLOORLINE_DB_PATH")]
        db: PathBuf,
    },
    /// Register a unit so events can reference it.
    RegisterUnit {
        #[arg(long, env = "FLOORLINE_DB_PATH")]
        db: PathBuf,
        #[arg(long)]
        unit_id: String,
        #[arg(long)]
        order_id: String,
        #[arg(long)]
        org_id: String,
        #[arg(long)]
        unit_number: u32,
    },
    /// Replay a JSON file of events through bulk ingestion.
    Replay {
        #[arg(long, env = "FLOORLINE_DB_PATH")]
        db: PathBuf,
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        token: Option<String>,
    },
    /// List a unit's recorded events.
    Events {
        #[arg(long, env = "FLOORLINE_DB_PATH")]
        db: PathBuf,
        #[arg(long)]
        unit_id: String,
        #[arg(long)]
        token: Option<String>,
    },
}

#[derive(Clone, Copy)]
struct OutputMode {
    json: bool,
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success as u8),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code as u8)
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => {
                return Err(CliError {
                    exit_code: ExitCode::Usage,
                    machine: MachineError::new("usage_error", "invalid command line arguments")
                        .with_detail("error", &err.to_string()),
                });
            }
        },
    };
    let output_mode = OutputMode { json: cli.json };
    let command = cli.command.ok_or_else(|| CliError {
        exit_code: ExitCode::Usage,
        machine: MachineError::new("usage_error", "missing command; see --help"),
    })?;
    init_logging(cli.quiet, cli.verbose);

    match command {
        Commands::Init { db } => commands::run_init(&db, output_mode),
        Commands::RegisterUnit {
            db,
            unit_id,
            order_id,
            org_id,
            unit_number,
        } => commands::run_register_unit(
            &db,
            &commands::UnitArgs {
                unit_id,
                order_id,
                org_id,
                unit_number,
            },
            output_mode,
        ),
        Commands::Replay { db, file, token } => {
            commands::run_replay(&db, &file, token.as_deref(), output_mode)
        }
        Commands::Events { db, unit_id, token } => {
            commands::run_events(&db, &unit_id, token.as_deref(), output_mode)
        }
    }
}

fn init_logging(quiet: bool, verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let json = std::env::var(ENV_FLOORLINE_LOG_JSON)
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    let registry = tracing_subscriber::registry().with(filter);
    // A second init in the same process is a no-op.
    let _ = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
}

#[derive(Debug)]
struct CliError {
    exit_code: ExitCode,
    machine: MachineError,
}

impl CliError {
    fn internal(message: String) -> Self {
        Self {
            exit_code: ExitCode::Internal,
            machine: MachineError::new("internal_error", &message),
        }
    }

    fn validation(message: &str) -> Self {
        Self {
            exit_code: ExitCode::Validation,
            machine: MachineError::new("validation_error", message),
        }
    }

    fn input(message: String) -> Self {
        Self {
            exit_code: ExitCode::Usage,
            machine: MachineError::new("usage_error", &message),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err.code {
            StoreErrorCode::Conflict => Self {
                exit_code: ExitCode::Validation,
                machine: MachineError::new("conflict", &message),
            },
            StoreErrorCode::NotFound => Self {
                exit_code: ExitCode::Validation,
                machine: MachineError::new("not_found", &message),
            },
            code => Self {
                exit_code: ExitCode::DependencyFailure,
                machine: MachineError::new("dependency_failure", &message)
                    .with_detail("store_code", code.as_str()),
            },
        }
    }
}

impl From<IngestError> for CliError {
    fn from(err: IngestError) -> Self {
        let message = err.to_string();
        match err {
            IngestError::Storage(store) => Self::from(store),
            IngestError::Validation(v) => {
                let mut machine = MachineError::new("validation_error", &message);
                for field in &v.field_errors {
                    machine = machine.with_detail(&field.field, &field.reason);
                }
                Self {
                    exit_code: ExitCode::Validation,
                    machine,
                }
            }
            IngestError::Unauthorized(_) => Self {
                exit_code: ExitCode::Usage,
                machine: MachineError::new("unauthorized", &message),
            },
            IngestError::NotFound(_) => Self {
                exit_code: ExitCode::Validation,
                machine: MachineError::new("not_found", &message),
            },
        }
    }
}

fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        let machine = error
            .machine
            .clone()
            .with_detail("exit", error.exit_code.as_str());
        match serde_json::to_string(&machine) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"internal_error\",\"message\":\"failed to encode structured error\",\"details\":{{}}}}"
            ),
        }
    } else {
        eprintln!("{}", error.machine.message);
    }
}
