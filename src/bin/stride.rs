//! Stride CLI - Command-line interface for the weekly step-goal engine
//!
//! Commands:
//! - admit: Register an admission in the store
//! - ingest: Upsert manually supplied daily step counts
//! - evaluate: Calculate and record the weekly target status
//! - commit: Record the goal chosen by the patient
//! - stats: Print step statistics for a date range
//! - set-max-goal / set-agreement: Record clinician-entered limits

use clap::{Parser, Subcommand, ValueEnum};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use stride_goals::calendar::parse_day;
use stride_goals::store::DataAccess;
use stride_goals::types::{AgreementWindow, DaySteps, MaxGoal, PatientChoice};
use stride_goals::{Algorithm, ComputeError, GoalProcessor, MemoryStore, ProgramConfig, STRIDE_VERSION};

/// Stride - Weekly step-goal engine for walking programs
#[derive(Parser)]
#[command(name = "stride")]
#[command(version = STRIDE_VERSION)]
#[command(about = "Evaluate weekly step goals for walking-program admissions", long_about = None)]
struct Cli {
    /// Store file (JSON); created on first write
    #[arg(short, long, global = true, default_value = "stride-store.json")]
    store: PathBuf,

    /// Program configuration file (JSON); STEP defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log decisions to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an admission
    Admit {
        admission: String,

        /// Enrolment date; steps before it are not ingested
        #[arg(long, value_parser = parse_date_arg)]
        enrol_date: Option<NaiveDate>,
    },

    /// Upsert daily step counts from a JSON array of {"date", "value"}
    Ingest {
        admission: String,

        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },

    /// Calculate and record the target status of the previous week
    Evaluate {
        admission: String,

        /// Calculation date (defaults to today)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        /// Override the configured algorithm
        #[arg(long, value_enum)]
        algorithm: Option<AlgorithmArg>,
    },

    /// Record the goal chosen by the patient
    Commit {
        admission: String,

        #[arg(long, value_enum, default_value = "keep")]
        choice: ChoiceArg,

        /// Start date of the new goal (defaults to today)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },

    /// Print step statistics for a date range
    Stats {
        admission: String,

        #[arg(long, value_parser = parse_date_arg)]
        from: NaiveDate,

        #[arg(long, value_parser = parse_date_arg)]
        to: NaiveDate,

        /// Goal used to count the days it was reached
        #[arg(long)]
        goal: Option<u32>,
    },

    /// Record a goal ceiling (0 removes the limit)
    SetMaxGoal {
        admission: String,

        #[arg(long)]
        ceiling: u32,

        /// Date the ceiling applies from (defaults to today)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },

    /// Record an agreement period during which goals are not increased
    SetAgreement {
        admission: String,

        #[arg(long, value_parser = parse_date_arg)]
        start: NaiveDate,

        #[arg(long, value_parser = parse_date_arg)]
        end: NaiveDate,

        /// Date the agreement was recorded (defaults to today)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    /// STEP / PACPAP programs
    Step,
    /// NORTHUMBRIA program
    Northumbria,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Step => Algorithm::Step,
            AlgorithmArg::Northumbria => Algorithm::Northumbria,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ChoiceArg {
    /// Keep the base goal
    Keep,
    /// Five more minutes of walking
    Five,
    /// Ten more minutes of walking
    Ten,
}

impl From<ChoiceArg> for PatientChoice {
    fn from(arg: ChoiceArg) -> Self {
        match arg {
            ChoiceArg::Keep => PatientChoice::Keep,
            ChoiceArg::Five => PatientChoice::Five,
            ChoiceArg::Ten => PatientChoice::Ten,
        }
    }
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_day(value).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), StrideCliError> {
    let config = load_config(cli.config.as_deref())?;
    let store = load_store(&cli.store, &config)?;
    let mut processor = GoalProcessor::new(store, config)?;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Admit { admission, enrol_date } => {
            let created = processor.store_mut().add_admission(&admission, enrol_date);
            save_store(&cli.store, processor.store())?;
            print_json(&serde_json::json!({
                "admission": admission,
                "enrol_date": enrol_date,
                "created": created,
            }))
        }

        Commands::Ingest { admission, input } => {
            let days: Vec<DaySteps> = serde_json::from_str(&read_input(&input)?)?;
            let report = processor.ingest_steps(&admission, &days)?;
            save_store(&cli.store, processor.store())?;
            print_json(&report)
        }

        Commands::Evaluate {
            admission,
            date,
            algorithm,
        } => {
            let outcome = processor.calculate_target_status(
                &admission,
                date.unwrap_or(today),
                algorithm.map(Algorithm::from),
            )?;
            save_store(&cli.store, processor.store())?;
            print_json(&outcome)
        }

        Commands::Commit {
            admission,
            choice,
            date,
        } => {
            let outcome =
                processor.insert_new_goal(&admission, choice.into(), date.unwrap_or(today))?;
            save_store(&cli.store, processor.store())?;
            print_json(&outcome)
        }

        Commands::Stats {
            admission,
            from,
            to,
            goal,
        } => {
            if from > to {
                return Err(StrideCliError::InvalidRange { from, to });
            }
            print_json(&processor.step_statistics(&admission, from, to, goal)?)
        }

        Commands::SetMaxGoal {
            admission,
            ceiling,
            date,
        } => {
            let max_goal = MaxGoal {
                date: date.unwrap_or(today),
                ceiling,
            };
            let record_id = processor.store_mut().write_max_goal(&admission, &max_goal)?;
            save_store(&cli.store, processor.store())?;
            print_json(&serde_json::json!({ "record_id": record_id, "max_goal": max_goal }))
        }

        Commands::SetAgreement {
            admission,
            start,
            end,
            date,
        } => {
            if start > end {
                return Err(StrideCliError::InvalidRange { from: start, to: end });
            }
            let window = AgreementWindow {
                date: date.unwrap_or(today),
                start_date: start,
                end_date: end,
            };
            let record_id = processor
                .store_mut()
                .write_agreement_window(&admission, &window)?;
            save_store(&cli.store, processor.store())?;
            print_json(&serde_json::json!({ "record_id": record_id, "agreement": window }))
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ProgramConfig, StrideCliError> {
    match path {
        Some(path) => Ok(ProgramConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(ProgramConfig::default()),
    }
}

fn load_store(path: &Path, config: &ProgramConfig) -> Result<MemoryStore, StrideCliError> {
    if !path.exists() {
        debug!(path = %path.display(), "store file not found, starting empty");
        return Ok(MemoryStore::new(config.codes.clone()));
    }
    Ok(MemoryStore::from_json(
        &fs::read_to_string(path)?,
        config.codes.clone(),
    )?)
}

fn save_store(path: &Path, store: &MemoryStore) -> Result<(), StrideCliError> {
    fs::write(path, store.to_json()?)?;
    Ok(())
}

fn read_input(input: &Path) -> Result<String, StrideCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

/// Pretty JSON on a terminal, compact JSON when piped
fn print_json<T: Serialize>(value: &T) -> Result<(), StrideCliError> {
    let output = if atty::is(atty::Stream::Stdout) {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", output);
    Ok(())
}

// Error types

#[derive(Debug)]
enum StrideCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    InvalidRange { from: NaiveDate, to: NaiveDate },
}

impl From<io::Error> for StrideCliError {
    fn from(e: io::Error) -> Self {
        StrideCliError::Io(e)
    }
}

impl From<ComputeError> for StrideCliError {
    fn from(e: ComputeError) -> Self {
        StrideCliError::Compute(e)
    }
}

impl From<serde_json::Error> for StrideCliError {
    fn from(e: serde_json::Error) -> Self {
        StrideCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<StrideCliError> for CliError {
    fn from(e: StrideCliError) -> Self {
        match e {
            StrideCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            StrideCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::Configuration(_) => {
                        ("CONFIGURATION_ERROR", Some("Check the task and item codes of the program configuration"))
                    }
                    ComputeError::MissingPriorStatus { .. } => {
                        ("MISSING_TARGET_STATUS", Some("Run 'stride evaluate' before committing a goal"))
                    }
                    ComputeError::AdmissionNotFound(_) => {
                        ("ADMISSION_NOT_FOUND", Some("Register it with 'stride admit'"))
                    }
                    ComputeError::DataAccess(_) => ("DATA_ACCESS_ERROR", None),
                    ComputeError::JsonError(_) => ("JSON_ERROR", Some("Check JSON syntax")),
                    ComputeError::DateParseError(_) => ("DATE_ERROR", Some("Dates use the YYYY-MM-DD format")),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: hint.map(str::to_string),
                }
            }
            StrideCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Input is a JSON array of {\"date\": \"YYYY-MM-DD\", \"value\": steps}".to_string()),
            },
            StrideCliError::InvalidRange { from, to } => CliError {
                code: "INVALID_RANGE".to_string(),
                message: format!("Range start {} is after its end {}", from, to),
                hint: None,
            },
        }
    }
}
