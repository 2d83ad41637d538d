//! Medbot: console clinical intake
//!
//! **Medbot interviews an operator, classifies a patient's dehydration
//! severity, and keeps durable patient and diagnosis records.**
//!
//! # Flow
//!
//! ```text
//! Console ──▶ IntakeWorkflow ──▶ assessment (decision tree)
//!                     │
//!                     └──▶ PatientService / DiagnosisService ──▶ RecordStore ──▶ DbBroker ──▶ SQLite
//! ```
//!
//! - **Record store** (`plugins::records`): sentinel-returning CRUD over
//!   `patient` and `diagnosis`; storage failures are logged and stop here.
//! - **Validation** (`plugins::patient`, `plugins::diagnosis`): empty names,
//!   empty labels and dangling patient ids never reach the store.
//! - **Assessment** (`plugins::assessment`): appearance, then eyes or skin
//!   pinch, giving one of three labels or `Undetermined`.
//! - **Intake** (`plugins::intake`): check-in, assessment, two-phase save.
//!
//! # The Thin Waist
//!
//! Every database call routes through `DbBroker::with_conn`, which opens a
//! connection for that call only and appends an audit line to
//! `broker.events.jsonl`.
//!
//! # Examples
//!
//! ```bash
//! # Interactive menu
//! medbot
//!
//! # List every patient with their diagnoses
//! medbot list --format json
//!
//! # Record a returning patient's assessment without the menu
//! medbot diagnose --patient-id 3 --appearance 2 --skin 1
//! ```

pub mod core;
pub mod plugins;

use crate::core::{
    broker::DbBroker,
    config::{self, LoadedConfig},
    db, error,
    store::Store,
};
use crate::plugins::{
    assessment::InvalidAnswerPolicy,
    console::{self, Console},
    diagnosis,
    intake::{IntakeOutcome, IntakeWorkflow, Rejection},
    patient,
    prompts::{self, ScriptedAnswers},
    records::SqliteRecordStore,
};

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "medbot",
    version = env!("CARGO_PKG_VERSION"),
    about = "Console clinical intake and dehydration assessment"
)]
struct Cli {
    /// Path to medbot.toml (defaults to ./medbot.toml when present).
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Args, Debug)]
struct ListCli {
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text")]
    format: String,
}

#[derive(clap::Args, Debug)]
struct DiagnoseCli {
    /// Returning patient. Omit to register a new patient from the demographic flags.
    #[clap(long)]
    patient_id: Option<i64>,
    #[clap(long)]
    name: Option<String>,
    #[clap(long)]
    age: Option<String>,
    #[clap(long)]
    gender: Option<String>,
    /// Inches
    #[clap(long)]
    height: Option<String>,
    /// Pounds
    #[clap(long)]
    weight: Option<String>,
    /// 1: normal, 2: irritable or lethargic
    #[clap(long)]
    appearance: String,
    /// 1: normal or slightly sunken, 2: very sunken (asked when appearance is 1)
    #[clap(long, default_value = "")]
    eyes: String,
    /// 1: normal, 2: slow (asked when appearance is 2)
    #[clap(long, default_value = "")]
    skin: String,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text")]
    format: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive intake menu (default)
    #[clap(name = "console", visible_alias = "c")]
    Console,

    /// Create the record database
    #[clap(name = "init")]
    Init,

    /// List all patients and their diagnoses
    #[clap(name = "list", visible_alias = "ls")]
    List(ListCli),

    /// Run one intake non-interactively
    #[clap(name = "diagnose")]
    Diagnose(DiagnoseCli),

    /// Patient records
    #[clap(name = "patient", visible_alias = "p")]
    Patient(patient::PatientCli),

    /// Diagnosis records
    #[clap(name = "diagnosis", visible_alias = "dx")]
    Diagnosis(diagnosis::DiagnosisCli),

    /// Show the broker audit log
    #[clap(name = "audit")]
    Audit,

    /// Show version information
    #[clap(name = "version")]
    Version,
}

fn broker_for(loaded: &LoadedConfig, store: &Store) -> DbBroker {
    let audit = &loaded.config.audit;
    if audit.enabled {
        DbBroker::new(&store.root, &audit.actor)
    } else {
        DbBroker::unaudited(&audit.actor)
    }
}

fn answer_policy(loaded: &LoadedConfig) -> InvalidAnswerPolicy {
    let assessment = &loaded.config.assessment;
    if assessment.reprompt_invalid {
        InvalidAnswerPolicy::Reprompt {
            max_attempts: assessment.max_attempts,
        }
    } else {
        InvalidAnswerPolicy::Degrade
    }
}

/// Answers for a non-interactive intake, in the order the workflow asks them.
fn scripted_intake(cli: &DiagnoseCli) -> ScriptedAnswers {
    let mut answers = ScriptedAnswers::default();
    if cli.patient_id.is_none() {
        for field in [&cli.name, &cli.age, &cli.gender, &cli.height, &cli.weight] {
            answers.push(field.clone().unwrap_or_default());
        }
    }
    answers.push(cli.appearance.clone());
    match cli.appearance.as_str() {
        "1" => answers.push(cli.eyes.clone()),
        "2" => answers.push(cli.skin.clone()),
        _ => {}
    }
    answers
}

fn run_diagnose(
    records: &SqliteRecordStore,
    policy: InvalidAnswerPolicy,
    cli: DiagnoseCli,
) -> Result<(), error::MedbotError> {
    use colored::Colorize;

    let workflow = IntakeWorkflow::new(records).with_policy(policy);
    let mut answers = scripted_intake(&cli);
    let outcome = workflow.run_new_diagnosis(cli.patient_id, &mut answers)?;

    if cli.format == "json" {
        let body = match &outcome {
            IntakeOutcome::PatientNotFound(id) => serde_json::json!({
                "status": "patient_not_found",
                "patient_id": id,
            }),
            IntakeOutcome::Saved {
                patient,
                diagnosis,
                assessment,
            } => serde_json::json!({
                "status": "saved",
                "patient": patient,
                "diagnosis": diagnosis,
                "assessment": assessment,
            }),
            IntakeOutcome::SaveRejected {
                rejection,
                assessment,
            } => serde_json::json!({
                "status": "save_rejected",
                "rejection": rejection,
                "assessment": assessment,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    match outcome {
        IntakeOutcome::PatientNotFound(id) => {
            println!("{} {}", prompts::PATIENT_ERROR_MESSAGE, id);
            println!("{}", prompts::DIAGNOSIS_ERROR_MESSAGE);
        }
        IntakeOutcome::Saved {
            patient, diagnosis, ..
        } => {
            println!("{}", prompts::SAVED_MESSAGE.bright_green());
            println!("{}", patient);
            println!("{}", diagnosis);
        }
        IntakeOutcome::SaveRejected { rejection, .. } => {
            println!("{}", prompts::SAVE_ERROR_MESSAGE.bright_red());
            if let Rejection::Diagnosis {
                orphaned_patient: Some(p),
            } = rejection
            {
                println!(
                    "  {} patient stored without a diagnosis: {}",
                    "▸".bright_yellow(),
                    p
                );
            }
        }
    }
    Ok(())
}

pub fn run() -> Result<(), error::MedbotError> {
    let cli = Cli::parse();

    if let Some(Command::Version) = cli.command {
        println!("v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let current_dir = std::env::current_dir()?;
    let loaded = config::load_config(cli.config.as_deref(), &current_dir)?;
    let store = loaded.store();
    let broker = broker_for(&loaded, &store);
    let policy = answer_policy(&loaded);

    db::initialize_intake_db(&store, &broker)?;
    let audit_log = broker.audit_log_path().map(PathBuf::from);
    let records = SqliteRecordStore::new(store.clone(), broker);

    match cli.command.unwrap_or(Command::Console) {
        Command::Version => {}
        Command::Console => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            let mut console = Console::new(stdin.lock(), stdout.lock());
            console.run_menu(&records, policy)?;
        }
        Command::Init => {
            println!("Intake database initialized at {}", store.db_path.display());
        }
        Command::List(list_cli) => {
            let histories = IntakeWorkflow::new(&records).list_all();
            if list_cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&histories)?);
            } else {
                console::write_listing(&mut io::stdout().lock(), &histories)?;
            }
        }
        Command::Diagnose(diagnose_cli) => run_diagnose(&records, policy, diagnose_cli)?,
        Command::Patient(patient_cli) => patient::run_patient_cli(&records, patient_cli)?,
        Command::Diagnosis(diagnosis_cli) => {
            diagnosis::run_diagnosis_cli(&records, diagnosis_cli)?
        }
        Command::Audit => match audit_log.filter(|path| path.exists()) {
            Some(path) => println!("{}", std::fs::read_to_string(path)?),
            None => println!("No audit log found."),
        },
    }

    Ok(())
}
