//! appraise: Appraise CLI client
//!
//! Scores employee records against a running appraised, or in-process
//! against a local model artifact with `--model`.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;

use appraise::client::{HealthReport, ServiceClient};
use appraise::{
    Appraise, AppraiseError, EmbeddedPredictor, EmployeeRecord, ErrorResponse, FeatureValue,
    GIT_SHA, Predictor, Result,
};

/// Appraise CLI client
#[derive(Parser)]
#[command(name = "appraise")]
#[command(version = appraise::PKG_VERSION)]
#[command(about = "Employee performance rating client")]
struct Args {
    /// Server address
    #[arg(
        short,
        long,
        env = "APPRAISE_ADDRESS",
        default_value = "http://127.0.0.1:9750"
    )]
    address: String,

    /// Run in-process against this model artifact instead of a server
    #[arg(short, long)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check service health
    Health,

    /// Show the model's feature schema and classes
    Schema,

    /// Rate one employee record
    Predict(RecordInput),
}

#[derive(ClapArgs)]
struct RecordInput {
    /// Record as a JSON object (or omit to read from stdin)
    record: Option<String>,

    /// Set a single field, e.g. `--field Age=30 --field Gender=Male`
    #[arg(short, long = "field", value_name = "NAME=VALUE")]
    fields: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let response = ErrorResponse::from(&e);
            match serde_json::to_string_pretty(&response) {
                Ok(json) => println!("{json}"),
                Err(_) => eprintln!("error: {e}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    match args.model {
        Some(path) => {
            let predictor = Appraise::builder().model_path(path).build()?;
            match args.command {
                Command::Health => print_json(&local_health(&predictor)),
                Command::Schema => print_json(&predictor.describe().await?),
                Command::Predict(input) => predict(&predictor, input).await,
            }
        }
        None => {
            let client = ServiceClient::connect(&args.address).await?;
            match args.command {
                Command::Health => print_json(&client.health().await?),
                Command::Schema => print_json(&client.describe().await?),
                Command::Predict(input) => predict(&client, input).await,
            }
        }
    }
}

async fn predict(predictor: &dyn Predictor, input: RecordInput) -> Result<()> {
    let record = resolve_record(input)?;
    let prediction = predictor.predict(&record).await?;
    print_json(&prediction)
}

fn local_health(predictor: &EmbeddedPredictor) -> HealthReport {
    HealthReport {
        healthy: true,
        version: appraise::PKG_VERSION.to_string(),
        git_sha: (GIT_SHA != "unknown").then(|| GIT_SHA.to_string()),
        model: predictor.handle().id().to_string(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Build the record from a JSON argument or stdin, then apply `--field`s.
///
/// Fields override keys of the same name from the JSON object. Having
/// neither JSON nor fields is an error.
fn resolve_record(input: RecordInput) -> Result<EmployeeRecord> {
    let json = match input.record {
        Some(json) => Some(json),
        None => read_stdin()?,
    };

    let mut record = match json {
        Some(json) => serde_json::from_str::<EmployeeRecord>(&json)?,
        None if input.fields.is_empty() => {
            return Err(AppraiseError::Configuration(
                "predict: no input provided (pass a JSON record, --field, or stdin)".to_string(),
            ));
        }
        None => EmployeeRecord::new(),
    };

    for field in &input.fields {
        let (name, value) = parse_field(field)?;
        record.insert(name, value);
    }
    Ok(record)
}

fn read_stdin() -> Result<Option<String>> {
    if io::stdin().is_terminal() {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| AppraiseError::Configuration(format!("failed to read stdin: {e}")))?;
    let trimmed = buf.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Parse `NAME=VALUE`. Values that parse as JSON keep their JSON type, so
/// `--field Age=null` is rejected by validation; anything else is taken
/// verbatim as text.
fn parse_field(field: &str) -> Result<(String, FeatureValue)> {
    let (name, raw) = field.split_once('=').ok_or_else(|| {
        AppraiseError::Configuration(format!("invalid --field '{field}': expected NAME=VALUE"))
    })?;
    let value = serde_json::from_str::<FeatureValue>(raw)
        .unwrap_or_else(|_| FeatureValue::Text(raw.to_string()));
    Ok((name.trim().to_string(), value))
}
