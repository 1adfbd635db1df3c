//! pcb-risk - PCB exposure risk scoring from the command line
//!
//! # Usage
//!
//! ```bash
//! # Score a cohort export, JSON on stdout
//! pcb-risk analyze --csv cohort.csv
//!
//! # Same, with the classifier artifact, as an augmented CSV
//! pcb-risk analyze --csv cohort.csv --model pcb_model.json --format csv
//!
//! # Per-patient explanations and the clinician digest
//! pcb-risk explain --csv cohort.csv
//! pcb-risk digest --csv cohort.csv
//!
//! # Single patient
//! pcb-risk compute --age 32 --bmi 24.5 --pcb-sum 180
//! ```
//!
//! # Environment Variables
//!
//! - `PCB_RISK_CONFIG`: Path to a TOML config file (default: ./pcb_risk.toml)
//! - `PCB_RISK_MODEL`: Classifier artifact path, same as `--model`
//! - `RUST_LOG`: Logging level (default: info)
//!
//! Logs go to stderr; stdout carries only the result.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use pcb_risk::config::RiskConfig;
use pcb_risk::csv_input::{load_dataset, write_dataset};
use pcb_risk::pipeline::{ClinicalDigest, DatasetAnalyzer};
use pcb_risk::toxicokinetics::{classify, compute_risk_with};
use pcb_risk::types::Dataset;
use pcb_risk::ExplanationGenerator;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "pcb-risk")]
#[command(about = "PCB exposure risk scoring, ML-assisted classification and explanations")]
#[command(version)]
struct CliArgs {
    /// TOML config file; skips the PCB_RISK_CONFIG / ./pcb_risk.toml search
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines instead of text
    #[arg(long, global = true, env = "PCB_RISK_JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct DatasetArgs {
    /// CSV export with a header row
    #[arg(long, value_name = "PATH")]
    csv: PathBuf,

    /// Classifier artifact (JSON); overrides `[model] artifact_path`
    #[arg(long, value_name = "PATH", env = "PCB_RISK_MODEL")]
    model: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score every row: dose, risk, tier, ML blend, summary and stats
    Analyze {
        #[command(flatten)]
        input: DatasetArgs,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Per-patient probability, contributions and narrative
    Explain {
        #[command(flatten)]
        input: DatasetArgs,
    },
    /// Headline numbers and the worst critical cases
    Digest {
        #[command(flatten)]
        input: DatasetArgs,
    },
    /// Dose and risk for a single patient
    Compute {
        /// Maternal age in years
        #[arg(long)]
        age: f64,

        /// Pre-pregnancy BMI
        #[arg(long)]
        bmi: f64,

        /// Summed congener concentration (ng/g lipid)
        #[arg(long)]
        pcb_sum: f64,

        /// Fish intake in g/week; defaults to the configured value
        #[arg(long)]
        weekly_intake: Option<f64>,
    },
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    let mut config = match &args.config {
        Some(path) => RiskConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RiskConfig::load(),
    };

    match args.command {
        Command::Analyze { input, format } => {
            let dataset = prepare(&mut config, &input)?;
            let report = DatasetAnalyzer::from_config(&config)
                .analyze(&dataset)
                .context("Analysis failed")?;
            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Csv => {
                    let table = report.to_dataset().context("Failed to build output table")?;
                    write_dataset(&table, std::io::stdout().lock())
                        .context("Failed to write CSV")?;
                }
            }
        }
        Command::Explain { input } => {
            let dataset = prepare(&mut config, &input)?;
            let patients = ExplanationGenerator::from_config(&config).explain_dataset(&dataset);
            info!(patients = patients.len(), "Explanations ready");
            print_json(&serde_json::json!({ "patients": patients }))?;
        }
        Command::Digest { input } => {
            let dataset = prepare(&mut config, &input)?;
            let report = DatasetAnalyzer::from_config(&config)
                .analyze(&dataset)
                .context("Analysis failed")?;
            print_json(&ClinicalDigest::from_report(&report))?;
        }
        Command::Compute {
            age,
            bmi,
            pcb_sum,
            weekly_intake,
        } => {
            let weekly = weekly_intake.unwrap_or(config.exposure.weekly_intake_g);
            let m = compute_risk_with(&config.exposure, &config.thresholds, age, bmi, pcb_sum, weekly);
            let status = classify(m.hazard_quotient, m.cancer_risk, &config.thresholds);
            print_json(&serde_json::json!({
                "HQ": m.hazard_quotient,
                "CR": m.cancer_risk,
                "total_risk": m.total_risk,
                "high_risk": m.high_risk,
                "ADD": m.average_daily_dose,
                "LADD": m.lifetime_average_daily_dose,
                "Status": status,
            }))?;
        }
    }

    Ok(())
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Apply `--model` and read the CSV.
fn prepare(config: &mut RiskConfig, input: &DatasetArgs) -> Result<Dataset> {
    if let Some(model) = &input.model {
        config.model.artifact_path = Some(model.clone());
    }
    let dataset = load_dataset(&input.csv)
        .with_context(|| format!("Failed to read {}", input.csv.display()))?;
    info!(
        file = %input.csv.display(),
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "Loaded CSV"
    );
    Ok(dataset)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).context("Failed to serialize output")?;
    writeln!(out)?;
    Ok(())
}
