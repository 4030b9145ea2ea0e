//! disaster-risk CLI: generate data, train and publish a model, assess observations
//! and run What-If simulations. Results are printed as JSON on stdout; logs go to stderr.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use disaster_risk::{
    config::RiskConfig,
    data::{DatasetGenerator, Field, ObservationInput},
    logging::{AuditLine, StructuredLogger},
    model::{train_and_publish, ArtifactHandle, Trainer},
    risk::RiskEngine,
    simulate::{axes, Simulator, ValueRange},
    storage::{read_dataset, write_dataset, ArtifactStore},
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "disaster-risk")]
#[command(about = "Disaster risk scoring for Indian regions")]
struct Cli {
    /// Config file (JSON); falls back to $DISASTER_RISK_CONFIG, then config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic labeled dataset
    Generate {
        #[arg(long)]
        rows: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Output CSV; defaults to the configured dataset path
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Train candidates, select the best and publish it as the current artifact
    Train {
        /// Input CSV; defaults to the configured dataset path
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Assess one observation
    Assess {
        #[command(flatten)]
        observation: ObservationArgs,
        /// Print a one-line audit record instead of the full assessment
        #[arg(long)]
        audit: bool,
    },
    /// Vary one field over a range
    Sweep {
        #[command(flatten)]
        observation: ObservationArgs,
        /// Field to vary, e.g. rainfall_mm
        #[arg(long)]
        field: String,
        /// start:end:step or a comma-separated list
        #[arg(long)]
        range: String,
    },
    /// Vary several fields over the cartesian product of their ranges
    Grid {
        #[command(flatten)]
        observation: ObservationArgs,
        /// FIELD=RANGE, repeatable, e.g. --vary rainfall_mm=0:400:100
        #[arg(long = "vary", required = true)]
        vary: Vec<String>,
    },
}

#[derive(Args)]
struct ObservationArgs {
    #[arg(long)]
    region: String,
    #[arg(long)]
    rainfall: Option<f64>,
    #[arg(long)]
    temperature: Option<f64>,
    #[arg(long)]
    humidity: Option<f64>,
    #[arg(long)]
    wind: Option<f64>,
    #[arg(long)]
    soil: Option<f64>,
    /// Artifact file; defaults to the store's CURRENT artifact
    #[arg(long)]
    artifact: Option<PathBuf>,
}

impl ObservationArgs {
    fn input(&self) -> ObservationInput {
        ObservationInput {
            region: self.region.clone(),
            rainfall_mm: self.rainfall,
            temperature_c: self.temperature,
            humidity_pct: self.humidity,
            wind_speed_kmh: self.wind,
            soil_moisture_pct: self.soil,
        }
    }

    fn load_handle(&self, config: &RiskConfig) -> anyhow::Result<ArtifactHandle> {
        let store = ArtifactStore::open(&config.artifact_dir)?;
        let artifact = match &self.artifact {
            Some(path) => store.load(path)?,
            None => store
                .load_current()
                .context("no published model; run `disaster-risk train` first")?,
        };
        Ok(ArtifactHandle::new(artifact))
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_vary(arg: &str) -> anyhow::Result<(Field, ValueRange)> {
    let (field, range) = arg
        .split_once('=')
        .with_context(|| format!("`{arg}` is not FIELD=RANGE"))?;
    Ok((field.parse()?, range.parse()?))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var("DISASTER_RISK_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.json"));
    let config = RiskConfig::load(&config_path)?;

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(config = %config_path.display(), "disaster-risk starting");

    match cli.command {
        Commands::Generate { rows, seed, out } => {
            let mut gen_config = config.generator.clone();
            gen_config.rows = rows.unwrap_or(gen_config.rows);
            gen_config.seed = seed.unwrap_or(gen_config.seed);
            let dataset = DatasetGenerator::new(gen_config).generate();
            let path = out.unwrap_or_else(|| config.dataset_path.clone());
            write_dataset(&path, &dataset)?;
            print_json(&serde_json::json!({
                "path": path,
                "rows": dataset.len(),
                "labels": dataset.label_counts(),
            }))?;
        }
        Commands::Train { data } => {
            let path = data.unwrap_or_else(|| config.dataset_path.clone());
            let dataset = read_dataset(&path)
                .with_context(|| format!("reading dataset {}", path.display()))?;
            let store = ArtifactStore::open(&config.artifact_dir)?;
            let trainer = Trainer::new(config.trainer.clone());
            let (outcome, published) = train_and_publish(&trainer, &dataset, &store)?;
            print_json(&serde_json::json!({
                "artifact": published,
                "id": outcome.artifact.id,
                "algorithm": outcome.artifact.algorithm(),
                "held_out_accuracy": outcome.artifact.metadata.held_out_accuracy,
                "evaluations": outcome.evaluations,
            }))?;
        }
        Commands::Assess { observation, audit } => {
            let handle = observation.load_handle(&config)?;
            let engine = RiskEngine::new(config.matrix.clone());
            let assessment = engine.assess(&observation.input(), &handle.current())?;
            if audit {
                StructuredLogger::emit_json(
                    &AuditLine::from_assessment(&assessment),
                    &mut std::io::stdout(),
                );
            } else {
                print_json(&serde_json::json!({
                    "assessment": &assessment,
                    "explanation": assessment.explanation_lines(),
                }))?;
            }
        }
        Commands::Sweep {
            observation,
            field,
            range,
        } => {
            let handle = observation.load_handle(&config)?;
            let field: Field = field.parse()?;
            let range: ValueRange = range.parse()?;
            let report = Simulator::from_config(&config).sweep_input(
                &observation.input(),
                field,
                &range,
                &handle.current(),
            )?;
            print_json(&serde_json::json!({
                "report": &report,
                "transitions": report.transitions(),
            }))?;
        }
        Commands::Grid { observation, vary } => {
            let handle = observation.load_handle(&config)?;
            let pairs = vary
                .iter()
                .map(|s| parse_vary(s))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let fields = axes(pairs)?;
            let report = Simulator::from_config(&config).grid_input(
                &observation.input(),
                &fields,
                &handle.current(),
            )?;
            print_json(&report)?;
        }
    }

    Ok(())
}
