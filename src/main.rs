//! Phone Price Predictor - Main Entry Point
//!
//! Loads the pre-trained models once, predicts prices for one phone given on
//! the command line or for a JSON-lines file of phones, and prints both the
//! linear regression and decision tree estimates.

use anyhow::{Context, Result};
use clap::Parser;
use phone_price_predictor::{
    config::{AppConfig, DisplayConfig, LoggingConfig},
    metrics::PipelineMetrics,
    models::ArtifactLoader,
    pipeline::{PricePipeline, RequestOutcome},
    types::{format_price, PhoneSpecs},
};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Predict mobile phone prices from hardware specs", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RAM in GB
    #[arg(long, default_value_t = 4)]
    ram: u32,

    /// Storage in GB
    #[arg(long, default_value_t = 128)]
    rom: u32,

    /// Battery capacity in mAh
    #[arg(long, default_value_t = 5000)]
    battery: u32,

    /// Main rear camera resolution in MP
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..=200))]
    rear_cam_size: u32,

    /// Number of rear cameras
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=5))]
    rear_cam_count: u32,

    /// Main front camera resolution in MP (0 if none)
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(0..=100))]
    front_cam_size: u32,

    /// Number of front cameras
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=2))]
    front_cam_count: u32,

    /// Processor brand: Exynos, Google, Huawei, IOS, Mediatek, Other, Snapdragon
    #[arg(long, default_value = "Snapdragon")]
    processor: String,

    /// Print the encoded feature record
    #[arg(long)]
    show_features: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Predict every phone in a JSON-lines file instead
    #[arg(short, long)]
    input: Option<PathBuf>,
}

impl Args {
    fn specs(&self) -> PhoneSpecs {
        PhoneSpecs {
            ram: self.ram,
            rom: self.rom,
            battery: self.battery,
            rear_cam_size: self.rear_cam_size,
            rear_cam_count: self.rear_cam_count,
            front_cam_size: self.front_cam_size,
            front_cam_count: self.front_cam_count,
            processor: self.processor.clone(),
        }
    }
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("phone_price_predictor={}", logging.level).parse()?);
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    init_logging(&config.logging)?;

    info!("Starting Phone Price Predictor");

    let metrics = Arc::new(PipelineMetrics::new());
    let mut loader = ArtifactLoader::with_threads(config.artifacts.onnx_threads);
    let pipeline = PricePipeline::load(&mut loader, &config.artifacts, metrics.clone());

    if let Some(cause) = pipeline.degraded_cause() {
        warn!(error = %cause, "Models or column list could not be loaded; predictions are unavailable");
    }

    match &args.input {
        Some(path) => run_batch(&pipeline, path, &args, &config.display),
        None => run_single(&pipeline, &args, &config.display),
    }
}

fn run_single(pipeline: &PricePipeline, args: &Args, display: &DisplayConfig) -> Result<ExitCode> {
    let specs = args.specs();
    warn_out_of_catalog(&specs, None);

    let outcome = pipeline.run(specs);
    let ok = outcome.result.is_ok();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?);
    } else {
        print!("{}", render_text(&outcome, display, args.show_features));
    }

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn run_batch(
    pipeline: &PricePipeline,
    path: &Path,
    args: &Args,
    display: &DisplayConfig,
) -> Result<ExitCode> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    info!(path = %path.display(), "Running batch predictions");

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }

        let specs: PhoneSpecs = match serde_json::from_str(&line) {
            Ok(specs) => specs,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed input line");
                eprintln!("line {}: invalid input: {}", line_no, e);
                continue;
            }
        };
        warn_out_of_catalog(&specs, Some(line_no));

        let outcome = pipeline.run(specs);
        if args.json {
            let mut value = outcome_json(&outcome);
            value["line"] = serde_json::json!(line_no);
            println!("{}", serde_json::to_string(&value)?);
        } else {
            println!("# line {}", line_no);
            print!("{}", render_text(&outcome, display, args.show_features));
        }
    }

    pipeline.metrics().print_summary();

    Ok(if pipeline.is_ready() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn warn_out_of_catalog(specs: &PhoneSpecs, line: Option<usize>) {
    let fields = specs.out_of_catalog_fields();
    if !fields.is_empty() {
        warn!(
            line = line,
            fields = ?fields,
            "Input values were not seen in training; predictions may be unreliable"
        );
    }
}

fn render_text(outcome: &RequestOutcome, display: &DisplayConfig, show_features: bool) -> String {
    let mut out = String::new();

    match &outcome.result {
        Ok(prediction) => {
            let price = |value| format_price(value, &display.currency_symbol, display.decimals);
            out.push_str("Predicted price:\n");
            out.push_str(&format!("  Linear Regression : {}\n", price(prediction.linear_price)));
            out.push_str(&format!("  Decision Tree     : {}\n", price(prediction.tree_price)));
        }
        Err(e) => {
            out.push_str(&format!("Prediction failed: {}\n", e));
        }
    }

    if show_features {
        if let Some(record) = &outcome.record {
            out.push_str("\nEncoded input:\n");
            out.push_str(&record.to_string());
        }
    }
    out
}

fn outcome_json(outcome: &RequestOutcome) -> serde_json::Value {
    match &outcome.result {
        Ok(prediction) => serde_json::json!({
            "prediction": prediction,
            "features": outcome.record,
        }),
        Err(e) => serde_json::json!({
            "error": e.to_string(),
            "kind": e.kind(),
            "features": outcome.record,
        }),
    }
}
