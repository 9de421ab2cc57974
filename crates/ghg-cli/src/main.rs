//! GHG CLI - Command-line interface
//!
//! Usage:
//!   ghg extract <input> [-o cleaned_data.csv] [--strict] [--year-fallback]
//!   ghg plot <csv> [-o company_emissions_map.html]
//!   ghg run <input> [--csv cleaned_data.csv] [--map company_emissions_map.html]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use ghg_core::{table, AppConfig, FinalRecord, LoggingConfig, NerBackend, Strictness};
use ghg_extractor::{ExtractionPipeline, HttpNer, NerCapability, PipelineOutcome, RuleBasedNer};
use ghg_geo::{plot_records, NominatimGeocoder};
use ghg_parser::ParserRegistry;

const DEFAULT_CSV: &str = "cleaned_data.csv";
const DEFAULT_MAP: &str = "company_emissions_map.html";

#[derive(Parser)]
#[command(name = "ghg")]
#[command(about = "Extract company emission records from reports and plot them on a map")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract emission records from a document into a CSV file
    Extract {
        /// PDF, DOCX, or text document
        input: PathBuf,
        /// Output CSV path
        #[arg(short, long, default_value = DEFAULT_CSV)]
        output: PathBuf,
        #[command(flatten)]
        options: ExtractOptions,
    },
    /// Plot records from a CSV file on an HTML map
    Plot {
        /// CSV produced by `extract`
        csv: PathBuf,
        /// Output HTML path
        #[arg(short, long, default_value = DEFAULT_MAP)]
        output: PathBuf,
    },
    /// Extract and plot in one go
    Run {
        /// PDF, DOCX, or text document
        input: PathBuf,
        #[arg(long, default_value = DEFAULT_CSV)]
        csv: PathBuf,
        #[arg(long, default_value = DEFAULT_MAP)]
        map: PathBuf,
        #[command(flatten)]
        options: ExtractOptions,
    },
}

/// Command-line overrides for the extraction config
#[derive(Args, Debug, Default)]
struct ExtractOptions {
    /// Require a cleaned company name, year, and location
    #[arg(long)]
    strict: bool,
    /// Fill a missing year from a four-digit year in the sentence
    #[arg(long)]
    year_fallback: bool,
    /// Similarity (0-100) above which a company counts as a duplicate
    #[arg(long)]
    threshold: Option<f64>,
    /// NER backend: rules or http
    #[arg(long)]
    ner: Option<NerBackend>,
}

impl ExtractOptions {
    fn apply(&self, config: &mut AppConfig) {
        if self.strict {
            config.extraction.strictness = Strictness::Strict;
        }
        if self.year_fallback {
            config.extraction.year_fallback = true;
        }
        if let Some(threshold) = self.threshold {
            config.extraction.dedup_threshold = threshold;
        }
        if let Some(backend) = self.ner {
            config.ner.backend = backend;
        }
    }
}

fn load_config(path: Option<&Path>, options: Option<&ExtractOptions>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    if let Some(options) = options {
        options.apply(&mut config);
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    if logging.json_format {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_ner(config: &AppConfig) -> anyhow::Result<Arc<dyn NerCapability>> {
    Ok(match config.ner.backend {
        NerBackend::Rules => Arc::new(RuleBasedNer::new()),
        NerBackend::Http => Arc::new(HttpNer::from_config(&config.ner)?),
    })
}

/// Parse a document and write its records; `None` when nothing was extracted
async fn extract(
    config: &AppConfig,
    input: &Path,
    output: &Path,
) -> anyhow::Result<Option<Vec<FinalRecord>>> {
    let document = ParserRegistry::with_defaults()
        .parse(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    if !document.has_text() {
        tracing::warn!("No text found in {}", input.display());
    }

    let pipeline = ExtractionPipeline::new(build_ner(config)?, &config.extraction)?;

    match pipeline.run(&document.content).await? {
        PipelineOutcome::NoData => {
            println!("No data extracted.");
            Ok(None)
        }
        PipelineOutcome::Extracted(records) => {
            table::write_csv(output, &records)?;
            println!(
                "Extracted {} records to {}",
                records.len(),
                output.display()
            );
            Ok(Some(records))
        }
    }
}

async fn plot(config: &AppConfig, records: &[FinalRecord], output: &Path) -> anyhow::Result<()> {
    let geocoder = NominatimGeocoder::from_config(&config.geocoder)?;
    let map = plot_records(records, &geocoder, &config.map).await?;
    map.save(output)?;
    println!(
        "Plotted {} of {} records to {}",
        map.markers().len(),
        records.len(),
        output.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = match &cli.command {
        Commands::Extract { options, .. } | Commands::Run { options, .. } => Some(options),
        Commands::Plot { .. } => None,
    };
    let config = load_config(cli.config.as_deref(), options)?;
    init_tracing(&config.logging);

    match &cli.command {
        Commands::Extract { input, output, .. } => {
            extract(&config, input, output).await?;
        }
        Commands::Plot { csv, output } => {
            let records = table::read_csv(csv)?;
            plot(&config, &records, output).await?;
        }
        Commands::Run {
            input, csv, map, ..
        } => {
            if let Some(records) = extract(&config, input, csv).await? {
                plot(&config, &records, map).await?;
            }
        }
    }

    Ok(())
}
