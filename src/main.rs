//! snipcat CLI
//!
//! ```text
//! snipcat [OPTIONS] <INPUT>
//!
//! Options:
//!   -o, --output <FILE>       Write the catalogue to FILE instead of stdout
//!   -c, --config <FILE>       Configuration file (.toml, .yaml, .yml, .json)
//!   -t, --timeout-ms <MS>     Per-snippet timeout
//!   -j, --workers <N>         Sections executed concurrently
//!       --format <FORMAT>     json or jsonl [default: json]
//!       --expect-error <PAT>  Treat runtime errors of matching snippets as intended
//!       --no-module-syntax    Reject import/export snippets
//!   -v, --verbose             Debug logging
//!   -q, --quiet               Warnings only
//! ```
//!
//! Exit status: 0 when a catalogue was produced (snippet failures are part
//! of the catalogue), 1 for a malformed document or duplicate labels,
//! 2 for I/O and configuration errors.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use snipcat::{load_config, run_pipeline, CatalogueError, ExportFormat, PipelineConfig};

/// Validate, execute and catalogue the examples of a JavaScript cheatsheet
#[derive(Parser)]
#[command(name = "snipcat")]
#[command(version)]
#[command(about = "Validate, execute and catalogue labeled JavaScript snippets", long_about = None)]
struct Cli {
    /// Cheatsheet to process
    input: PathBuf,

    /// Write the catalogue to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (.toml, .yaml, .yml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Per-snippet timeout in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Number of sections executed concurrently
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Export format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Label, section/label path or section prefix whose runtime error is intended
    #[arg(long = "expect-error", value_name = "PATTERN")]
    expect_error: Vec<String>,

    /// Reject import/export snippets instead of validating them as modules
    #[arg(long)]
    no_module_syntax: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Jsonl,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => ExportFormat::Json,
            OutputFormat::Jsonl => ExportFormat::JsonLines,
        }
    }
}

impl Cli {
    fn default_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// File configuration with command-line overrides applied.
    fn pipeline_config(&self) -> Result<PipelineConfig, CatalogueError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(timeout_ms) = self.timeout_ms {
            config.sandbox.timeout_ms = timeout_ms;
        }
        if let Some(workers) = self.workers {
            config.sandbox.max_workers = workers;
        }
        if self.no_module_syntax {
            config.validate.allow_module_syntax = false;
        }
        config
            .policy
            .expected_failures
            .extend(self.expect_error.iter().cloned());
        Ok(config)
    }
}

async fn run(cli: &Cli) -> Result<(), CatalogueError> {
    let config = cli.pipeline_config()?;
    let text = std::fs::read_to_string(&cli.input)?;
    tracing::info!(input = %cli.input.display(), "processing document");

    let catalogue = run_pipeline(&text, &config).await?;
    let format = ExportFormat::from(cli.format);
    match &cli.output {
        Some(path) => catalogue.save(path, format)?,
        None => catalogue.write_to(std::io::stdout().lock(), format)?,
    }
    eprintln!("{}", catalogue.summary());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.default_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if e.is_document_error() {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            }
        }
    }
}
