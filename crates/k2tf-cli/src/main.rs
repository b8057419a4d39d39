use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use k2tf::{EngineConfig, Permissive, ProviderSchema, SchemaOracle, TranslationEngine};
use k2tf_yaml::Catalog;
use tracing::error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod convert;
mod input;
mod output;

use convert::Converter;

#[derive(Parser)]
#[command(
    name = "k2tf",
    version,
    about = "Translate Kubernetes YAML manifests into Terraform HCL"
)]
struct Cli {
    /// File or directory of YAML manifests (use - for stdin)
    #[arg(short = 'f', long, default_value = "-")]
    filepath: String,
    /// File to write HCL to (stdout when omitted or -)
    #[arg(short = 'o', long)]
    output: Option<String>,
    /// Replace the output file if it already exists
    #[arg(long)]
    overwrite_existing: bool,
    /// Provider schema from `terraform providers schema -json`
    #[arg(short = 's', long)]
    schema: Option<PathBuf>,
    /// Type catalog replacing the builtin one
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Keep fields and kinds the schema or catalog does not know
    #[arg(short = 'I', long)]
    include_unsupported: bool,
    /// Log at debug level
    #[arg(short = 'd', long)]
    debug: bool,
    /// Disable colored log output
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            error!(failed, "some objects could not be converted");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color)
                .with_target(false),
        )
        .init();
}

/// Convert every input source. Returns the number of objects that failed.
fn run(cli: &Cli) -> Result<usize> {
    let custom_catalog = match &cli.catalog {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read catalog {}", path.display()))?;
            let catalog = Catalog::from_yaml(&text)
                .with_context(|| format!("invalid catalog {}", path.display()))?;
            Some(catalog)
        }
        None => None,
    };
    let catalog = custom_catalog.as_ref().unwrap_or(Catalog::builtin());

    let schema = match &cli.schema {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open schema {}", path.display()))?;
            Some(
                ProviderSchema::from_reader(BufReader::new(file))
                    .with_context(|| format!("invalid schema {}", path.display()))?,
            )
        }
        None => None,
    };
    let oracle: &dyn SchemaOracle = match &schema {
        Some(schema) => schema,
        None => &Permissive,
    };

    let config = EngineConfig {
        include_unsupported: cli.include_unsupported,
        ..EngineConfig::default()
    };
    let decode = k2tf_yaml::Config {
        allow_unknown_kinds: cli.include_unsupported,
        ..k2tf_yaml::Config::default()
    };
    let engine = TranslationEngine::new(config, oracle)?;
    let mut converter = Converter::new(catalog, decode, engine);

    let sources = input::read_sources(&cli.filepath)?;
    let mut out = output::open(cli.output.as_deref(), cli.overwrite_existing)?;
    for source in &sources {
        converter
            .convert(source, &mut out)
            .with_context(|| format!("failed to write HCL for {}", source.name))?;
    }
    out.flush().context("failed to flush output")?;

    converter.summarize();
    Ok(converter.failed())
}
