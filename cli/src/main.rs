use std::path::{Path, PathBuf};

use biolib_config_core::{Document, ErrorReport, LoadError, render_text, validate_document};
use clap::Parser;
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "biolib-config-check", version)]
#[command(about = "Validate a .biolib/config.yml file.")]
struct Cli {
    /// Path to the config.yml file.
    config_file: PathBuf,
    /// How validation errors are printed.
    #[arg(long, default_value = "text")]
    format: CliOutputFormat,
    /// Log each validation step to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(message) = run(&cli) {
        print!("{message}");
        if !message.ends_with('\n') {
            println!();
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<(), String> {
    tracing::debug!(version = PACKAGE_VERSION, path = %cli.config_file.display(), "Checking config");

    let path = &cli.config_file;
    if !path.exists() {
        return Err(format!("Error: File '{}' does not exist.", path.display()));
    }

    let doc = load_document(path)?;
    match validate_document(&doc) {
        Ok(()) => {
            println!("Validation successful: '{}' is valid.", path.display());
            Ok(())
        }
        Err(err) => {
            tracing::debug!(error = %err, fatal = err.is_fatal(), "Validation failed");
            Err(format_report(&err.to_report(), cli.format)?)
        }
    }
}

fn load_document(path: &Path) -> Result<Document, String> {
    Document::load(path).map_err(|err| match err {
        LoadError::Empty => "Error: Empty YAML file.".to_string(),
        LoadError::Yaml(err) => format!("Error: Malformed YAML: {err}"),
        other => format!("Error: {other}"),
    })
}

fn format_report(report: &ErrorReport, format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Text => Ok(render_text(report)),
        CliOutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("Error: failed to serialize report: {e}")),
        CliOutputFormat::Yaml => serde_yaml::to_string(report)
            .map_err(|e| format!("Error: failed to serialize report: {e}")),
    }
}
