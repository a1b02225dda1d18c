//! Proxen CLI: generate, inspect, and verify container images.
//!
//! `proxen generate` synthesizes every target description in a JSON file and
//! saves the resulting tier images, `proxen inspect` prints an image's header
//! and signature mapping, and `proxen verify` loads an image into a fresh
//! engine and reports how many mappings resolve.

#![warn(missing_docs)]

mod generate;
mod inspect;
mod verify;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Once;

use clap::{Parser, Subcommand, ValueEnum};
use proxen_config::{load_config, load_config_from_str, EngineConfig, CONFIG_FILE};

/// Proxen: structural implementation synthesis with persistent caching.
#[derive(Parser, Debug)]
#[command(name = "proxen", version, about = "Proxen implementation synthesis engine")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `proxen.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synthesize target descriptions and save tier images.
    Generate(GenerateArgs),
    /// Print an image's header and signature mapping.
    Inspect(InspectArgs),
    /// Load an image into a fresh engine and report registered entries.
    Verify(VerifyArgs),
}

/// Arguments for `proxen generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// JSON file holding an array of target descriptions.
    pub targets: PathBuf,

    /// Which tier to synthesize into.
    #[arg(short, long, value_enum, default_value_t = Preference::Standard)]
    pub prefer: Preference,

    /// Signing key file for the elevated tier (overrides `[signing].key_file`).
    #[arg(short, long)]
    pub key: Option<PathBuf>,

    /// Directory to write images to. Enables persistence.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `proxen inspect`.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Image file to inspect.
    pub image: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for `proxen verify`.
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Image file to verify.
    pub image: PathBuf,

    /// Signing key file used to check sealed images.
    #[arg(short, long)]
    pub key: Option<PathBuf>,
}

/// Tier preference for `generate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Preference {
    /// Standard tier only.
    Standard,
    /// Elevated tier only.
    Elevated,
    /// Elevated when every type is trusted and a key is available.
    Auto,
}

/// Output format for reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    /// Loads the engine configuration.
    ///
    /// An explicit `--config` file must exist. Otherwise `./proxen.toml` is
    /// used when present, and defaults when not.
    pub fn engine_config(&self) -> Result<EngineConfig, Box<dyn std::error::Error>> {
        match &self.config {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
                Ok(load_config_from_str(&content)?)
            }
            None if Path::new(CONFIG_FILE).exists() => Ok(load_config(Path::new("."))?),
            None => Ok(EngineConfig::default()),
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs the log subscriber. `RUST_LOG` wins over `--verbose`/`--quiet`.
fn init_tracing(global: &GlobalArgs) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let fallback = if global.quiet {
            "error"
        } else if global.verbose {
            "debug"
        } else {
            "warn"
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
    });
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Generate(ref args) => generate::run(args, &global),
        Command::Inspect(ref args) => inspect::run(args, &global),
        Command::Verify(ref args) => verify::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
