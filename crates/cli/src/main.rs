//! expertkit CLI — the main entry point.
//!
//! Commands:
//! - `transform` — Map a JSON document onto a schema and generate validated transform code
//! - `validate`  — Run a hand-written WAT artifact through the validation pipeline
//! - `config`    — Print, locate or check configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "expertkit",
    about = "expertkit — tool-calling experts with sandboxed artifact validation",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a JSON document to match a target schema
    Transform {
        /// Source JSON document
        #[arg(short, long)]
        source: PathBuf,

        /// Target schema (JSON Schema or an example document)
        #[arg(short = 't', long)]
        schema: PathBuf,

        /// Write the generated module here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a WebAssembly text artifact against an input document
    Validate {
        /// The .wat module to validate
        #[arg(short, long)]
        module: PathBuf,

        /// Input passed to the entry point
        #[arg(short, long)]
        input: PathBuf,

        /// Override the configured entry point
        #[arg(short, long)]
        entry_point: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration commands (prints the default config when no action is given)
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Load and validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Transform { source, schema, output } => {
            commands::transform::run(&source, &schema, output.as_deref()).await?
        }
        Commands::Validate {
            module,
            input,
            entry_point,
            json,
        } => commands::validate::run(&module, &input, entry_point, json)?,
        Commands::Config { action } => match action {
            None => commands::config_cmd::default(),
            Some(ConfigAction::Show) => commands::config_cmd::show()?,
            Some(ConfigAction::Path) => commands::config_cmd::path(),
            Some(ConfigAction::Validate) => commands::config_cmd::validate()?,
        },
    }

    Ok(())
}
