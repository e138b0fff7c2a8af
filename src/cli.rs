//! CLI interface for the essay analyzer

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "selfintro-analyzer")]
#[command(about = "Korean self-introduction essay analyzer")]
#[command(long_about = "Score a self-introduction essay against a job and a company profile: fit scores, keyword coverage, repetition and STAR structure")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze an essay for a job and a company
    Analyze {
        /// Path to the essay file (TXT, MD) or `-` for stdin
        #[arg(short, long, conflicts_with = "text")]
        essay: Option<PathBuf>,

        /// Essay text given inline
        #[arg(short, long)]
        text: Option<String>,

        /// Job code
        #[arg(short, long)]
        job: i64,

        /// Company id
        #[arg(short = 'C', long)]
        company: String,

        /// Embedding model name from the configured list
        #[arg(long)]
        embedding: Option<String>,

        /// Match keywords by exact substring instead of embeddings
        #[arg(long)]
        lexical: bool,

        /// Use the linear similarity mapping instead of the anchored one
        #[arg(long)]
        linear: bool,

        /// Output detailed analysis
        #[arg(short, long)]
        detailed: bool,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Disable colored console output
        #[arg(long)]
        no_color: bool,
    },

    /// List job profiles grouped by field and aptitude
    Jobs {
        /// Show only this top-level field
        #[arg(long)]
        top: Option<String>,
    },

    /// List company profiles
    Companies,

    /// List configured embedding models
    Models,

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<crate::config::OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(crate::config::OutputFormat::Console),
        "json" => Ok(crate::config::OutputFormat::Json),
        "markdown" | "md" => Ok(crate::config::OutputFormat::Markdown),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown",
            format
        )),
    }
}

/// Validate file extension; `-` (stdin) is always accepted.
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    if path == Path::new("-") {
        return Ok(());
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Ok(()),
    }
}
