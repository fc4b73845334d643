//! Command-line flags.
//!
//! Flag names keep the underscore spelling existing run scripts use
//! (`--batch_size`, `--data_path`); the kebab-case forms are accepted too.

use std::path::PathBuf;

use clap::Parser;
use ruleval_runtime::RuntimeConfig;

/// Multi-round multilingual constraint evaluation of LLM responses.
#[derive(Parser, Debug)]
#[command(name = "ruleval")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Dataset: a JSON array of items
    #[arg(long = "data_path", alias = "data-path", required_unless_present = "list_rules")]
    pub data_path: Option<PathBuf>,

    /// Prompts per model call
    #[arg(long = "batch_size", alias = "batch-size")]
    pub batch_size: Option<usize>,

    /// Total number of rounds, round 0 included
    #[arg(long)]
    pub rounds: Option<u32>,

    /// Directory for round_<N>.json and summary.json
    #[arg(long = "output_dir", alias = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Only evaluate items in this language (name, ISO code, or Chinese name)
    #[arg(long = "language_filter", alias = "language-filter")]
    pub language_filter: Option<String>,

    /// Skip the connectivity check against the model endpoints
    #[arg(long = "skip_api_test", alias = "skip-api-test")]
    pub skip_api_test: bool,

    /// YAML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Continue after the newest round snapshot in the output directory
    #[arg(long)]
    pub resume: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Print every registered rule and exit
    #[arg(long)]
    pub list_rules: bool,
}

impl Cli {
    /// Flags win over the YAML file and the environment.
    pub fn apply_overrides(&self, config: &mut RuntimeConfig) {
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
    }
}
