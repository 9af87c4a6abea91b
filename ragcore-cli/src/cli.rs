//! ABOUTME: CLI argument parsing: global flags plus the `serve` / `eval run` / `eval compare`
//! ABOUTME: subcommands named in the runbook (§6), grounded on `llmspell-cli`'s `clap`-derive shape

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Trace level for logging output, mapped onto `RUST_LOG`-style verbosity
/// when `RUST_LOG` itself is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl TraceLevel {
    #[must_use]
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Output format for `eval run` / `eval compare` results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "ragcore")]
#[command(version)]
#[command(about = "Permission-aware retrieval-augmented generation engine")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (GLOBAL). Layered under built-in defaults and
    /// `RAGCORE_`-prefixed environment variables.
    #[arg(short = 'c', long, global = true, env = "RAGCORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Named config profile applied on top of the loaded configuration.
    #[arg(short = 'p', long, global = true, value_enum)]
    pub profile: Option<Profile>,

    /// Trace level, overridden by `RUST_LOG` when set.
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub trace: TraceLevel,

    /// Output format for commands that print a result.
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    Dev,
    Staging,
    Prod,
}

impl From<Profile> for ragcore_config::Profile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Dev => Self::Dev,
            Profile::Staging => Self::Staging,
            Profile::Prod => Self::Prod,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP+SSE API server.
    Serve {
        /// Address to bind, e.g. `0.0.0.0:8080`.
        #[arg(long, env = "RAGCORE_ADDR", default_value = "0.0.0.0:8080")]
        addr: String,
    },
    /// Evaluation-harness commands (§4.9).
    Eval {
        #[command(subcommand)]
        action: EvalCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum EvalCommands {
    /// Seed the golden dataset and run every query through the pipeline.
    Run {
        /// Path to a JSON file containing an array of golden queries.
        #[arg(long)]
        dataset: PathBuf,
        /// Label recorded on the run, e.g. a pipeline or model version.
        #[arg(long, default_value = "dev")]
        version_label: String,
        /// Also score the generated answer (groundedness, relevance, key
        /// facts, hallucination), not just retrieval ranking.
        #[arg(long)]
        evaluate_generation: bool,
    },
    /// Compare a baseline run against a candidate run by id.
    Compare {
        #[arg(long)]
        baseline: String,
        #[arg(long)]
        candidate: String,
    },
}
