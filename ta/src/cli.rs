//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::{DayKey, StepPatch};

/// TaskAgent - break tasks into steps and track what got done
#[derive(Parser)]
#[command(
    name = "ta",
    about = "Personal task tracker with step decomposition and daily achievements",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/taskagent/logs/taskagent.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Serve the HTTP API and progress websocket
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Create a task and break it into steps
    Add {
        /// Task title
        title: String,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List incomplete tasks
    List {
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one task with its steps
    Show {
        task_id: String,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Mark a step done or not done, or rewrite it
    ///
    /// With no flags the step is marked done. `--content` alone leaves the
    /// done state as it is.
    Step {
        step_id: String,

        /// Mark the step as done
        #[arg(long, conflicts_with = "undone")]
        done: bool,

        /// Mark the step as not done
        #[arg(long)]
        undone: bool,

        /// Replace the step text
        #[arg(long)]
        content: Option<String>,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Complete a task and print its summary
    Complete {
        task_id: String,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the summary for a day (default: today, UTC)
    Summary {
        /// Day as YYYY-MM-DD
        #[arg(value_name = "DATE")]
        date: Option<DayKey>,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List daily achievements, newest first
    Achievements {
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
        limit: u32,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Patch described by the `step` subcommand's flags
pub fn step_patch(done: bool, undone: bool, content: Option<String>) -> StepPatch {
    let done = match (done, undone) {
        (_, true) => Some(false),
        (true, false) => Some(true),
        (false, false) if content.is_none() => Some(true),
        (false, false) => None,
    };
    StepPatch { done, content }
}

/// Output format for printed records
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
