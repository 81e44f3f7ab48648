//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::models::ExperimentActionType;

#[derive(Parser, Debug)]
#[command(name = "experiments")]
#[command(about = "Evaluate and inspect experiments", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .experiments/config.yaml and local.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate experiments and list the results
    Evaluate,

    /// Show one experiment
    Show {
        /// Experiment ID (case-insensitive)
        id: String,
    },

    /// List running experiments with the given action type
    Eligible {
        /// Action type: custom, prompt, add-to-recommendations
        #[arg(value_parser = parse_action_type)]
        action_type: ExperimentActionType,
    },

    /// Print the extensions curated under a key
    Curated {
        /// Curated list key
        key: String,
    },

    /// Mark an experiment as completed
    Complete {
        /// Experiment ID
        id: String,
    },

    /// Feed file saves to pending file-edit evaluations
    RecordSave {
        /// Saved file paths
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Milliseconds to wait for trackers to process the saves
        #[arg(long, default_value = "250")]
        settle_ms: u64,
    },
}

fn parse_action_type(value: &str) -> Result<ExperimentActionType, String> {
    ExperimentActionType::parse(value).ok_or_else(|| {
        format!(
            "Invalid action type: {value}. \
             Must be one of: custom, prompt, add-to-recommendations"
        )
    })
}
