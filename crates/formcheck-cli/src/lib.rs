//! Formcheck CLI
//!
//! Offline tooling around the form-evaluation engine.
//!
//! # Usage
//!
//! ```bash
//! # Generate a clean synthetic session and write it to ./sessions
//! formcheck simulate --exercise squat --reps 5 --output sessions
//!
//! # Re-analyze a recorded session with a tuned configuration
//! formcheck --config formcheck.toml replay sessions/demo.json
//!
//! # Show a session's metadata without analyzing it
//! formcheck inspect sessions/demo.json
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use formcheck_core::ExerciseType;

pub mod commands;
pub mod report;

/// Exercise form evaluation over recorded pose sessions
#[derive(Parser, Debug)]
#[command(name = "formcheck")]
#[command(author, version, about = "Exercise form evaluation over recorded pose sessions")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Engine configuration file (TOML, YAML or JSON); FORMCHECK_* variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Re-run analysis over a recorded session export
    Replay(ReplayArgs),

    /// Print a session export's metadata
    Inspect(InspectArgs),

    /// Record a synthetic session of clean repetitions
    Simulate(SimulateArgs),

    /// List supported exercises and their phase names
    Exercises,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Session export (JSON)
    pub input: PathBuf,

    /// Analyze as this exercise instead of the recorded one
    #[arg(short, long)]
    pub exercise: Option<ExerciseType>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the re-analyzed export into this directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Session export (JSON)
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[arg(short, long, default_value = "squat")]
    pub exercise: ExerciseType,

    #[arg(short, long, default_value_t = 5)]
    pub reps: usize,

    /// Frames per half repetition
    #[arg(long, default_value_t = 15)]
    pub steps: usize,

    /// Landmark confidence of generated frames
    #[arg(long, default_value_t = 0.9)]
    pub confidence: f32,

    #[arg(long, default_value = "simulated")]
    pub session_id: String,

    /// Directory to write the export into
    #[arg(short, long, default_value = "sessions")]
    pub output: PathBuf,
}
