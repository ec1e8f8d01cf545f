//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::export::ExportArgs;
use super::commands::plan::PlanArgs;
use super::commands::serve::ServeArgs;

#[derive(Parser)]
#[command(name = "image-compare")]
#[command(about = "Paired-image similarity experiment server", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults plus this file plus IMAGE_COMPARE_* env)
    #[arg(short, long, global = true, env = "IMAGE_COMPARE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the experiment HTTP server
    Serve(ServeArgs),

    /// Export aggregated scores
    Export(ExportArgs),

    /// Preview a session sequence drawn from the configured image folders
    Plan(PlanArgs),
}
