//! Implementation of the `image-compare export` command.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, PairRow};
use crate::infrastructure::storage::JsonFileScoreRepository;
use crate::services::{Export, ExportFormat, ScoreService};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    /// Structured dump of image, pair and user scores
    #[default]
    Json,
    /// Flattened pair table as CSV
    Csv,
    /// Flattened pair table for the terminal
    Table,
}

#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Export format
    #[arg(short, long, value_enum, default_value_t = ExportKind::Json)]
    pub format: ExportKind,

    /// Scores document to read (overrides storage.scores_path)
    #[arg(long)]
    pub scores_path: Option<PathBuf>,

    /// Write the export to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, serde::Serialize)]
pub struct ExportOutput {
    pub path: PathBuf,
    pub format: String,
    pub pairs: usize,
    pub bytes: usize,
}

impl CommandOutput for ExportOutput {
    fn to_human(&self) -> String {
        format!(
            "Exported {} pair(s) as {} to {} ({} bytes)",
            self.pairs,
            self.format,
            self.path.display(),
            self.bytes
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PairTableOutput {
    pub rows: Vec<PairRow>,
}

impl CommandOutput for PairTableOutput {
    fn to_human(&self) -> String {
        if self.rows.is_empty() {
            return "No pair scores recorded.".to_string();
        }
        format!(
            "{}\n\nShowing {} pair(s)",
            TableFormatter::new().format_pair_rows(&self.rows),
            self.rows.len()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.rows).unwrap_or_default()
    }
}

/// Render an export as the text written to stdout or a file.
pub fn render(export: Export) -> Result<String> {
    match export {
        Export::Json(store) => {
            serde_json::to_string_pretty(&store).context("Failed to serialize scores")
        }
        Export::Csv(csv) => Ok(csv),
    }
}

pub async fn execute(args: ExportArgs, config: Config, json_mode: bool) -> Result<()> {
    let path = args
        .scores_path
        .unwrap_or_else(|| PathBuf::from(&config.storage.scores_path));
    let repository = Arc::new(JsonFileScoreRepository::new(path));
    let service = ScoreService::load(repository).await;

    let format = match args.format {
        ExportKind::Table => {
            output(
                &PairTableOutput {
                    rows: service.pair_rows().await,
                },
                json_mode,
            );
            return Ok(());
        }
        ExportKind::Json => ExportFormat::Json,
        ExportKind::Csv => ExportFormat::Csv,
    };

    let pairs = service.snapshot().await.pair_scores.len();
    let body = render(service.export(format).await)?;

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            tokio::fs::write(&path, &body)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output(
                &ExportOutput {
                    path,
                    format: format!("{format:?}").to_lowercase(),
                    pairs,
                    bytes: body.len(),
                },
                json_mode,
            );
        }
        None => print!("{body}"),
    }

    Ok(())
}
