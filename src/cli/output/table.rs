//! Table output formatting for CLI commands
//!
//! Renders pair score rows and planned session sequences using comfy-table.

use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::env;

use crate::domain::models::{ImagePair, PairRow};

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format flattened pair scores
    pub fn format_pair_rows(&self, rows: &[PairRow]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Image A").add_attribute(Attribute::Bold),
            Cell::new("Image B").add_attribute(Attribute::Bold),
            Cell::new("Total").add_attribute(Attribute::Bold),
            Cell::new("Votes").add_attribute(Attribute::Bold),
            Cell::new("Avg").add_attribute(Attribute::Bold),
            Cell::new("Avg time (ms)").add_attribute(Attribute::Bold),
        ]);

        for row in rows {
            let avg = format!("{:.4}", row.average_rating);
            let avg_cell = if self.use_colors {
                Cell::new(avg).fg(rating_color(row.average_rating))
            } else {
                Cell::new(avg)
            };
            let avg_time = if row.time_votes == 0 {
                "-".to_string()
            } else {
                row.avg_time_ms.to_string()
            };

            table.add_row(vec![
                Cell::new(truncate_text(&row.img_a, 48)),
                Cell::new(truncate_text(&row.img_b, 48)),
                Cell::new(row.total).set_alignment(CellAlignment::Right),
                Cell::new(row.votes).set_alignment(CellAlignment::Right),
                avg_cell.set_alignment(CellAlignment::Right),
                Cell::new(avg_time).set_alignment(CellAlignment::Right),
            ]);
        }

        table.to_string()
    }

    /// Format a planned session sequence
    pub fn format_plan(&self, pairs: &[ImagePair]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Image A").add_attribute(Attribute::Bold),
            Cell::new("Image B").add_attribute(Attribute::Bold),
            Cell::new("Kind").add_attribute(Attribute::Bold),
        ]);

        for (index, pair) in pairs.iter().enumerate() {
            let kind = if pair.is_self_pair() { "self" } else { "pair" };
            let kind_cell = if self.use_colors && pair.is_self_pair() {
                Cell::new(kind).fg(Color::Yellow)
            } else {
                Cell::new(kind)
            };

            table.add_row(vec![
                Cell::new(index + 1).set_alignment(CellAlignment::Right),
                Cell::new(truncate_text(&pair.img_a, 48)),
                Cell::new(truncate_text(&pair.img_b, 48)),
                kind_cell,
            ]);
        }

        table.to_string()
    }

    /// Create a base table with common settings
    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

fn rating_color(average: f64) -> Color {
    if average >= 0.5 {
        Color::Green
    } else {
        Color::Red
    }
}

/// Truncate text to max length with ellipsis
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
