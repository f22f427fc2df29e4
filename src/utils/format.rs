//! Table formatting and output utilities
//!
//! This module provides functionality for formatting and displaying
//! tabular data with color support and various output formats.

use crate::error::Result;
use clap::ValueEnum;
use crossterm::{
    style::{Color as CrosstermColor, Stylize},
    terminal::size,
};
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Color, Modify, Padding, Style, Width},
    Table, Tabled,
};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
    Raw,
}

impl OutputFormat {
    /// Whether the format is meant for other programs rather than people
    pub fn is_machine_readable(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Yaml)
    }
}

/// Color theme for console output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub header: CrosstermColor,
    pub success: CrosstermColor,
    pub warning: CrosstermColor,
    pub error: CrosstermColor,
    pub info: CrosstermColor,
    pub accent: CrosstermColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            header: CrosstermColor::Blue,
            success: CrosstermColor::Green,
            warning: CrosstermColor::Yellow,
            error: CrosstermColor::Red,
            info: CrosstermColor::Cyan,
            accent: CrosstermColor::Magenta,
        }
    }
}

/// Table formatter with color support
pub struct TableFormatter {
    format: OutputFormat,
    no_color: bool,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        Self { format, no_color }
    }

    /// Render a list of rows in the configured format
    pub fn format_table<T: Tabled + Serialize>(&self, data: &[T]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
            _ if data.is_empty() => Ok("No data to display".to_string()),
            OutputFormat::Table => Ok(self.format_as_table(data)),
            OutputFormat::Raw => Ok(self.format_as_raw(data)),
        }
    }

    /// Render a single value; tables fall back to one-row tables
    pub fn format_item<T: Tabled + Serialize>(&self, item: &T) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(item)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(item)?),
            _ => self.format_table(std::slice::from_ref(item)),
        }
    }

    /// Render a value that has no tabular form; non-machine formats fall back to JSON
    pub fn format_structured<T: Serialize + ?Sized>(&self, item: &T) -> Result<String> {
        match self.format {
            OutputFormat::Yaml => Ok(serde_yaml::to_string(item)?),
            _ => Ok(serde_json::to_string_pretty(item)?),
        }
    }

    fn format_as_table<T: Tabled>(&self, data: &[T]) -> String {
        let mut table = Table::new(data);

        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .with(Padding::new(1, 1, 0, 0));

        if !self.no_color {
            table.with(Modify::new(Rows::first()).with(Color::FG_BLUE));
        }

        if let Ok((width, _)) = size() {
            table.with(Width::wrap(width as usize));
        }

        table.to_string()
    }

    fn format_as_raw<T: Tabled>(&self, data: &[T]) -> String {
        let mut table = Table::new(data);
        table.with(Style::empty());
        table.to_string()
    }
}

/// Status-line printing shared by the managers
///
/// Status lines go to stderr so that stdout carries only command output.
pub struct DisplayUtils {
    theme: ColorTheme,
    no_color: bool,
}

impl DisplayUtils {
    /// Create new display utilities
    pub fn new(no_color: bool) -> Self {
        Self {
            theme: ColorTheme::default(),
            no_color,
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.no_color {
            eprintln!("=== {} ===", title);
        } else {
            eprintln!("=== {} ===", title.with(self.theme.header).bold());
        }
    }

    pub fn print_success(&self, message: &str) {
        self.print_with_symbol("✓", message, self.theme.success);
    }

    pub fn print_warning(&self, message: &str) {
        self.print_with_symbol("⚠", message, self.theme.warning);
    }

    pub fn print_error(&self, message: &str) {
        self.print_with_symbol("✗", message, self.theme.error);
    }

    pub fn print_info(&self, message: &str) {
        self.print_with_symbol("ℹ", message, self.theme.info);
    }

    fn print_with_symbol(&self, symbol: &str, message: &str, color: CrosstermColor) {
        if self.no_color {
            eprintln!("{} {}", symbol, message);
        } else {
            eprintln!("{} {}", symbol, message.with(color));
        }
    }

    /// Print a pre-rendered block of lines to stderr
    pub fn print_block(&self, text: &str) {
        eprintln!("{}", text);
    }

    /// Format key-value pairs
    pub fn format_key_value_pairs(&self, pairs: &[(&str, &str)]) -> String {
        let max_key_length = pairs.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

        pairs
            .iter()
            .map(|(key, value)| {
                let padded = format!("{:width$}", key, width = max_key_length);
                if self.no_color {
                    format!("{}: {}", padded, value)
                } else {
                    format!("{}: {}", padded.with(self.theme.accent).bold(), value)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
