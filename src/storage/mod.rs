//! Export of extracted records to JSON and CSV files
//!
//! Files are named `{prefix}_{YYYYmmdd_HHMMSS}.{json,csv}` and written to the
//! configured output directory.

pub mod csv;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::OutputConfig;
use crate::models::EventRecord;
use crate::utils::sanitize_filename;

/// Export file format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Both,
}

impl OutputFormat {
    pub fn writes_json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }

    pub fn writes_csv(self) -> bool {
        matches!(self, Self::Csv | Self::Both)
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "both" => Ok(Self::Both),
            other => bail!("unknown output format '{other}' (expected json, csv or both)"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Both => "both",
        };
        write!(f, "{name}")
    }
}

/// Writes record batches to timestamped files
#[derive(Debug, Clone)]
pub struct EventExporter {
    directory: PathBuf,
    prefix: String,
    format: OutputFormat,
}

impl EventExporter {
    /// Create an exporter from output configuration
    ///
    /// # Errors
    ///
    /// Fails on an unknown output format
    pub fn new(config: &OutputConfig) -> Result<Self> {
        Ok(Self {
            directory: config.directory.clone(),
            prefix: sanitize_filename(config.prefix.trim()),
            format: config.format.parse()?,
        })
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// File name stem for a run started at `at`
    pub fn file_stem(&self, at: DateTime<Local>) -> String {
        format!("{}_{}", self.prefix, at.format("%Y%m%d_%H%M%S"))
    }

    /// Write `records` in the configured formats, returning the written paths
    ///
    /// # Errors
    ///
    /// Fails if the output directory or a file cannot be written
    pub fn export(&self, records: &[EventRecord]) -> Result<Vec<PathBuf>> {
        self.export_at(records, Local::now())
    }

    /// Same as [`export`](Self::export) with an explicit timestamp
    pub fn export_at(&self, records: &[EventRecord], at: DateTime<Local>) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.directory).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                self.directory.display()
            )
        })?;

        let stem = self.file_stem(at);
        let mut written = Vec::new();

        if self.format.writes_json() {
            let path = self.directory.join(format!("{stem}.json"));
            write_json(&path, records)?;
            tracing::info!(path = %path.display(), records = records.len(), "Exported JSON");
            written.push(path);
        }

        if self.format.writes_csv() {
            let path = self.directory.join(format!("{stem}.csv"));
            write_csv(&path, records)?;
            tracing::info!(path = %path.display(), records = records.len(), "Exported CSV");
            written.push(path);
        }

        Ok(written)
    }
}

fn write_json(path: &Path, records: &[EventRecord]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records).context("Failed to serialize records")?;
    writer.flush().context("Failed to write JSON export")?;
    Ok(())
}

fn write_csv(path: &Path, records: &[EventRecord]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    csv::write_records(&mut writer, records).context("Failed to write CSV export")?;
    writer.flush().context("Failed to write CSV export")?;
    Ok(())
}

/// Human-readable sample of the first `count` records
pub fn preview(records: &[EventRecord], count: usize) -> Result<String> {
    let rule = "=".repeat(50);
    let mut out = format!("{rule}\nSAMPLE OUTPUT:\n{rule}\n");

    for (i, record) in records.iter().take(count).enumerate() {
        let json = serde_json::to_string_pretty(record).context("Failed to serialize record")?;
        out.push_str(&format!("\nEvent {}:\n{json}\n", i + 1));
    }

    if records.len() > count {
        out.push_str(&format!("\n... and {} more events\n", records.len() - count));
    }

    Ok(out)
}
