//! Writes result tables to `<base_filename>_<table>.<ext>`.

use anyhow::{Context, Result};
use log::{error, info};
use sampler_common::OutputConfig;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    /// Unknown names fall back to CSV.
    pub fn from_name(name: &str) -> Self {
        match name {
            "csv" => OutputFormat::Csv,
            "json" => OutputFormat::Json,
            other => {
                error!("Unknown output format: {}. Using CSV instead.", other);
                OutputFormat::Csv
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableWriter {
    base_filename: String,
    format: OutputFormat,
}

impl TableWriter {
    pub fn new(base_filename: &str, format: OutputFormat) -> Self {
        Self { base_filename: base_filename.to_string(), format }
    }

    pub fn from_config(output: &OutputConfig) -> Self {
        let format = OutputFormat::from_name(output.format_name());
        Self::new(&output.base_filename, format)
    }

    pub fn path_for(&self, table: &str) -> PathBuf {
        PathBuf::from(format!("{}_{}.{}", self.base_filename, table, self.format.extension()))
    }

    /// Writes `rows` as table `table` and returns the path written.
    pub fn write_table<S: Serialize>(&self, table: &str, rows: &[S]) -> Result<PathBuf> {
        let path = self.path_for(table);
        match self.format {
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_path(&path)
                    .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;
                for row in rows {
                    writer.serialize(row)?;
                }
                writer.flush()?;
            }
            OutputFormat::Json => {
                let file = File::create(&path)
                    .with_context(|| format!("Error creating JSON file '{}'", path.display()))?;
                let mut writer = BufWriter::new(file);
                serde_json::to_writer_pretty(&mut writer, rows)?;
                writer.flush()?;
            }
        }
        info!("{} rows saved to {}", rows.len(), path.display());
        Ok(path)
    }
}
