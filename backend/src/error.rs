//! Error types for the congestion data pipeline.
//!
//! One error type per layer:
//!
//! - [`CsvError`] - reading and decoding the raw export
//! - [`SchemaError`] - the file decoded but is not the expected shape
//! - [`FilterError`] - invalid filter or query arguments
//! - [`ExportError`] - writing CSV downloads
//! - [`PipelineError`] - top-level load orchestration
//!
//! Conversion is via `From`, so `?` works across layer boundaries.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// CSV Loading Errors
// =============================================================================

/// Errors while reading the raw CSV export.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// None of the supported encodings could decode the bytes.
    #[error("No supported encoding could decode the file (tried {})", tried.join(", "))]
    UnsupportedEncoding { tried: Vec<&'static str> },

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    Parse(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Schema Errors
// =============================================================================

/// The file decoded but does not look like a congestion export.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No `<H>시<M>분` column maps to a known time slot.
    #[error("Schema mismatch: no time-slot columns found")]
    NoTimeSlotColumns,

    /// Required identifying columns are absent.
    #[error("Schema mismatch: missing identifying columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

// =============================================================================
// Filter / Query Errors
// =============================================================================

/// Invalid arguments to filters and queries.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Label is not one of the 39 canonical time slots.
    #[error("Unknown time slot: {0}")]
    UnknownTimeSlot(String),

    /// Congestion bounds are reversed or not numbers.
    #[error("Invalid congestion range: {min} > {max}")]
    InvalidCongestionRange { min: f64, max: f64 },

    /// Station reference is not in `"station (line)"` form.
    #[error("Invalid station reference '{0}', expected \"station (line)\"")]
    InvalidStationRef(String),

    /// Column name is not part of the long-form schema.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while producing CSV downloads.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization failed.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level load errors returned by [`crate::transform::pipeline::load_dataset`]
/// and [`crate::cache::DatasetCache::get_data`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The source file does not exist. Checked before any read.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Reading or decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// The file is not the expected shape.
    #[error("{0}")]
    Schema(#[from] SchemaError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV loading.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for schema checks.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for filters and queries.
pub type FilterResult<T> = Result<T, FilterError>;

/// Result type for exports.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for the load pipeline.
pub type PipelineResult<T> = Result<T, PipelineError>;
