//! # Congestion - Seoul subway congestion data pipeline
//!
//! Loads the operator's wide CSV export (one row per line / station /
//! direction, one column per half-hour slot), reshapes it into a long table
//! with a canonical 05:30 → 00:30 slot order, and answers the queries and
//! aggregations the dashboard pages are built from.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Transform  │────▶│   Dataset   │
//! │ (cp949/UTF8)│     │ (fallback)  │     │(clean/melt) │     │  (cached)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//!                            ┌───────────────┬───────────────────────┤
//!                            ▼               ▼                       ▼
//!                      ┌──────────┐    ┌──────────┐           ┌──────────┐
//!                      │  Query   │    │ Analysis │           │  Export  │
//!                      │ (filter) │    │ (stats)  │           │ (CSV+BOM)│
//!                      └──────────┘    └──────────┘           └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use congestion::{DatasetCache, FilterConfig, summarize};
//!
//! let cache = DatasetCache::new();
//! let dataset = cache.get_default().unwrap();
//! let selection = FilterConfig::new()
//!     .lines(["2호선"])
//!     .time_range_labels("07:00", "09:00")
//!     .unwrap()
//!     .apply(dataset.observations());
//! if let Some(summary) = summarize(&selection) {
//!     println!("{} rows, peak at {}", summary.rows, summary.peak_time_slot);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`config`] - Defaults and environment configuration
//! - [`logging`] - `tracing` subscriber setup
//! - [`models`] - Time slots, observations, datasets
//! - [`parser`] - Byte decoding and raw CSV parsing
//! - [`transform`] - Clean, reshape, load pipeline
//! - [`cache`] - Per-path dataset memoization
//! - [`query`] - Unique values, station lists, filters
//! - [`analysis`] - Summaries, heatmap, quality report
//! - [`export`] - UTF-8-BOM CSV output

// Core modules
pub mod config;
pub mod error;
pub mod logging;
pub mod models;

// Loading
pub mod parser;
pub mod transform;

// Caching
pub mod cache;

// Querying
pub mod analysis;
pub mod export;
pub mod query;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, ExportError, FilterError, PipelineError, SchemaError};

// =============================================================================
// Re-exports - Config
// =============================================================================

pub use config::Config;

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    compare_time_labels,
    Column,
    CongestionLevel,
    Dataset,
    Observation,
    SourceInfo,
    TimeSlot,
    TIME_ORDER,
};

// =============================================================================
// Re-exports - Loading
// =============================================================================

pub use parser::{decode_with_fallback, load_raw, parse_bytes, RawTable, SourceEncoding};

pub use transform::{
    clean,
    load_dataset,
    load_dataset_from_bytes,
    normalize_time_header,
    reshape,
    CleanTable,
    Reshaped,
};

// =============================================================================
// Re-exports - Cache
// =============================================================================

pub use cache::DatasetCache;

// =============================================================================
// Re-exports - Query
// =============================================================================

pub use query::{
    filter_observations,
    get_stations_by_line,
    get_stations_by_lines,
    get_unique_values,
    FilterConfig,
    TimeRange,
};

// =============================================================================
// Re-exports - Analysis
// =============================================================================

pub use analysis::{
    compare_stations,
    mean_by,
    outliers,
    peak_time_slot,
    station_stats,
    summarize,
    time_slot_stats,
    top_at_time,
    Heatmap,
    HeatmapSort,
    QualityReport,
    QualityStatus,
    StationRef,
    Summary,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{ObservationLayout, Table};
