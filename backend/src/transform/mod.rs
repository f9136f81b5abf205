//! Transformation module.
//!
//! Turns the raw wide export into the long-form [`crate::models::Dataset`]:
//! - Clean: trim text columns, coerce the station id
//! - Reshape: melt time-slot columns, normalize labels, order and sort
//! - Pipeline: file check, then load → clean → reshape

pub mod clean;
pub mod pipeline;
pub mod reshape;

pub use clean::{clean, parse_station_id, CleanTable};
pub use pipeline::{load_dataset, load_dataset_from_bytes};
pub use reshape::{is_time_header, normalize_time_header, reshape, Reshaped};

/// Source header names in the operator's export.
pub mod source_columns {
    pub const DAY_TYPE: &str = "요일구분";
    pub const LINE: &str = "호선";
    pub const STATION_ID: &str = "역번호";
    pub const STATION: &str = "출발역";
    pub const DIRECTION: &str = "상하구분";

    /// Text columns that get whitespace-trimmed.
    pub const TEXT: [&str; 4] = [DAY_TYPE, LINE, STATION, DIRECTION];

    /// Columns without which the file cannot be reshaped.
    pub const REQUIRED: [&str; 3] = [LINE, STATION, DIRECTION];
}
