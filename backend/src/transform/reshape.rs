//! Wide-to-long reshape of the congestion export.
//!
//! # Architecture
//!
//! ```text
//! Wide (one row per station/direction)         Long (one row per slot)
//! ┌──────┬──────┬──────┬────────┬────────┐     ┌──────┬──────┬──────┬───────┬──────┐
//! │ 호선 │출발역│상하  │5시30분 │6시00분 │     │ line │station│dir  │ slot  │ cong │
//! ├──────┼──────┼──────┼────────┼────────┤  →  ├──────┼──────┼──────┼───────┼──────┤
//! │2호선 │ 강남 │ 상선 │  45.2  │   0    │     │2호선 │ 강남 │ 상선 │ 05:30 │ 45.2 │
//! └──────┴──────┴──────┴────────┴────────┘     │2호선 │ 강남 │ 상선 │ 06:00 │ 0    │
//!                                              └──────┴──────┴──────┴───────┴──────┘
//! ```
//!
//! Cells that are not numbers are data-cleaning events: the cell produces no
//! row and is only counted. The only errors are schema mismatches.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::error::{SchemaError, SchemaResult};
use crate::models::{Dataset, Observation, SourceInfo, TimeSlot};

use super::clean::CleanTable;
use super::source_columns;

static TIME_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)시(\d+)분").expect("time header pattern is valid"));

/// Output of [`reshape`]: the sorted long rows plus bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Reshaped {
    pub observations: Vec<Observation>,
    /// Rows in the wide input.
    pub wide_rows: usize,
    /// Time-slot columns that were melted.
    pub time_columns: usize,
    /// Cells dropped during value coercion.
    pub dropped_cells: usize,
    /// Time-like headers outside the slot domain.
    pub skipped_headers: Vec<String>,
    /// Encoding label carried over from the loader.
    pub encoding: String,
}

impl Reshaped {
    /// Wrap into an immutable [`Dataset`].
    pub fn into_dataset(self, path: Option<std::path::PathBuf>) -> Dataset {
        let source = SourceInfo {
            path,
            encoding: self.encoding,
            wide_rows: self.wide_rows,
            time_columns: self.time_columns,
            dropped_cells: self.dropped_cells,
            skipped_headers: self.skipped_headers,
        };
        Dataset::new(self.observations, source)
    }
}

/// A header naming a time slot contains both `시` (hour) and `분` (minute).
pub fn is_time_header(header: &str) -> bool {
    header.contains('시') && header.contains('분')
}

/// Normalize `"5시30분"` to `"05:30"`.
///
/// Headers that do not match `<digits>시<digits>분` come back unchanged.
pub fn normalize_time_header(header: &str) -> String {
    TIME_HEADER
        .captures(header)
        .and_then(|caps| {
            let hour: u32 = caps[1].parse().ok()?;
            let minute: u32 = caps[2].parse().ok()?;
            Some(format!("{hour:02}:{minute:02}"))
        })
        .unwrap_or_else(|| header.to_string())
}

/// Parse a congestion cell. Empty, non-numeric, non-finite and negative
/// values yield `None`. Negative zero is stored as `0.0`.
pub fn parse_congestion(cell: &str) -> Option<f64> {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v + 0.0)
}

/// Melt the cleaned wide table into sorted long rows.
pub fn reshape(table: &CleanTable) -> SchemaResult<Reshaped> {
    let missing: Vec<String> = source_columns::REQUIRED
        .iter()
        .filter(|name| table.column_index(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing));
    }

    let line_idx = index_of(table, source_columns::LINE)?;
    let station_idx = index_of(table, source_columns::STATION)?;
    let direction_idx = index_of(table, source_columns::DIRECTION)?;
    let day_type_idx = table.column_index(source_columns::DAY_TYPE);

    let mut slot_columns: Vec<(usize, TimeSlot)> = Vec::new();
    let mut skipped_headers = Vec::new();
    for (i, header) in table.headers.iter().enumerate() {
        if !is_time_header(header) {
            continue;
        }
        let label = normalize_time_header(header);
        match TimeSlot::from_label(&label) {
            Some(slot) => slot_columns.push((i, slot)),
            None => {
                warn!(header = %header, label = %label, "skipping time column outside the slot domain");
                skipped_headers.push(header.clone());
            }
        }
    }

    if slot_columns.is_empty() {
        return Err(SchemaError::NoTimeSlotColumns);
    }

    let mut observations = Vec::with_capacity(table.rows.len() * slot_columns.len());
    let mut dropped_cells = 0;

    for (row, station_id) in table.rows.iter().zip(&table.station_ids) {
        for &(col, time_slot) in &slot_columns {
            let Some(congestion) = parse_congestion(&row[col]) else {
                dropped_cells += 1;
                continue;
            };

            observations.push(Observation {
                day_type: day_type_idx.map(|i| row[i].clone()).unwrap_or_default(),
                line: row[line_idx].clone(),
                station_id: *station_id,
                station: row[station_idx].clone(),
                direction: row[direction_idx].clone(),
                time_slot,
                congestion,
            });
        }
    }

    observations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    info!(
        wide_rows = table.rows.len(),
        time_columns = slot_columns.len(),
        long_rows = observations.len(),
        dropped_cells,
        "reshaped to long form"
    );

    Ok(Reshaped {
        observations,
        wide_rows: table.rows.len(),
        time_columns: slot_columns.len(),
        dropped_cells,
        skipped_headers,
        encoding: table.encoding.label().to_string(),
    })
}

fn index_of(table: &CleanTable, name: &str) -> SchemaResult<usize> {
    table
        .column_index(name)
        .ok_or_else(|| SchemaError::MissingColumns(vec![name.to_string()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SourceEncoding;
    use crate::transform::clean::clean;
    use crate::parser::RawTable;

    fn table(headers: &[&str], rows: &[&[&str]]) -> CleanTable {
        clean(RawTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            encoding: SourceEncoding::Cp949,
        })
    }

    fn slot(label: &str) -> TimeSlot {
        TimeSlot::from_label(label).unwrap()
    }

    #[test]
    fn test_normalize_time_header() {
        assert_eq!(normalize_time_header("5시30분"), "05:30");
        assert_eq!(normalize_time_header("08시00분"), "08:00");
        assert_eq!(normalize_time_header("0시30분"), "00:30");
        assert_eq!(normalize_time_header("합계"), "합계");
        assert_eq!(normalize_time_header("시간분"), "시간분");
    }

    #[test]
    fn test_is_time_header() {
        assert!(is_time_header("23시30분"));
        assert!(!is_time_header("출발역"));
        assert!(!is_time_header("5시"));
    }

    #[test]
    fn test_two_slot_scenario_keeps_zero() {
        let input = table(
            &["호선", "출발역", "상하구분", "5시30분", "6시00분"],
            &[&["2호선", "강남", "상선", "45.2", "0"]],
        );

        let out = reshape(&input).unwrap();
        assert_eq!(out.observations.len(), 2);

        let first = &out.observations[0];
        assert_eq!(first.line, "2호선");
        assert_eq!(first.station, "강남");
        assert_eq!(first.direction, "상선");
        assert_eq!(first.time_slot, slot("05:30"));
        assert_eq!(first.congestion, 45.2);
        assert_eq!(first.day_type, "");
        assert_eq!(first.station_id, None);

        let second = &out.observations[1];
        assert_eq!(second.time_slot, slot("06:00"));
        assert_eq!(second.congestion, 0.0);
    }

    #[test]
    fn test_unparseable_cells_dropped() {
        let input = table(
            &["호선", "출발역", "상하구분", "5시30분", "6시00분", "6시30분"],
            &[&["2호선", "강남", "상선", "N/A", "", "12.5"]],
        );

        let out = reshape(&input).unwrap();
        assert_eq!(out.observations.len(), 1);
        assert_eq!(out.observations[0].time_slot, slot("06:30"));
        assert_eq!(out.dropped_cells, 2);
    }

    #[test]
    fn test_melt_completeness() {
        let headers = ["요일구분", "호선", "역번호", "출발역", "상하구분", "5시30분", "6시00분", "6시30분"];
        let rows: [&[&str]; 3] = [
            &["평일", "1호선", "150", "서울역", "상선", "10", "20", "x"],
            &["평일", "1호선", "150", "서울역", "하선", "11", "21", "31"],
            &["토요일", "2호선", "222", "강남", "내선", "-", "22", "32"],
        ];
        let out = reshape(&table(&headers, &rows)).unwrap();

        let r = 3;
        let t = 3;
        assert_eq!(out.time_columns, t);
        assert_eq!(out.wide_rows, r);
        assert!(out.observations.len() <= r * t);
        assert_eq!(out.observations.len() + out.dropped_cells, r * t);
        assert!(out
            .observations
            .iter()
            .all(|o| o.congestion.is_finite() && o.congestion >= 0.0));
    }

    #[test]
    fn test_sorted_with_canonical_time_order() {
        let input = table(
            &["호선", "출발역", "상하구분", "0시30분", "23시30분", "5시30분", "0시00분"],
            &[
                &["2호선", "강남", "하선", "1", "2", "3", "4"],
                &["1호선", "종각", "상선", "5", "6", "7", "8"],
                &["2호선", "강남", "상선", "9", "10", "11", "12"],
            ],
        );

        let out = reshape(&input).unwrap();
        let keys: Vec<(&str, &str, &str)> = out
            .observations
            .iter()
            .map(|o| (o.line.as_str(), o.direction.as_str(), o.time_slot.label()))
            .collect();

        assert_eq!(
            keys,
            vec![
                ("1호선", "상선", "05:30"),
                ("1호선", "상선", "23:30"),
                ("1호선", "상선", "00:00"),
                ("1호선", "상선", "00:30"),
                ("2호선", "상선", "05:30"),
                ("2호선", "상선", "23:30"),
                ("2호선", "상선", "00:00"),
                ("2호선", "상선", "00:30"),
                ("2호선", "하선", "05:30"),
                ("2호선", "하선", "23:30"),
                ("2호선", "하선", "00:00"),
                ("2호선", "하선", "00:30"),
            ]
        );
    }

    #[test]
    fn test_sort_groups_stations_within_line() {
        let input = table(
            &["호선", "출발역", "상하구분", "0시30분", "5시30분"],
            &[
                &["2호선", "역삼", "상선", "10", "20"],
                &["2호선", "강남", "상선", "30", "40"],
            ],
        );

        let out = reshape(&input).unwrap();
        let keys: Vec<(&str, &str)> = out
            .observations
            .iter()
            .map(|o| (o.station.as_str(), o.time_slot.label()))
            .collect();

        assert_eq!(
            keys,
            vec![
                ("강남", "05:30"),
                ("강남", "00:30"),
                ("역삼", "05:30"),
                ("역삼", "00:30"),
            ]
        );
    }

    #[test]
    fn test_negative_and_non_finite_cells_dropped() {
        for cell in ["-5", "-1.5", "inf", "-inf", "NaN"] {
            assert_eq!(parse_congestion(cell), None, "{cell}");
        }
        assert_eq!(parse_congestion(" 1e2 "), Some(100.0));

        let input = table(
            &["호선", "출발역", "상하구분", "5시30분", "6시00분", "6시30분", "7시00분"],
            &[&["2호선", "강남", "상선", "-5", "inf", "NaN", "10"]],
        );

        let out = reshape(&input).unwrap();
        assert_eq!(out.dropped_cells, 3);
        assert_eq!(out.observations.len(), 1);
        assert_eq!(out.observations[0].time_slot, slot("07:00"));
        assert_eq!(out.observations[0].congestion, 10.0);
    }

    #[test]
    fn test_negative_zero_stored_as_zero() {
        let value = parse_congestion("-0").unwrap();
        assert!(value.is_sign_positive());
        assert_eq!(value.to_string(), "0");

        let input = table(
            &["호선", "출발역", "상하구분", "5시30분"],
            &[&["2호선", "강남", "상선", "-0.0"]],
        );
        let out = reshape(&input).unwrap();
        assert_eq!(out.dropped_cells, 0);
        assert!(out.observations[0].congestion.is_sign_positive());
    }

    #[test]
    fn test_identifying_columns_renamed() {
        let input = table(
            &["연번", "요일구분", "호선", "역번호", "출발역", "상하구분", "7시00분"],
            &[&["1", "평일", "1호선", "150", "서울역", "상선", "33.3"]],
        );

        let out = reshape(&input).unwrap();
        let obs = &out.observations[0];
        assert_eq!(obs.day_type, "평일");
        assert_eq!(obs.station_id, Some(150));
        assert_eq!(obs.station, "서울역");
    }

    #[test]
    fn test_out_of_domain_header_skipped() {
        let input = table(
            &["호선", "출발역", "상하구분", "5시30분", "24시00분"],
            &[&["2호선", "강남", "상선", "1", "2"]],
        );

        let out = reshape(&input).unwrap();
        assert_eq!(out.observations.len(), 1);
        assert_eq!(out.skipped_headers, vec!["24시00분"]);
    }

    #[test]
    fn test_no_time_columns_is_schema_error() {
        let input = table(&["호선", "출발역", "상하구분", "합계"], &[&["2호선", "강남", "상선", "1"]]);
        assert!(matches!(reshape(&input), Err(SchemaError::NoTimeSlotColumns)));
    }

    #[test]
    fn test_missing_identifying_columns() {
        let input = table(&["호선", "5시30분"], &[&["2호선", "1"]]);
        match reshape(&input) {
            Err(SchemaError::MissingColumns(cols)) => {
                assert_eq!(cols, vec!["출발역", "상하구분"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
