//! Whitespace and station-id cleanup on the raw table.

use crate::parser::{RawTable, SourceEncoding};

use super::source_columns;

/// Raw table after cleanup. Cells are still strings except the station id.
///
/// Only [`clean`] builds one, so every row is exactly as wide as the header
/// and there is one station id per row.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTable {
    /// Trimmed header names.
    pub(crate) headers: Vec<String>,
    /// Cells; text columns are trimmed, time-slot cells are untouched.
    pub(crate) rows: Vec<Vec<String>>,
    /// Parsed `역번호` per row. All `None` when the column is absent.
    pub(crate) station_ids: Vec<Option<i64>>,
    /// Encoding the raw file was decoded with.
    pub(crate) encoding: SourceEncoding,
}

impl CleanTable {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn station_ids(&self) -> &[Option<i64>] {
        &self.station_ids
    }

    pub fn encoding(&self) -> SourceEncoding {
        self.encoding
    }

    /// Index of the column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Trim headers and text cells, and coerce the station id.
///
/// Never fails: an id that does not parse becomes `None`. Rows are padded
/// with empty cells or truncated to the header width.
pub fn clean(raw: RawTable) -> CleanTable {
    let headers: Vec<String> = raw.headers.iter().map(|h| h.trim().to_string()).collect();

    let text_columns: Vec<usize> = source_columns::TEXT
        .iter()
        .filter_map(|name| headers.iter().position(|h| h == name))
        .collect();
    let id_column = headers
        .iter()
        .position(|h| h == source_columns::STATION_ID);

    let mut station_ids = Vec::with_capacity(raw.rows.len());
    let rows = raw
        .rows
        .into_iter()
        .map(|mut row| {
            row.resize(headers.len(), String::new());
            for &i in &text_columns {
                let trimmed = row[i].trim();
                if trimmed.len() != row[i].len() {
                    row[i] = trimmed.to_string();
                }
            }
            station_ids.push(id_column.and_then(|i| parse_station_id(&row[i])));
            row
        })
        .collect();

    CleanTable {
        headers,
        rows,
        station_ids,
        encoding: raw.encoding,
    }
}

/// Parse a station id: an integer, or a float with no fractional part.
///
/// Ids are integers, so a fractional value (`12.5`) or one outside the `i64`
/// range (`1e20`) is `None` like any other unparseable cell.
pub fn parse_station_id(value: &str) -> Option<i64> {
    let value = value.trim();
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|f| {
                f.is_finite()
                    && f.fract() == 0.0
                    && *f >= i64::MIN as f64
                    && *f < i64::MAX as f64
            })
            .map(|f| f as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            encoding: SourceEncoding::Cp949,
        }
    }

    #[test]
    fn test_headers_and_text_columns_trimmed() {
        let table = clean(raw(
            &[" 요일구분", "호선 ", "출발역", "상하구분", "5시30분 "],
            &[&[" 평일 ", "2호선", "  강남", "상선 ", " 45.2 "]],
        ));

        assert_eq!(table.headers, vec!["요일구분", "호선", "출발역", "상하구분", "5시30분"]);
        assert_eq!(table.rows[0][..4], ["평일", "2호선", "강남", "상선"]);
        // time-slot cells are left for the reshaper
        assert_eq!(table.rows[0][4], " 45.2 ");
    }

    #[test]
    fn test_station_id_coercion() {
        let table = clean(raw(
            &["역번호", "호선"],
            &[&["150", "1호선"], &["151.0", "1호선"], &["?", "1호선"], &["", "1호선"]],
        ));

        assert_eq!(table.station_ids, vec![Some(150), Some(151), None, None]);
    }

    #[test]
    fn test_station_ids_none_without_column() {
        let table = clean(raw(&["호선"], &[&["1호선"], &["2호선"]]));
        assert_eq!(table.station_ids, vec![None, None]);
    }

    #[test]
    fn test_parse_station_id() {
        assert_eq!(parse_station_id(" 2561 "), Some(2561));
        assert_eq!(parse_station_id("12.5"), None);
        assert_eq!(parse_station_id("NaN"), None);
        assert_eq!(parse_station_id("역"), None);
    }

    #[test]
    fn test_station_id_rejects_fraction_and_overflow() {
        assert_eq!(parse_station_id("150.0"), Some(150));
        assert_eq!(parse_station_id("1.5e2"), Some(150));
        assert_eq!(parse_station_id("12.5"), None);
        assert_eq!(parse_station_id("1e20"), None);
        assert_eq!(parse_station_id("-1e20"), None);
        assert_eq!(parse_station_id("inf"), None);
    }

    #[test]
    fn test_rows_match_header_width() {
        let table = clean(RawTable {
            headers: vec!["역번호".into(), "호선".into(), "출발역".into()],
            rows: vec![
                vec!["150".into()],
                vec!["151".into(), "1호선".into(), "시청".into(), "extra".into()],
            ],
            encoding: SourceEncoding::Utf8,
        });

        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.station_ids(), &[Some(150), Some(151)]);
        assert!(table.rows().iter().all(|r| r.len() == table.headers().len()));
        assert_eq!(table.rows()[0], vec!["150", "", ""]);
        assert_eq!(table.encoding(), SourceEncoding::Utf8);
    }
}
