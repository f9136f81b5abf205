//! Lookups the dashboard pages build their selectors from.

pub mod filter;

pub use filter::{filter_observations, FilterConfig, TimeRange};

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::{Column, Observation, TimeSlot};

const LINE_SUFFIX: &str = "호선";

/// Number embedded in a `N호선` label. `None` for other lines (e.g. `경춘선`).
pub fn line_number(line: &str) -> Option<u32> {
    if !line.contains(LINE_SUFFIX) {
        return None;
    }
    line.replace(LINE_SUFFIX, "").trim().parse().ok()
}

/// Order lines by embedded number; unnumbered lines last, then by name.
pub fn compare_lines(a: &str, b: &str) -> Ordering {
    match (line_number(a), line_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Distinct values of `column`, sorted for display.
///
/// - `line`: by line number, unnumbered lines last
/// - `time_slot`: canonical slot order
/// - `station_id`, `congestion`: numeric
/// - everything else: lexicographic
///
/// Missing station ids are skipped.
///
/// ```
/// use congestion::{get_unique_values, Column, Observation, TimeSlot};
///
/// let obs = |line: &str| Observation {
///     day_type: "평일".into(),
///     line: line.into(),
///     station_id: None,
///     station: "역".into(),
///     direction: "상선".into(),
///     time_slot: TimeSlot::FIRST,
///     congestion: 1.0,
/// };
/// let rows = vec![obs("10호선"), obs("2호선"), obs("1호선")];
/// assert_eq!(get_unique_values(&rows, Column::Line), ["1호선", "2호선", "10호선"]);
/// ```
pub fn get_unique_values(observations: &[Observation], column: Column) -> Vec<String> {
    match column {
        Column::TimeSlot => {
            let slots: BTreeSet<TimeSlot> = observations.iter().map(|o| o.time_slot).collect();
            slots.into_iter().map(|s| s.label().to_string()).collect()
        }
        Column::StationId => {
            let ids: BTreeSet<i64> = observations.iter().filter_map(|o| o.station_id).collect();
            ids.into_iter().map(|id| id.to_string()).collect()
        }
        Column::Congestion => {
            let mut values: Vec<f64> = observations.iter().map(|o| o.congestion).collect();
            values.sort_by(f64::total_cmp);
            values.dedup();
            values.into_iter().map(|v| v.to_string()).collect()
        }
        _ => {
            let distinct: BTreeSet<String> =
                observations.iter().filter_map(|o| o.value(column)).collect();
            let mut values: Vec<String> = distinct.into_iter().collect();
            if column == Column::Line {
                values.sort_by(|a, b| compare_lines(a, b));
            }
            values
        }
    }
}

/// Sorted distinct station names, optionally limited to one line. An empty
/// line name means no line filter.
pub fn get_stations_by_line(observations: &[Observation], line: Option<&str>) -> Vec<String> {
    let line = line.filter(|l| !l.is_empty());
    observations
        .iter()
        .filter(|o| line.map_or(true, |l| o.line == l))
        .map(|o| o.station.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Stations available for a multi-line selection, as the station picker shows them.
pub fn get_stations_by_lines<'a>(
    observations: &[Observation],
    lines: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let mut stations = BTreeSet::new();
    for line in lines {
        stations.extend(get_stations_by_line(observations, Some(line)));
    }
    stations.into_iter().collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn obs(line: &str, station: &str, direction: &str, slot: &str, value: f64) -> Observation {
        Observation {
            day_type: "평일".to_string(),
            line: line.to_string(),
            station_id: None,
            station: station.to_string(),
            direction: direction.to_string(),
            time_slot: TimeSlot::from_label(slot).unwrap(),
            congestion: value,
        }
    }

    #[test]
    fn test_line_numeric_order() {
        let rows = vec![
            obs("10호선", "a", "상선", "05:30", 1.0),
            obs("2호선", "b", "상선", "05:30", 1.0),
            obs("1호선", "c", "상선", "05:30", 1.0),
        ];
        assert_eq!(
            get_unique_values(&rows, Column::Line),
            vec!["1호선", "2호선", "10호선"]
        );
    }

    #[test]
    fn test_unnumbered_lines_last() {
        let rows = vec![
            obs("우이신설선", "a", "상선", "05:30", 1.0),
            obs("9호선", "b", "상선", "05:30", 1.0),
            obs("경춘선", "c", "상선", "05:30", 1.0),
        ];
        assert_eq!(
            get_unique_values(&rows, Column::Line),
            vec!["9호선", "경춘선", "우이신설선"]
        );
    }

    #[test]
    fn test_line_number() {
        assert_eq!(line_number("2호선"), Some(2));
        assert_eq!(line_number("10호선"), Some(10));
        assert_eq!(line_number("경의중앙선"), None);
        assert_eq!(line_number("신분당호선"), None);
    }

    #[test]
    fn test_time_slots_in_canonical_order() {
        let rows = vec![
            obs("1호선", "a", "상선", "00:30", 1.0),
            obs("1호선", "a", "상선", "23:30", 1.0),
            obs("1호선", "a", "상선", "05:30", 1.0),
            obs("1호선", "a", "하선", "05:30", 1.0),
        ];
        assert_eq!(
            get_unique_values(&rows, Column::TimeSlot),
            vec!["05:30", "23:30", "00:30"]
        );
    }

    #[test]
    fn test_other_columns_lexicographic() {
        let rows = vec![
            obs("1호선", "종각", "하선", "05:30", 1.0),
            obs("1호선", "서울역", "상선", "05:30", 1.0),
            obs("1호선", "종각", "상선", "05:30", 1.0),
        ];
        assert_eq!(get_unique_values(&rows, Column::Station), vec!["서울역", "종각"]);
        assert_eq!(get_unique_values(&rows, Column::Direction), vec!["상선", "하선"]);
        assert_eq!(get_unique_values(&rows, Column::DayType), vec!["평일"]);
    }

    #[test]
    fn test_numeric_columns() {
        let mut rows = vec![
            obs("1호선", "a", "상선", "05:30", 100.0),
            obs("1호선", "a", "상선", "06:00", 9.5),
            obs("1호선", "a", "상선", "06:30", 9.5),
        ];
        rows[0].station_id = Some(1001);
        rows[1].station_id = Some(150);

        assert_eq!(get_unique_values(&rows, Column::StationId), vec!["150", "1001"]);
        assert_eq!(get_unique_values(&rows, Column::Congestion), vec!["9.5", "100"]);
    }

    #[test]
    fn test_stations_by_line() {
        let rows = vec![
            obs("2호선", "강남", "내선", "05:30", 1.0),
            obs("2호선", "교대", "내선", "05:30", 1.0),
            obs("3호선", "교대", "상선", "05:30", 1.0),
            obs("3호선", "압구정", "상선", "05:30", 1.0),
        ];

        assert_eq!(get_stations_by_line(&rows, Some("2호선")), vec!["강남", "교대"]);
        assert_eq!(
            get_stations_by_line(&rows, None),
            vec!["강남", "교대", "압구정"]
        );
        assert!(get_stations_by_line(&rows, Some("9호선")).is_empty());
        assert_eq!(
            get_stations_by_line(&rows, Some("")),
            get_stations_by_line(&rows, None)
        );
        assert_eq!(
            get_stations_by_lines(&rows, ["3호선", "2호선"]),
            vec!["강남", "교대", "압구정"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(get_unique_values(&[], Column::Line).is_empty());
        assert!(get_stations_by_line(&[], None).is_empty());
    }
}
