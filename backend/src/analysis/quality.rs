//! Data-quality report over a loaded dataset.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::analysis::{distinct_count, Accumulator};
use crate::config::{EXTREME_CONGESTION, HIGH_CONGESTION};
use crate::models::{CongestionLevel, Dataset, Observation};
use crate::query::compare_lines;

/// Score at or above which the data is considered good.
const GOOD_SCORE: f64 = 90.0;

/// Score at or above which the data only needs a look.
const CAUTION_SCORE: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityStatus {
    Good,
    Caution,
    NeedsReview,
}

impl QualityStatus {
    pub fn from_score(score: f64) -> Self {
        if score >= GOOD_SCORE {
            QualityStatus::Good
        } else if score >= CAUTION_SCORE {
            QualityStatus::Caution
        } else {
            QualityStatus::NeedsReview
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityStatus::Good => "양호",
            QualityStatus::Caution => "주의",
            QualityStatus::NeedsReview => "점검 필요",
        }
    }
}

/// Rows falling in one congestion band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelShare {
    pub level: CongestionLevel,
    pub count: usize,
    /// Percent of all rows.
    pub ratio: f64,
}

/// Per-line quality figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineQuality {
    pub line: String,
    pub stations: usize,
    pub rows: usize,
    pub mean: f64,
    pub max: f64,
    /// Percent of the line's rows equal to zero.
    pub zero_ratio: f64,
}

/// Distribution summary of a set of values.
///
/// Quantiles interpolate linearly between closest ranks; `std` is the sample
/// standard deviation and is NaN for fewer than two values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
}

impl DescriptiveStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = if count < 2 {
            f64::NAN
        } else {
            let squares: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (squares / (count - 1) as f64).sqrt()
        };

        Some(Self {
            count,
            mean,
            median: quantile(&sorted, 0.5),
            std,
            min: sorted[0],
            max: sorted[count - 1],
            q25: quantile(&sorted, 0.25),
            q75: quantile(&sorted, 0.75),
        })
    }
}

/// Linear-interpolated quantile of a sorted, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Everything the data-check page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub total_rows: usize,
    pub wide_rows: usize,
    pub lines: usize,
    pub stations: usize,
    pub time_slots: usize,
    pub directions: usize,

    /// Cells dropped during reshape because they were empty or not numbers.
    pub missing_count: usize,
    /// Percent of all melted cells, kept or dropped.
    pub missing_ratio: f64,
    pub zero_count: usize,
    pub zero_ratio: f64,
    /// Rows at or above [`HIGH_CONGESTION`].
    pub high_count: usize,
    pub high_ratio: f64,
    /// Rows at or above [`EXTREME_CONGESTION`].
    pub extreme_count: usize,
    pub extreme_ratio: f64,

    /// `100 - missing% - 0.5 * zero% - 2 * extreme%`, clamped to `[0, 100]`.
    pub score: f64,
    pub status: QualityStatus,

    pub levels: Vec<LevelShare>,
    pub line_stats: Vec<LineQuality>,
    pub stats: Option<DescriptiveStats>,
}

impl QualityReport {
    pub fn build(dataset: &Dataset) -> Self {
        let observations = dataset.observations();
        let rows = observations.len();
        let missing_count = dataset.source().dropped_cells;

        let count_where = |pred: fn(f64) -> bool| {
            observations.iter().filter(|o| pred(o.congestion)).count()
        };
        let zero_count = count_where(|v: f64| v == 0.0);
        let high_count = count_where(|v: f64| v >= HIGH_CONGESTION);
        let extreme_count = count_where(|v: f64| v >= EXTREME_CONGESTION);

        let missing_ratio = percent(missing_count, rows + missing_count);
        let zero_ratio = percent(zero_count, rows);
        let extreme_ratio = percent(extreme_count, rows);

        let score = (100.0 - missing_ratio - zero_ratio * 0.5 - extreme_ratio * 2.0).clamp(0.0, 100.0);

        let values: Vec<f64> = observations.iter().map(|o| o.congestion).collect();

        Self {
            total_rows: rows,
            wide_rows: dataset.source().wide_rows,
            lines: distinct_count(observations.iter().map(|o| &o.line)),
            stations: distinct_count(observations.iter().map(|o| &o.station)),
            time_slots: distinct_count(observations.iter().map(|o| o.time_slot)),
            directions: distinct_count(observations.iter().map(|o| &o.direction)),
            missing_count,
            missing_ratio,
            zero_count,
            zero_ratio,
            high_count,
            high_ratio: percent(high_count, rows),
            extreme_count,
            extreme_ratio,
            score,
            status: QualityStatus::from_score(score),
            levels: level_distribution(observations),
            line_stats: line_quality(observations),
            stats: DescriptiveStats::from_values(&values),
        }
    }
}

/// Row count per congestion band, in band order. Empty bands are kept.
pub fn level_distribution(observations: &[Observation]) -> Vec<LevelShare> {
    CongestionLevel::ALL
        .into_iter()
        .map(|level| {
            let count = observations
                .iter()
                .filter(|o| CongestionLevel::classify(o.congestion) == level)
                .count();
            LevelShare {
                level,
                count,
                ratio: percent(count, observations.len()),
            }
        })
        .collect()
}

/// Per-line figures, ordered by line number with unnumbered lines last.
pub fn line_quality(observations: &[Observation]) -> Vec<LineQuality> {
    let mut groups: BTreeMap<&str, (Accumulator, HashSet<&str>, usize)> = BTreeMap::new();
    for obs in observations {
        let (acc, stations, zeros) = groups
            .entry(obs.line.as_str())
            .or_insert_with(|| (Accumulator::new(), HashSet::new(), 0));
        acc.push(obs.congestion);
        stations.insert(obs.station.as_str());
        if obs.congestion == 0.0 {
            *zeros += 1;
        }
    }

    let mut lines: Vec<LineQuality> = groups
        .into_iter()
        .map(|(line, (acc, stations, zeros))| LineQuality {
            line: line.to_string(),
            stations: stations.len(),
            rows: acc.count,
            mean: acc.mean(),
            max: acc.max,
            zero_ratio: percent(zeros, acc.count),
        })
        .collect();
    lines.sort_by(|a, b| compare_lines(&a.line, &b.line));
    lines
}

/// Rows at or above `threshold`, highest first.
pub fn outliers(observations: &[Observation], threshold: f64) -> Vec<Observation> {
    let mut rows: Vec<Observation> = observations
        .iter()
        .filter(|o| o.congestion >= threshold)
        .cloned()
        .collect();
    rows.sort_by(|a, b| b.congestion.total_cmp(&a.congestion));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceInfo;
    use crate::query::tests::obs;

    fn dataset(observations: Vec<Observation>, dropped_cells: usize) -> Dataset {
        Dataset::new(
            observations,
            SourceInfo {
                dropped_cells,
                wide_rows: 3,
                ..SourceInfo::default()
            },
        )
    }

    fn sample() -> Dataset {
        dataset(
            vec![
                obs("1호선", "서울역", "상선", "08:00", 150.0),
                obs("1호선", "서울역", "상선", "08:30", 160.0),
                obs("1호선", "시청", "상선", "08:00", 210.0),
                obs("1호선", "시청", "상선", "08:30", 30.0),
                obs("2호선", "강남", "내선", "05:30", 0.0),
                obs("2호선", "강남", "내선", "06:00", 0.0),
                obs("2호선", "강남", "내선", "06:30", 20.0),
                obs("2호선", "교대", "외선", "05:30", 50.0),
                obs("2호선", "교대", "외선", "06:00", 80.0),
                obs("2호선", "교대", "외선", "06:30", 100.0),
            ],
            0,
        )
    }

    #[test]
    fn test_counts_and_score() {
        let report = QualityReport::build(&sample());

        assert_eq!(report.total_rows, 10);
        assert_eq!(report.wide_rows, 3);
        assert_eq!(report.lines, 2);
        assert_eq!(report.stations, 4);
        assert_eq!(report.directions, 3);
        assert_eq!(report.time_slots, 5);
        assert_eq!(report.zero_count, 2);
        assert_eq!(report.high_count, 3);
        assert_eq!(report.extreme_count, 1);

        // 100 - 0 - 0.5 * 20 - 2 * 10
        assert!((report.score - 70.0).abs() < 1e-9);
        assert_eq!(report.status, QualityStatus::Caution);
    }

    #[test]
    fn test_score_clamped_and_missing_counted() {
        let rows = (0..4)
            .map(|_| obs("1호선", "서울역", "상선", "08:00", 250.0))
            .collect();
        let report = QualityReport::build(&dataset(rows, 1));

        assert_eq!(report.missing_count, 1);
        assert!((report.missing_ratio - 20.0).abs() < 1e-9);
        assert_eq!(report.score, 0.0);
        assert_eq!(report.status, QualityStatus::NeedsReview);
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(QualityStatus::from_score(100.0), QualityStatus::Good);
        assert_eq!(QualityStatus::from_score(90.0), QualityStatus::Good);
        assert_eq!(QualityStatus::from_score(89.9), QualityStatus::Caution);
        assert_eq!(QualityStatus::from_score(70.0), QualityStatus::Caution);
        assert_eq!(QualityStatus::from_score(69.9), QualityStatus::NeedsReview);
    }

    #[test]
    fn test_level_distribution() {
        let report = QualityReport::build(&sample());
        let counts: Vec<usize> = report.levels.iter().map(|l| l.count).collect();
        assert_eq!(counts, vec![4, 1, 2, 3]);
        assert_eq!(report.levels[0].level, CongestionLevel::Relaxed);
        assert!((report.levels[3].ratio - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_quality_ordered_by_number() {
        let report = QualityReport::build(&sample());
        let lines = &report.line_stats;

        assert_eq!(lines[0].line, "1호선");
        assert_eq!(lines[0].stations, 2);
        assert_eq!(lines[0].rows, 4);
        assert_eq!(lines[0].mean, 137.5);
        assert_eq!(lines[0].max, 210.0);
        assert_eq!(lines[0].zero_ratio, 0.0);
        assert_eq!(lines[1].line, "2호선");
        assert!((lines[1].zero_ratio - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_descriptive_stats() {
        let stats = DescriptiveStats::from_values(&[9.0, 2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0]).unwrap();

        assert_eq!(stats.count, 8);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.median, 4.5);
        assert_eq!(stats.q25, 4.0);
        assert_eq!(stats.q75, 5.5);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert!((stats.std - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);

        assert!(DescriptiveStats::from_values(&[]).is_none());
        assert!(DescriptiveStats::from_values(&[3.0]).unwrap().std.is_nan());
    }

    #[test]
    fn test_report_quantiles_interpolate() {
        let stats = QualityReport::build(&sample()).stats.unwrap();
        assert_eq!(stats.median, 65.0);
        assert_eq!(stats.q25, 22.5);
        assert_eq!(stats.q75, 137.5);
    }

    #[test]
    fn test_outliers_sorted_descending() {
        let data = sample();
        let rows = outliers(data.observations(), 150.0);
        let values: Vec<f64> = rows.iter().map(|o| o.congestion).collect();
        assert_eq!(values, vec![210.0, 160.0, 150.0]);
        assert!(outliers(data.observations(), 300.0).is_empty());
    }

    #[test]
    fn test_empty_dataset() {
        let report = QualityReport::build(&dataset(Vec::new(), 0));
        assert_eq!(report.score, 100.0);
        assert_eq!(report.status, QualityStatus::Good);
        assert!(report.stats.is_none());
        assert!(report.line_stats.is_empty());
        assert_eq!(report.levels.len(), 4);
    }
}
