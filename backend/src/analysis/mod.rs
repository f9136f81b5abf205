//! Aggregations behind the dashboard pages.
//!
//! Every function takes an already-filtered slice and returns plain values;
//! empty input gives `None` or an empty vector, never an error.
//!
//! - [`summarize`], [`time_slot_stats`], [`peak_time_slot`]: overview page
//! - [`mean_by`], [`top_at_time`], [`station_stats`]: per-line page
//! - [`compare_stations`]: comparison page
//! - [`heatmap`]: station × time-slot pivot
//! - [`quality`]: data-quality report

pub mod heatmap;
pub mod quality;

pub use heatmap::{Heatmap, HeatmapRowStats, HeatmapSort};
pub use quality::{
    level_distribution, line_quality, outliers, DescriptiveStats, LevelShare, LineQuality,
    QualityReport, QualityStatus,
};

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::Serialize;

use crate::error::FilterError;
use crate::models::{Column, Observation, TimeSlot};

/// Running count / sum / extremes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Accumulator {
    pub count: usize,
    pub sum: f64,
    pub max: f64,
    pub min: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            max: f64::NEG_INFINITY,
            min: f64::INFINITY,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.max = self.max.max(value);
        self.min = self.min.min(value);
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }
}

pub(crate) fn distinct_count<T: Eq + Hash>(values: impl Iterator<Item = T>) -> usize {
    values.collect::<HashSet<T>>().len()
}

/// Headline numbers for a filtered selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub mean: f64,
    /// Row with the highest congestion (first one on ties).
    pub max: Observation,
    /// Slot with the highest mean congestion.
    pub peak_time_slot: TimeSlot,
    pub peak_time_mean: f64,
    pub lines: usize,
    pub stations: usize,
    pub directions: usize,
    pub time_slots: usize,
}

/// Per-slot statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSlotStats {
    pub time_slot: TimeSlot,
    pub count: usize,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

/// Mean congestion of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    pub key: String,
    pub count: usize,
    pub mean: f64,
}

/// Per (line, station, direction) statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStats {
    pub line: String,
    pub station: String,
    pub direction: String,
    pub max: f64,
    pub mean: f64,
    /// Slot of the maximum (first one on ties).
    pub peak_time_slot: TimeSlot,
}

/// A station on a specific line, shown as `"강남 (2호선)"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StationRef {
    pub line: String,
    pub station: String,
}

impl StationRef {
    pub fn new(line: impl Into<String>, station: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            station: station.into(),
        }
    }
}

impl fmt::Display for StationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.station, self.line)
    }
}

impl FromStr for StationRef {
    type Err = FilterError;

    /// Parse the `"station (line)"` display form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FilterError::InvalidStationRef(s.to_string());
        let (station, rest) = s.trim().split_once(" (").ok_or_else(invalid)?;
        let line = rest.strip_suffix(')').ok_or_else(invalid)?;
        if station.is_empty() || line.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(line, station))
    }
}

/// One compared station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationProfile {
    pub station: StationRef,
    pub label: String,
    pub rows: usize,
    pub mean: f64,
    pub max: f64,
    /// Slot with the highest mean.
    pub peak_time_slot: TimeSlot,
    /// Mean per slot, canonical order.
    pub by_time_slot: Vec<(TimeSlot, f64)>,
}

/// Overview numbers. `None` for an empty selection.
pub fn summarize(observations: &[Observation]) -> Option<Summary> {
    let first = observations.first()?;

    let mut acc = Accumulator::new();
    let mut max = first;
    for obs in observations {
        acc.push(obs.congestion);
        if obs.congestion > max.congestion {
            max = obs;
        }
    }
    let (peak_time_slot, peak_time_mean) = peak_time_slot(observations)?;

    Some(Summary {
        rows: acc.count,
        mean: acc.mean(),
        max: max.clone(),
        peak_time_slot,
        peak_time_mean,
        lines: distinct_count(observations.iter().map(|o| &o.line)),
        stations: distinct_count(observations.iter().map(|o| &o.station)),
        directions: distinct_count(observations.iter().map(|o| &o.direction)),
        time_slots: distinct_count(observations.iter().map(|o| o.time_slot)),
    })
}

/// Count, mean, max and min per slot, in canonical order. Slots without
/// rows are omitted.
pub fn time_slot_stats(observations: &[Observation]) -> Vec<TimeSlotStats> {
    let mut slots: BTreeMap<TimeSlot, Accumulator> = BTreeMap::new();
    for obs in observations {
        slots
            .entry(obs.time_slot)
            .or_insert_with(Accumulator::new)
            .push(obs.congestion);
    }

    slots
        .into_iter()
        .map(|(time_slot, acc)| TimeSlotStats {
            time_slot,
            count: acc.count,
            mean: acc.mean(),
            max: acc.max,
            min: acc.min,
        })
        .collect()
}

/// Slot with the highest mean congestion; the earliest slot wins ties.
pub fn peak_time_slot(observations: &[Observation]) -> Option<(TimeSlot, f64)> {
    time_slot_stats(observations)
        .into_iter()
        .fold(None, |best: Option<(TimeSlot, f64)>, stats| match best {
            Some((_, mean)) if mean >= stats.mean => best,
            _ => Some((stats.time_slot, stats.mean)),
        })
}

/// Mean congestion grouped by `column`, highest first.
///
/// Rows with no value for `column` (a missing station id) are skipped.
pub fn mean_by(observations: &[Observation], column: Column) -> Vec<GroupMean> {
    let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();
    for obs in observations {
        if let Some(key) = obs.value(column) {
            groups
                .entry(key)
                .or_insert_with(Accumulator::new)
                .push(obs.congestion);
        }
    }

    let mut means: Vec<GroupMean> = groups
        .into_iter()
        .map(|(key, acc)| GroupMean {
            key,
            count: acc.count,
            mean: acc.mean(),
        })
        .collect();
    means.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    means
}

/// The `n` most congested rows at `time_slot`, highest first.
pub fn top_at_time(observations: &[Observation], time_slot: TimeSlot, n: usize) -> Vec<Observation> {
    let mut rows: Vec<&Observation> = observations
        .iter()
        .filter(|o| o.time_slot == time_slot)
        .collect();
    rows.sort_by(|a, b| b.congestion.total_cmp(&a.congestion));
    rows.into_iter().take(n).cloned().collect()
}

/// Statistics per (line, station, direction), highest maximum first.
pub fn station_stats(observations: &[Observation]) -> Vec<StationStats> {
    let mut groups: BTreeMap<(&str, &str, &str), (Accumulator, TimeSlot)> = BTreeMap::new();
    for obs in observations {
        let key = (obs.line.as_str(), obs.station.as_str(), obs.direction.as_str());
        let (acc, peak) = groups
            .entry(key)
            .or_insert_with(|| (Accumulator::new(), obs.time_slot));
        if obs.congestion > acc.max {
            *peak = obs.time_slot;
        }
        acc.push(obs.congestion);
    }

    let mut stats: Vec<StationStats> = groups
        .into_iter()
        .map(|((line, station, direction), (acc, peak))| StationStats {
            line: line.to_string(),
            station: station.to_string(),
            direction: direction.to_string(),
            max: acc.max,
            mean: acc.mean(),
            peak_time_slot: peak,
        })
        .collect();
    stats.sort_by(|a, b| b.max.total_cmp(&a.max));
    stats
}

/// Distinct (line, station) pairs, sorted by display label.
pub fn station_options(observations: &[Observation]) -> Vec<StationRef> {
    let refs: BTreeSet<StationRef> = observations
        .iter()
        .map(|o| StationRef::new(o.line.as_str(), o.station.as_str()))
        .collect();
    let mut refs: Vec<StationRef> = refs.into_iter().collect();
    refs.sort_by_key(|r| r.to_string());
    refs
}

/// Side-by-side profiles of the selected stations, in selection order.
/// Selections with no rows are omitted.
pub fn compare_stations(observations: &[Observation], selection: &[StationRef]) -> Vec<StationProfile> {
    selection
        .iter()
        .filter_map(|target| {
            let rows: Vec<Observation> = observations
                .iter()
                .filter(|o| o.line == target.line && o.station == target.station)
                .cloned()
                .collect();

            let mut acc = Accumulator::new();
            rows.iter().for_each(|o| acc.push(o.congestion));
            let (peak_time_slot, _) = peak_time_slot(&rows)?;

            Some(StationProfile {
                station: target.clone(),
                label: target.to_string(),
                rows: acc.count,
                mean: acc.mean(),
                max: acc.max,
                peak_time_slot,
                by_time_slot: time_slot_stats(&rows)
                    .into_iter()
                    .map(|s| (s.time_slot, s.mean))
                    .collect(),
            })
        })
        .collect()
}
