//! Station × time-slot pivot of mean congestion.
//!
//! Rows are station names (all lines and directions in the selection pooled),
//! columns are the slots present in the selection in canonical order. A cell
//! is `None` when the station has no row at that slot.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::analysis::Accumulator;
use crate::error::FilterError;
use crate::export::Table;
use crate::models::{Observation, TimeSlot};

/// Row ordering for [`Heatmap::build`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum HeatmapSort {
    /// Station name, ascending.
    #[default]
    Name,
    /// Row maximum, descending.
    Max,
    /// Row mean, descending.
    Mean,
    /// Value at one slot, descending. Stations without a value go last.
    AtTime(TimeSlot),
}

impl fmt::Display for HeatmapSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeatmapSort::Name => f.write_str("name"),
            HeatmapSort::Max => f.write_str("max"),
            HeatmapSort::Mean => f.write_str("mean"),
            HeatmapSort::AtTime(slot) => write!(f, "{slot}"),
        }
    }
}

impl FromStr for HeatmapSort {
    type Err = FilterError;

    /// `name`, `max`, `mean`, or an `HH:MM` slot label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "name" => Ok(HeatmapSort::Name),
            "max" => Ok(HeatmapSort::Max),
            "mean" => Ok(HeatmapSort::Mean),
            other => other.parse().map(HeatmapSort::AtTime),
        }
    }
}

/// Summary of one heatmap row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRowStats {
    pub station: String,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    /// Slot holding the row maximum (earliest on ties).
    pub peak_time_slot: TimeSlot,
}

/// Pivot table of means.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub stations: Vec<String>,
    pub time_slots: Vec<TimeSlot>,
    /// `cells[row][col]`, aligned with `stations` and `time_slots`.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl Heatmap {
    pub fn build(observations: &[Observation], sort: HeatmapSort) -> Self {
        let time_slots: Vec<TimeSlot> = observations
            .iter()
            .map(|o| o.time_slot)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut groups: BTreeMap<&str, BTreeMap<TimeSlot, Accumulator>> = BTreeMap::new();
        for obs in observations {
            groups
                .entry(obs.station.as_str())
                .or_default()
                .entry(obs.time_slot)
                .or_insert_with(Accumulator::new)
                .push(obs.congestion);
        }

        let mut rows: Vec<(String, Vec<Option<f64>>)> = groups
            .into_iter()
            .map(|(station, slots)| {
                let cells = time_slots
                    .iter()
                    .map(|slot| slots.get(slot).map(Accumulator::mean))
                    .collect();
                (station.to_string(), cells)
            })
            .collect();

        let key = |cells: &[Option<f64>]| -> Option<f64> {
            match sort {
                HeatmapSort::Name => None,
                HeatmapSort::Max => row_accumulator(cells).map(|acc| acc.max),
                HeatmapSort::Mean => row_accumulator(cells).map(|acc| acc.mean()),
                HeatmapSort::AtTime(slot) => time_slots
                    .iter()
                    .position(|s| *s == slot)
                    .and_then(|col| cells[col]),
            }
        };
        if sort != HeatmapSort::Name {
            // Stable: equal keys keep name order.
            rows.sort_by(|a, b| match (key(&a.1), key(&b.1)) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
        }

        let (stations, cells): (Vec<String>, Vec<Vec<Option<f64>>>) = rows.into_iter().unzip();
        Self {
            stations,
            time_slots,
            cells,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Highest cell as `(station, slot, value)`. The first in row-major order
    /// wins ties.
    pub fn max_cell(&self) -> Option<(&str, TimeSlot, f64)> {
        self.find_cell(|_| true, |candidate, best| candidate > best)
    }

    /// Lowest cell above zero as `(station, slot, value)`.
    pub fn min_positive_cell(&self) -> Option<(&str, TimeSlot, f64)> {
        self.find_cell(|v| v > 0.0, |candidate, best| candidate < best)
    }

    /// Mean of each column over the stations that have a value there.
    pub fn column_means(&self) -> Vec<(TimeSlot, f64)> {
        self.time_slots
            .iter()
            .enumerate()
            .filter_map(|(col, slot)| {
                let mut acc = Accumulator::new();
                self.cells.iter().filter_map(|row| row[col]).for_each(|v| acc.push(v));
                (acc.count > 0).then(|| (*slot, acc.mean()))
            })
            .collect()
    }

    /// Mean, max, min and peak slot of each row, in row order.
    pub fn row_stats(&self) -> Vec<HeatmapRowStats> {
        self.stations
            .iter()
            .zip(&self.cells)
            .filter_map(|(station, cells)| {
                let acc = row_accumulator(cells)?;
                let peak = cells
                    .iter()
                    .position(|v| *v == Some(acc.max))
                    .map(|col| self.time_slots[col])?;
                Some(HeatmapRowStats {
                    station: station.clone(),
                    mean: acc.mean(),
                    max: acc.max,
                    min: acc.min,
                    peak_time_slot: peak,
                })
            })
            .collect()
    }

    /// Wide table: `역명` then one column per slot, values to one decimal.
    pub fn to_table(&self) -> Table {
        let mut headers = vec!["역명".to_string()];
        headers.extend(self.time_slots.iter().map(|s| s.label().to_string()));

        let rows = self
            .stations
            .iter()
            .zip(&self.cells)
            .map(|(station, cells)| {
                let mut row = vec![station.clone()];
                row.extend(cells.iter().map(|v| match v {
                    Some(v) => format!("{v:.1}"),
                    None => String::new(),
                }));
                row
            })
            .collect();

        Table::new(headers, rows)
    }

    fn find_cell(
        &self,
        eligible: impl Fn(f64) -> bool,
        better: impl Fn(f64, f64) -> bool,
    ) -> Option<(&str, TimeSlot, f64)> {
        let mut best: Option<(&str, TimeSlot, f64)> = None;
        for (station, cells) in self.stations.iter().zip(&self.cells) {
            for (slot, value) in self.time_slots.iter().zip(cells) {
                let Some(value) = *value else { continue };
                if !eligible(value) {
                    continue;
                }
                if best.map_or(true, |(_, _, b)| better(value, b)) {
                    best = Some((station.as_str(), *slot, value));
                }
            }
        }
        best
    }
}

fn row_accumulator(cells: &[Option<f64>]) -> Option<Accumulator> {
    let mut acc = Accumulator::new();
    cells.iter().flatten().for_each(|v| acc.push(*v));
    (acc.count > 0).then_some(acc)
}
