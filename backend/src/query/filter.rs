//! Row filters shared by every page.
//!
//! Each field is optional; an absent or empty field places no constraint.
//! All present constraints must hold at once.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{FilterError, FilterResult};
use crate::models::{Observation, TimeSlot};

/// Inclusive range over the canonical slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: TimeSlot,
    pub end: TimeSlot,
}

impl TimeRange {
    pub fn new(start: TimeSlot, end: TimeSlot) -> Self {
        Self { start, end }
    }

    /// Parse both ends from `HH:MM` labels.
    pub fn from_labels(start: &str, end: &str) -> FilterResult<Self> {
        Ok(Self::new(start.parse()?, end.parse()?))
    }

    /// The whole day, 05:30 through 00:30.
    pub fn full_day() -> Self {
        Self::new(TimeSlot::FIRST, TimeSlot::LAST)
    }

    /// Whether `slot` lies within the range. A reversed range matches nothing.
    pub fn contains(&self, slot: TimeSlot) -> bool {
        self.start <= slot && slot <= self.end
    }
}

/// Filter configuration built from the sidebar selections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterConfig {
    /// Exact day type (`평일`, `토요일`, ...). Empty string means any.
    pub day_type: Option<String>,
    pub lines: BTreeSet<String>,
    pub stations: BTreeSet<String>,
    pub directions: BTreeSet<String>,
    pub time_range: Option<TimeRange>,
    /// Inclusive `(min, max)` in percent.
    pub congestion_range: Option<(f64, f64)>,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day_type(mut self, day_type: impl Into<String>) -> Self {
        self.day_type = Some(day_type.into());
        self
    }

    pub fn lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn stations<I, S>(mut self, stations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stations = stations.into_iter().map(Into::into).collect();
        self
    }

    pub fn directions<I, S>(mut self, directions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directions = directions.into_iter().map(Into::into).collect();
        self
    }

    pub fn time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// Set the slot range from labels.
    pub fn time_range_labels(self, start: &str, end: &str) -> FilterResult<Self> {
        Ok(self.time_range(TimeRange::from_labels(start, end)?))
    }

    /// Set the congestion range. Rejects `min > max` and NaN bounds.
    pub fn congestion_range(mut self, min: f64, max: f64) -> FilterResult<Self> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(FilterError::InvalidCongestionRange { min, max });
        }
        self.congestion_range = Some((min, max));
        Ok(self)
    }

    /// No constraint is set.
    pub fn is_unconstrained(&self) -> bool {
        self.day_type.as_deref().map_or(true, str::is_empty)
            && self.lines.is_empty()
            && self.stations.is_empty()
            && self.directions.is_empty()
            && self.time_range.is_none()
            && self.congestion_range.is_none()
    }

    /// Whether one observation passes every active constraint.
    pub fn matches(&self, obs: &Observation) -> bool {
        if let Some(day_type) = self.day_type.as_deref().filter(|d| !d.is_empty()) {
            if obs.day_type != day_type {
                return false;
            }
        }
        if !self.lines.is_empty() && !self.lines.contains(&obs.line) {
            return false;
        }
        if !self.stations.is_empty() && !self.stations.contains(&obs.station) {
            return false;
        }
        if !self.directions.is_empty() && !self.directions.contains(&obs.direction) {
            return false;
        }
        if let Some(range) = &self.time_range {
            if !range.contains(obs.time_slot) {
                return false;
            }
        }
        if let Some((min, max)) = self.congestion_range {
            if obs.congestion < min || obs.congestion > max {
                return false;
            }
        }
        true
    }

    /// Rows passing the filter, as a new vector. Input order is kept.
    pub fn apply(&self, observations: &[Observation]) -> Vec<Observation> {
        filter_observations(observations, self)
    }
}

/// Rows of `observations` that satisfy `config`.
pub fn filter_observations(observations: &[Observation], config: &FilterConfig) -> Vec<Observation> {
    observations
        .iter()
        .filter(|o| config.matches(o))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tests::obs;

    fn sample() -> Vec<Observation> {
        let mut rows = vec![
            obs("1호선", "서울역", "상선", "05:30", 20.0),
            obs("1호선", "서울역", "상선", "08:00", 120.0),
            obs("1호선", "서울역", "하선", "23:30", 40.0),
            obs("2호선", "강남", "내선", "08:00", 150.0),
            obs("2호선", "강남", "외선", "00:30", 10.0),
            obs("2호선", "교대", "내선", "00:00", 5.0),
        ];
        rows[5].day_type = "토요일".to_string();
        rows
    }

    #[test]
    fn test_empty_config_keeps_everything() {
        let rows = sample();
        let config = FilterConfig::new();

        assert!(config.is_unconstrained());
        assert_eq!(config.apply(&rows), rows);
        assert!(FilterConfig::new().day_type("").is_unconstrained());
    }

    #[test]
    fn test_day_type_and_sets() {
        let rows = sample();

        let weekend = FilterConfig::new().day_type("토요일").apply(&rows);
        assert_eq!(weekend.len(), 1);
        assert_eq!(weekend[0].station, "교대");

        let line2_inner = FilterConfig::new()
            .lines(["2호선"])
            .directions(["내선"])
            .apply(&rows);
        assert_eq!(line2_inner.len(), 2);

        let station = FilterConfig::new().stations(["서울역"]).apply(&rows);
        assert_eq!(station.len(), 3);
    }

    #[test]
    fn test_time_range_uses_canonical_order() {
        let rows = sample();

        // 23:30 .. 00:30 wraps past midnight in string terms only
        let late = FilterConfig::new()
            .time_range_labels("23:30", "00:30")
            .unwrap()
            .apply(&rows);
        let slots: Vec<&str> = late.iter().map(|o| o.time_slot.label()).collect();
        assert_eq!(slots, vec!["23:30", "00:30", "00:00"]);

        let morning = FilterConfig::new()
            .time_range_labels("05:30", "08:00")
            .unwrap()
            .apply(&rows);
        assert_eq!(morning.len(), 3);
    }

    #[test]
    fn test_unknown_time_label_rejected() {
        let result = FilterConfig::new().time_range_labels("04:00", "08:00");
        assert!(matches!(result, Err(FilterError::UnknownTimeSlot(_))));
    }

    #[test]
    fn test_congestion_range_inclusive() {
        let rows = sample();
        let mid = FilterConfig::new()
            .congestion_range(20.0, 120.0)
            .unwrap()
            .apply(&rows);

        let values: Vec<f64> = mid.iter().map(|o| o.congestion).collect();
        assert_eq!(values, vec![20.0, 120.0, 40.0]);

        assert!(FilterConfig::new().congestion_range(10.0, 5.0).is_err());
        assert!(FilterConfig::new().congestion_range(f64::NAN, 5.0).is_err());
    }

    #[test]
    fn test_combined_constraints_can_be_empty() {
        let rows = sample();
        let none = FilterConfig::new()
            .lines(["1호선"])
            .congestion_range(140.0, 200.0)
            .unwrap()
            .apply(&rows);
        assert!(none.is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let rows = sample();
        let config = FilterConfig::new()
            .lines(["1호선", "2호선"])
            .time_range_labels("06:00", "00:30")
            .unwrap();

        let once = config.apply(&rows);
        let twice = config.apply(&once);
        assert_eq!(once, twice);
        assert_eq!(config.apply(&rows), once);
    }

    #[test]
    fn test_reversed_time_range_matches_nothing() {
        let rows = sample();
        let range = TimeRange::from_labels("00:30", "05:30").unwrap();
        assert!(FilterConfig::new().time_range(range).apply(&rows).is_empty());
        assert!(TimeRange::full_day().contains(TimeSlot::LAST));
    }
}
