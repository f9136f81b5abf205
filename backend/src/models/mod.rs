//! Domain models for the long-form congestion table.
//!
//! - [`TimeSlot`]: one of the 39 half-hour labels, ordered 05:30 → 00:30
//! - [`Observation`]: one (line, station, direction, time slot) measurement
//! - [`Dataset`]: the immutable reshaped table plus load metadata
//! - [`Column`]: names of the long-form columns
//! - [`CongestionLevel`]: the four crowding bands

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::FilterError;

// =============================================================================
// TimeSlot
// =============================================================================

/// The canonical time-slot domain, in order. The day wraps past midnight, so
/// `00:00` and `00:30` are the last two slots, not the first.
pub const TIME_ORDER: [&str; 39] = [
    "05:30", "06:00", "06:30", "07:00", "07:30", "08:00", "08:30", "09:00", "09:30",
    "10:00", "10:30", "11:00", "11:30", "12:00", "12:30", "13:00", "13:30", "14:00",
    "14:30", "15:00", "15:30", "16:00", "16:30", "17:00", "17:30", "18:00", "18:30",
    "19:00", "19:30", "20:00", "20:30", "21:00", "21:30", "22:00", "22:30", "23:00",
    "23:30", "00:00", "00:30",
];

/// A canonical time slot, stored as its rank in [`TIME_ORDER`].
///
/// `Ord` follows the rank, so sorting a `Vec<TimeSlot>` gives dashboard order:
///
/// ```
/// use congestion::TimeSlot;
///
/// let late: TimeSlot = "00:30".parse().unwrap();
/// let evening: TimeSlot = "23:30".parse().unwrap();
/// assert!(late > evening);
/// assert_eq!(TimeSlot::FIRST.label(), "05:30");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeSlot(u8);

impl TimeSlot {
    /// Number of slots in the domain.
    pub const COUNT: usize = TIME_ORDER.len();

    /// `05:30`, the minimum.
    pub const FIRST: TimeSlot = TimeSlot(0);

    /// `00:30`, the maximum.
    pub const LAST: TimeSlot = TimeSlot((TIME_ORDER.len() - 1) as u8);

    /// Look up a canonical `HH:MM` label.
    pub fn from_label(label: &str) -> Option<Self> {
        TIME_ORDER
            .iter()
            .position(|l| *l == label)
            .map(|rank| TimeSlot(rank as u8))
    }

    /// Slot at `rank` (0-based position in [`TIME_ORDER`]).
    pub fn from_rank(rank: usize) -> Option<Self> {
        (rank < Self::COUNT).then_some(TimeSlot(rank as u8))
    }

    /// Position in [`TIME_ORDER`].
    pub fn rank(self) -> usize {
        self.0 as usize
    }

    /// The `HH:MM` label.
    pub fn label(self) -> &'static str {
        TIME_ORDER[self.rank()]
    }

    /// All slots in canonical order.
    pub fn all() -> impl DoubleEndedIterator<Item = TimeSlot> + ExactSizeIterator {
        (0..Self::COUNT as u8).map(TimeSlot)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeSlot {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s.trim()).ok_or_else(|| FilterError::UnknownTimeSlot(s.to_string()))
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Compare two labels by canonical position.
///
/// Returns `None` if either label is outside the domain.
pub fn compare_time_labels(a: &str, b: &str) -> Option<Ordering> {
    Some(TimeSlot::from_label(a)?.cmp(&TimeSlot::from_label(b)?))
}

// =============================================================================
// Observation
// =============================================================================

/// One row of the long-form table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub day_type: String,
    pub line: String,
    pub station_id: Option<i64>,
    pub station: String,
    pub direction: String,
    pub time_slot: TimeSlot,
    /// Passengers over rated capacity, in percent. Always finite and >= 0.
    pub congestion: f64,
}

impl Observation {
    /// Text value of `column`, `None` for a missing station id.
    pub fn value(&self, column: Column) -> Option<String> {
        match column {
            Column::DayType => Some(self.day_type.clone()),
            Column::Line => Some(self.line.clone()),
            Column::StationId => self.station_id.map(|id| id.to_string()),
            Column::Station => Some(self.station.clone()),
            Column::Direction => Some(self.direction.clone()),
            Column::TimeSlot => Some(self.time_slot.label().to_string()),
            Column::Congestion => Some(self.congestion.to_string()),
        }
    }

    /// Sort key used for the reshaped table.
    pub(crate) fn sort_key(&self) -> (&str, &str, &str, TimeSlot) {
        (&self.line, &self.station, &self.direction, self.time_slot)
    }
}

// =============================================================================
// Column
// =============================================================================

/// Columns of the long-form schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    DayType,
    Line,
    StationId,
    Station,
    Direction,
    TimeSlot,
    Congestion,
}

impl Column {
    /// All columns in schema order.
    pub const ALL: [Column; 7] = [
        Column::DayType,
        Column::Line,
        Column::StationId,
        Column::Station,
        Column::Direction,
        Column::TimeSlot,
        Column::Congestion,
    ];

    /// Internal (English) column name.
    pub fn name(self) -> &'static str {
        match self {
            Column::DayType => "day_type",
            Column::Line => "line",
            Column::StationId => "station_id",
            Column::Station => "station",
            Column::Direction => "direction",
            Column::TimeSlot => "time_slot",
            Column::Congestion => "congestion",
        }
    }

    /// Header label shown to users and written to display exports.
    pub fn display_label(self) -> &'static str {
        match self {
            Column::DayType => "요일구분",
            Column::Line => "호선",
            Column::StationId => "역번호",
            Column::Station => "역명",
            Column::Direction => "방향",
            Column::TimeSlot => "시간대",
            Column::Congestion => "혼잡도(%)",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Column::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| FilterError::UnknownColumn(s.to_string()))
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Metadata about how a [`Dataset`] was produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceInfo {
    /// File the data came from, if loaded from disk.
    pub path: Option<PathBuf>,
    /// Encoding label that decoded the file.
    pub encoding: String,
    /// Rows in the wide table.
    pub wide_rows: usize,
    /// Time-slot columns melted into the long table.
    pub time_columns: usize,
    /// Cells dropped because the value was missing or not a number.
    pub dropped_cells: usize,
    /// Time-like headers skipped because they are outside the slot domain.
    pub skipped_headers: Vec<String>,
}

/// The reshaped, sorted, immutable long-form table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    observations: Vec<Observation>,
    source: SourceInfo,
}

impl Dataset {
    pub fn new(observations: Vec<Observation>, source: SourceInfo) -> Self {
        Self { observations, source }
    }

    /// All observations, sorted by (line, station, direction, time slot).
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

// =============================================================================
// CongestionLevel
// =============================================================================

/// Crowding bands. Upper bounds are inclusive: 30.0 is still `Relaxed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CongestionLevel {
    Relaxed,
    Normal,
    Crowded,
    Severe,
}

impl CongestionLevel {
    pub const ALL: [CongestionLevel; 4] = [
        CongestionLevel::Relaxed,
        CongestionLevel::Normal,
        CongestionLevel::Crowded,
        CongestionLevel::Severe,
    ];

    pub fn classify(congestion: f64) -> Self {
        if congestion <= 30.0 {
            CongestionLevel::Relaxed
        } else if congestion <= 70.0 {
            CongestionLevel::Normal
        } else if congestion <= 130.0 {
            CongestionLevel::Crowded
        } else {
            CongestionLevel::Severe
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CongestionLevel::Relaxed => "여유(0-30%)",
            CongestionLevel::Normal => "보통(30-70%)",
            CongestionLevel::Crowded => "혼잡(70-130%)",
            CongestionLevel::Severe => "매우혼잡(130%+)",
        }
    }

    /// Chart colour for the band.
    pub fn color(self) -> &'static str {
        match self {
            CongestionLevel::Relaxed => "#4CAF50",
            CongestionLevel::Normal => "#FFC107",
            CongestionLevel::Crowded => "#FF9800",
            CongestionLevel::Severe => "#F44336",
        }
    }
}

impl fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
