//! CSV downloads.
//!
//! Every export is UTF-8 with a leading BOM so spreadsheet tools pick the
//! right encoding for Korean text. Header labels and column order are written
//! exactly as given.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::error::ExportResult;
use crate::models::{Column, Observation};

/// UTF-8 byte order mark.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Columns of a display export, in order.
const DISPLAY_COLUMNS: [Column; 5] = [
    Column::Line,
    Column::Station,
    Column::Direction,
    Column::TimeSlot,
    Column::Congestion,
];

/// Which columns and labels [`Table::from_observations`] produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ObservationLayout {
    /// Every long-form column under its internal name.
    #[default]
    Internal,
    /// `호선, 역명, 방향, 시간대, 혼잡도(%)`, congestion rounded to one decimal.
    Display,
}

/// A header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn from_observations(observations: &[Observation], layout: ObservationLayout) -> Self {
        match layout {
            ObservationLayout::Internal => Self::new(
                Column::ALL.iter().map(|c| c.name().to_string()).collect(),
                observations
                    .iter()
                    .map(|o| {
                        Column::ALL
                            .iter()
                            .map(|c| o.value(*c).unwrap_or_default())
                            .collect()
                    })
                    .collect(),
            ),
            ObservationLayout::Display => Self::new(
                DISPLAY_COLUMNS
                    .iter()
                    .map(|c| c.display_label().to_string())
                    .collect(),
                observations
                    .iter()
                    .map(|o| {
                        vec![
                            o.line.clone(),
                            o.station.clone(),
                            o.direction.clone(),
                            o.time_slot.label().to_string(),
                            round1(o.congestion).to_string(),
                        ]
                    })
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize to CSV bytes, BOM first.
    pub fn to_csv_bytes(&self) -> ExportResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Write the CSV to `path`, replacing any existing file.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> ExportResult<()> {
        let path = path.as_ref();
        let mut file = BufWriter::new(File::create(path)?);
        self.write_to(&mut file)?;
        file.flush()?;
        debug!(path = %path.display(), rows = self.rows.len(), "CSV written");
        Ok(())
    }

    fn write_to<W: Write>(&self, mut out: W) -> ExportResult<()> {
        out.write_all(UTF8_BOM)?;
        let mut writer = WriterBuilder::new().flexible(true).from_writer(out);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Round to one decimal place for display.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
