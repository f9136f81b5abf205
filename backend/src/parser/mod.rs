//! Raw CSV loader with Korean-locale encoding fallback.
//!
//! Exports from the transit operator are usually CP949, sometimes UTF-8 with
//! or without a BOM. Encodings are tried in a fixed order and the first strict
//! decode wins; the decoded text is then parsed with the `csv` crate into a
//! string table. No cell is interpreted here.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{CsvError, CsvResult};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Encodings the loader understands, in [`SourceEncoding::FALLBACK_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// Windows code page 949 (Unified Hangul Code).
    Cp949,
    /// Extended Unix Code for Korean.
    EucKr,
    /// UTF-8 with a leading byte-order mark.
    Utf8Sig,
    /// Plain UTF-8.
    Utf8,
}

impl SourceEncoding {
    /// Decode attempts are made in this order.
    pub const FALLBACK_ORDER: [SourceEncoding; 4] = [
        SourceEncoding::Cp949,
        SourceEncoding::EucKr,
        SourceEncoding::Utf8Sig,
        SourceEncoding::Utf8,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SourceEncoding::Cp949 => "cp949",
            SourceEncoding::EucKr => "euc-kr",
            SourceEncoding::Utf8Sig => "utf-8-sig",
            SourceEncoding::Utf8 => "utf-8",
        }
    }

    /// Decode without replacement characters. `None` on any malformed sequence.
    ///
    /// `encoding_rs` implements the WHATWG `euc-kr` decoder, which is the
    /// CP949 superset, so both Korean variants share it.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            SourceEncoding::Cp949 | SourceEncoding::EucKr => encoding_rs::EUC_KR
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(Cow::into_owned),
            SourceEncoding::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(str::to_owned)
            }
            SourceEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
        }
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A decoded CSV file: header names and string cells, nothing interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column headers, as written in the file.
    pub headers: Vec<String>,
    /// Data rows, each exactly `headers.len()` cells long.
    pub rows: Vec<Vec<String>>,
    /// Encoding that decoded the file.
    pub encoding: SourceEncoding,
}

impl RawTable {
    /// Index of the column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Decode `bytes` with the first encoding in the fallback order that succeeds.
pub fn decode_with_fallback(bytes: &[u8]) -> CsvResult<(String, SourceEncoding)> {
    for encoding in SourceEncoding::FALLBACK_ORDER {
        match encoding.decode(bytes) {
            Some(text) => return Ok((text, encoding)),
            None => debug!(encoding = encoding.label(), "decode failed, trying next encoding"),
        }
    }

    Err(CsvError::UnsupportedEncoding {
        tried: SourceEncoding::FALLBACK_ORDER
            .iter()
            .map(|e| e.label())
            .collect(),
    })
}

/// Read and parse a CSV file.
///
/// I/O errors are returned immediately; only decode failures move on to the
/// next encoding.
pub fn load_raw<P: AsRef<Path>>(path: P) -> CsvResult<RawTable> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    info!(path = %path.display(), bytes = bytes.len(), "read CSV file");
    parse_bytes(&bytes)
}

/// Decode and parse CSV bytes.
pub fn parse_bytes(bytes: &[u8]) -> CsvResult<RawTable> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let (content, encoding) = decode_with_fallback(bytes)?;
    info!(encoding = encoding.label(), "decoded CSV content");

    let (headers, rows) = parse_str(&content)?;
    Ok(RawTable {
        headers,
        rows,
        encoding,
    })
}

/// Parse comma-delimited text whose first record is the header.
///
/// Short rows are padded with empty cells, surplus cells are dropped and
/// blank lines are skipped.
pub fn parse_str(content: &str) -> CsvResult<(Vec<String>, Vec<Vec<String>>)> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CsvError::Parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| CsvError::Parse(e.to_string()))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut row: Vec<String> = record.iter().take(headers.len()).map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    debug!(columns = headers.len(), rows = rows.len(), "parsed CSV records");
    Ok((headers, rows))
}
