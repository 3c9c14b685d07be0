//! Reading uploaded sales files into untyped string tables.
//!
//! Delimited text (`.csv`, `.txt`) goes through the `csv` crate with a
//! UTF-8 / Windows-1252 decoding fallback; spreadsheets go through
//! `calamine` and use the first worksheet. Both produce a [`RawTable`] that
//! [`Dataset::from_raw`](crate::Dataset::from_raw) turns into typed rows.

use std::borrow::Cow;
use std::io::{Cursor, Read};
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto, open_workbook_auto_from_rs};
use csv::ByteRecord;
use encoding_rs::WINDOWS_1252;

use crate::error::{Error, Result};

/// Default date formats tried in order when parsing `Order Date`.
pub const DEFAULT_DATE_FORMATS: [&str; 8] = [
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// How raw delimited-text bytes are decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, falling back to Windows-1252 for fields that are not valid UTF-8.
    #[default]
    Auto,
    /// Strict UTF-8.
    Utf8,
    /// Windows-1252 (a superset of ISO-8859-1 for printable characters).
    Windows1252,
}

/// Options controlling how an upload is read.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter for delimited text.
    pub delimiter: u8,
    /// Text decoding for delimited text.
    pub encoding: TextEncoding,
    /// `chrono` format strings tried in order for the order date.
    pub date_formats: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            encoding: TextEncoding::Auto,
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Upload formats recognised by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Delimited,
    Spreadsheet,
}

impl FileFormat {
    /// Detect the format from a file name.
    pub fn from_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(FileFormat::Delimited),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(FileFormat::Spreadsheet),
            _ => Err(Error::UnsupportedFormat { path: name.into() }),
        }
    }
}

/// Header plus string records, before schema resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl RawTable {
    /// Position of a header, ignoring surrounding whitespace.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// Read an upload from disk.
pub fn load_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<RawTable> {
    let path = path.as_ref();
    let format = FileFormat::from_name(&path.to_string_lossy())?;

    let raw = match format {
        FileFormat::Delimited => {
            let file = std::fs::File::open(path)?;
            read_delimited(std::io::BufReader::new(file), options)?
        }
        FileFormat::Spreadsheet => {
            let mut workbook = open_workbook_auto(path)?;
            let range = workbook
                .worksheet_range_at(0)
                .ok_or(Error::EmptyInput)??;
            read_range(&range)?
        }
    };

    tracing::debug!(
        "Read {} records from {}",
        raw.records.len(),
        path.display()
    );
    Ok(raw)
}

/// Read an upload from an in-memory buffer; `name` selects the format.
pub fn load_bytes(name: &str, bytes: &[u8], options: &LoadOptions) -> Result<RawTable> {
    match FileFormat::from_name(name)? {
        FileFormat::Delimited => read_delimited(bytes, options),
        FileFormat::Spreadsheet => {
            let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
            let range = workbook
                .worksheet_range_at(0)
                .ok_or(Error::EmptyInput)??;
            read_range(&range)
        }
    }
}

/// Parse delimited text. The first record is the header.
pub fn read_delimited<R: Read>(reader: R, options: &LoadOptions) -> Result<RawTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut record = ByteRecord::new();
    if !csv_reader.read_byte_record(&mut record)? {
        return Err(Error::EmptyInput);
    }
    let headers = decode_record(&record, 0, options.encoding)?;
    // Strip a UTF-8 byte order mark left on the first header.
    let headers = headers
        .into_iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h
            }
        })
        .collect();

    let mut records = Vec::new();
    let mut row = 0;
    while csv_reader.read_byte_record(&mut record)? {
        row += 1;
        records.push(decode_record(&record, row, options.encoding)?);
    }

    Ok(RawTable { headers, records })
}

fn decode_record(record: &ByteRecord, row: usize, encoding: TextEncoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_field(field, encoding).ok_or(Error::Encoding { row }))
        .collect()
}

fn decode_field(field: &[u8], encoding: TextEncoding) -> Option<String> {
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(field).ok().map(str::to_string),
        TextEncoding::Windows1252 => Some(decode_windows_1252(field).into_owned()),
        TextEncoding::Auto => match std::str::from_utf8(field) {
            Ok(s) => Some(s.to_string()),
            Err(_) => Some(decode_windows_1252(field).into_owned()),
        },
    }
}

fn decode_windows_1252(field: &[u8]) -> Cow<'_, str> {
    let (text, _, _) = WINDOWS_1252.decode(field);
    text
}

fn read_range(range: &calamine::Range<Data>) -> Result<RawTable> {
    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or(Error::EmptyInput)?
        .iter()
        .map(cell_text)
        .collect();
    let records = rows
        .map(|cells| cells.iter().map(cell_text).collect())
        .collect();
    Ok(RawTable { headers, records })
}

/// Spreadsheet cell as text; dates become `%Y-%m-%d %H:%M:%S`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.clone(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| v.as_f64().to_string()),
        Data::DateTimeIso(v) => v.clone(),
        Data::DurationIso(v) => v.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}
