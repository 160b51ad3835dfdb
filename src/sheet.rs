//! Spreadsheet ingestion and export.
//!
//! Workbooks (`.xlsx`, `.xlsm`, `.xls`, `.xlsb`, `.ods`) are read with
//! `calamine`, delimited text with `csv`. Only the first worksheet is used.
//! Cells keep their type (number, boolean, date, text) so the exported
//! single-sheet `.xlsx` carries the input table through unchanged.

use crate::util::snippet;
use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, DataType, Reader};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const OUTPUT_FILE_NAME: &str = "hasil_kategorisasi_feedback.xlsx";
pub const OUTPUT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const OUTPUT_SHEET_NAME: &str = "Sheet1";

/// Longest text an `.xlsx` cell can hold, in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATE_TIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("the workbook does not contain any worksheets")]
    NoWorksheet,
    #[error("the worksheet is empty")]
    EmptyWorksheet,
    #[error("column '{column}' not found (available: {})", available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
    #[error("expected {expected} results but got {actual}")]
    ResultCountMismatch { expected: usize, actual: usize },
}

/// A single typed cell value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date (days since 1899-12-30, fraction is time of day).
    DateTime(f64),
}

impl Cell {
    /// Text cell, or `Empty` for an empty string.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// The cell rendered as text; borrowed for text cells.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Empty => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Number(value) | Self::DateTime(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&DataType> for Cell {
    fn from(value: &DataType) -> Self {
        match value {
            DataType::Empty => Self::Empty,
            DataType::String(text) => Self::text(text.as_str()),
            DataType::Int(value) => Self::Number(*value as f64),
            DataType::Float(value) => Self::Number(*value),
            DataType::Bool(value) => Self::Bool(*value),
            DataType::DateTime(serial) => Self::DateTime(*serial),
            other => Self::text(other.to_string()),
        }
    }
}

/// An in-memory table: one header row plus data rows of equal width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(mut headers: Vec<String>, mut rows: Vec<Vec<Cell>>) -> Self {
        align_row_lengths(&mut headers, &mut rows);
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Exact, case-sensitive header lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, SheetError> {
        self.column_index(name)
            .ok_or_else(|| SheetError::MissingColumn {
                column: name.to_string(),
                available: self
                    .headers
                    .iter()
                    .filter(|header| !header.is_empty())
                    .cloned()
                    .collect(),
            })
    }

    /// Text view of one column.
    pub fn column_values(&self, index: usize) -> Vec<Cow<'_, str>> {
        self.rows
            .iter()
            .map(|row| row.get(index).map_or(Cow::Borrowed(""), Cell::as_text))
            .collect()
    }

    /// Set a text column by name, replacing it if present and appending otherwise.
    pub fn with_column(mut self, name: &str, values: Vec<String>) -> Result<Self, SheetError> {
        if values.len() != self.rows.len() {
            return Err(SheetError::ResultCountMismatch {
                expected: self.rows.len(),
                actual: values.len(),
            });
        }
        match self.column_index(name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = Cell::text(value);
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(Cell::text(value));
                }
            }
        }
        Ok(self)
    }
}

pub fn read_table(path: &Path) -> Result<Table> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    if matches!(
        extension.as_str(),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "xla" | "xlam" | "ods"
    ) {
        read_workbook(path)
    } else {
        read_delimited(path)
    }
}

fn read_workbook(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|err| anyhow!("open spreadsheet {}: {err}", path.display()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(SheetError::NoWorksheet)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .ok_or(SheetError::NoWorksheet)?
        .map_err(|err| anyhow!("read worksheet '{sheet_name}': {err}"))?;

    let mut rows_iter = range.rows();
    let header_row = rows_iter.next().ok_or(SheetError::EmptyWorksheet)?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| Cell::from(cell).to_string())
        .collect();

    let mut rows: Vec<Vec<Cell>> = rows_iter
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();
    drop_trailing_blank_rows(&mut rows);

    Ok(Table::new(headers, rows))
}

fn read_delimited(path: &Path) -> Result<Table> {
    let delimiter = detect_delimiter(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_path(path)
        .with_context(|| format!("open spreadsheet {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("read spreadsheet headers")?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|header| header.trim().is_empty()) {
        return Err(SheetError::EmptyWorksheet.into());
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read spreadsheet row {}", index + 2))?;
        rows.push(record.iter().map(Cell::text).collect());
    }
    drop_trailing_blank_rows(&mut rows);

    Ok(Table::new(headers, rows))
}

fn detect_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path).with_context(|| format!("open spreadsheet {}", path.display()))?;
    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .with_context(|| format!("read {}", path.display()))?;

    let candidates = [b',', b';', b'\t', b'|'];
    let best = candidates
        .iter()
        .copied()
        .max_by_key(|candidate| first_line.bytes().filter(|byte| byte == candidate).count())
        .unwrap_or(b',');
    if first_line.bytes().any(|byte| byte == best) {
        Ok(best)
    } else {
        Ok(b',')
    }
}

fn drop_trailing_blank_rows(rows: &mut Vec<Vec<Cell>>) {
    while rows
        .last()
        .is_some_and(|row| row.iter().all(Cell::is_empty))
    {
        rows.pop();
    }
}

fn align_row_lengths(headers: &mut Vec<String>, rows: &mut [Vec<Cell>]) {
    let column_count = rows
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(headers.len());

    headers.resize(column_count, String::new());
    for row in rows.iter_mut() {
        row.resize(column_count, Cell::Empty);
    }
}

/// Serialize a table to `.xlsx` bytes with a bold header row.
///
/// Text longer than [`MAX_CELL_CHARS`] is cut to fit, with a warning naming
/// the cell.
pub fn workbook_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(OUTPUT_SHEET_NAME)
        .context("configure output worksheet")?;

    let header_format = Format::new().set_bold();
    for (col, header) in table.headers.iter().enumerate() {
        let header = fit_cell_text(header, 1, header);
        sheet
            .write_string_with_format(0, column_number(col)?, header.as_ref(), &header_format)
            .context("write header row")?;
    }

    let formats = CellFormats {
        date: Format::new().set_num_format(DATE_FORMAT),
        date_time: Format::new().set_num_format(DATE_TIME_FORMAT),
    };
    for (row_index, row) in table.rows.iter().enumerate() {
        let row_number = u32::try_from(row_index + 1).context("too many rows for xlsx")?;
        for (col, cell) in row.iter().enumerate() {
            let column = table.headers.get(col).map_or("", String::as_str);
            write_cell(sheet, &formats, (row_number, column_number(col)?), cell, column)
                .with_context(|| format!("write row {}", row_index + 2))?;
        }
    }

    workbook.save_to_buffer().context("serialize output workbook")
}

struct CellFormats {
    date: Format,
    date_time: Format,
}

fn write_cell(
    sheet: &mut Worksheet,
    formats: &CellFormats,
    (row, col): (u32, u16),
    cell: &Cell,
    column: &str,
) -> Result<()> {
    match cell {
        Cell::Empty => return Ok(()),
        Cell::Text(text) if text.is_empty() => return Ok(()),
        Cell::Text(text) => {
            let text = fit_cell_text(text, row as usize + 1, column);
            sheet.write_string(row, col, text.as_ref())?;
        }
        Cell::Number(value) => {
            sheet.write_number(row, col, *value)?;
        }
        Cell::Bool(value) => {
            sheet.write_boolean(row, col, *value)?;
        }
        Cell::DateTime(serial) => {
            let format = if serial.fract() == 0.0 {
                &formats.date
            } else {
                &formats.date_time
            };
            sheet.write_number_with_format(row, col, *serial, format)?;
        }
    }
    Ok(())
}

/// Cut text to the xlsx cell limit. `row` is the spreadsheet row number.
fn fit_cell_text<'a>(text: &'a str, row: usize, column: &str) -> Cow<'a, str> {
    if text.len() <= MAX_CELL_CHARS {
        return Cow::Borrowed(text);
    }
    let chars = text.chars().count();
    if chars <= MAX_CELL_CHARS {
        return Cow::Borrowed(text);
    }
    tracing::warn!(
        row,
        column,
        chars,
        kept = MAX_CELL_CHARS,
        "cell text exceeds the xlsx limit; truncating"
    );
    Cow::Owned(snippet(text, MAX_CELL_CHARS))
}

fn column_number(index: usize) -> Result<u16> {
    u16::try_from(index).context("too many columns for xlsx")
}
