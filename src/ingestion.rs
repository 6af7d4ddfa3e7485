use std::io::Read;

use csv::ReaderBuilder;
use log::info;

use crate::error::{Result, SalesAnalyticsError};
use crate::schema::RawTable;

/// Declared format of an uploaded byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableFormat {
    DelimitedText,
    /// Spreadsheet input requires a named sheet; loaders must fail with
    /// [`SalesAnalyticsError::MissingSheet`] when it is absent.
    Spreadsheet { sheet: String },
}

/// Boundary to the external table-loading collaborator. Implementations turn
/// a byte stream into a [`RawTable`] of untyped cells or fail the whole load.
pub trait TableSource {
    fn load(&mut self, format: &TableFormat) -> Result<RawTable>;
}

/// Reference loader for row-delimited text built on the `csv` crate.
/// Spreadsheet formats are out of its reach and report the sheet as missing.
pub struct DelimitedTextSource<R: Read> {
    reader: Option<R>,
}

impl<R: Read> DelimitedTextSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
        }
    }
}

impl<R: Read> TableSource for DelimitedTextSource<R> {
    fn load(&mut self, format: &TableFormat) -> Result<RawTable> {
        match format {
            TableFormat::DelimitedText => {
                let reader = self.reader.take().ok_or(SalesAnalyticsError::EmptyTable)?;
                read_delimited(reader)
            }
            TableFormat::Spreadsheet { sheet } => Err(SalesAnalyticsError::MissingSheet {
                sheet: sheet.clone(),
            }),
        }
    }
}

/// Reads delimited text into a raw table. Rows may be ragged; cells are kept
/// untyped and blank cells become missing. A missing or all-blank header row
/// fails the load, a header-only stream is a valid empty table.
pub fn read_delimited<R: Read>(reader: R) -> Result<RawTable> {
    let mut csv_reader = ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(SalesAnalyticsError::EmptyTable);
    }

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|cell| Some(cell.to_string()))
                .collect::<Vec<Option<String>>>(),
        );
    }

    info!(
        "Loaded table with {} column(s) and {} row(s)",
        headers.len(),
        rows.len()
    );

    Ok(RawTable::new(headers, rows))
}
