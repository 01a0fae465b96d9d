use super::types::Dataset;
use crate::error::{PrepError, Result, ResultExt as _};
use polars::prelude::*;
use std::io::Cursor;

/// Parse CSV bytes (header row required) into a typed dataset.
///
/// Every column is read as text so that a stray cell deep in the file never
/// fails the parse; [`ColumnKind`](super::types::ColumnKind) is then decided from
/// all cells.
///
/// # Errors
///
/// Returns [`PrepError::MalformedInput`] if the bytes are empty or not a
/// delimited table.
pub fn read_csv(bytes: &[u8]) -> Result<Dataset> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(PrepError::MalformedInput("CSV input is empty".to_owned()));
    }

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| PrepError::MalformedInput(format!("Not a valid CSV table: {e}")))?;

    tracing::debug!(
        rows = frame.height(),
        columns = frame.width(),
        "Parsed CSV input"
    );
    Ok(Dataset::from_frame(frame))
}

/// Serialize a frame as CSV with a header row.
///
/// # Errors
///
/// Returns [`PrepError::ProcessingFailure`] if polars fails to write the frame.
pub fn write_csv(frame: &DataFrame) -> Result<Vec<u8>> {
    let mut frame = frame.clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut frame)
        .context("Failed to write CSV")?;
    Ok(buf)
}
