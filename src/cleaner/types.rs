use crate::error::{PrepError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Physical interpretation of a column, fixed once when the dataset is ingested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Textual,
    Boolean,
    Timestamp,
}

impl ColumnKind {
    /// Textual and timestamp columns go through category encoding rather than coercion.
    pub fn is_categorical(self) -> bool {
        matches!(self, Self::Textual | Self::Timestamp)
    }

    /// Decide the kind of a freshly loaded column.
    ///
    /// String columns are promoted to `Boolean`, `Numeric` or `Timestamp` when their
    /// non-missing cells support it (all flags, or a strict majority of numbers or
    /// timestamps respectively).
    pub fn infer(series: &Series) -> Self {
        let dtype = series.dtype();
        if dtype.is_bool() {
            return Self::Boolean;
        }
        if dtype.is_primitive_numeric() {
            return Self::Numeric;
        }
        if dtype.is_temporal() {
            return Self::Timestamp;
        }
        let Ok(values) = string_values(series) else {
            return Self::Textual;
        };

        let mut present = 0_usize;
        let mut flags = 0_usize;
        let mut numbers = 0_usize;
        let mut timestamps = 0_usize;
        for value in values.iter().flatten() {
            present += 1;
            if parse_flag(value).is_some() {
                flags += 1;
            }
            if parse_number(value).is_some() {
                numbers += 1;
            } else if parse_timestamp(value).is_some() {
                timestamps += 1;
            }
        }

        if present == 0 {
            Self::Textual
        } else if flags == present && numbers < present {
            Self::Boolean
        } else if numbers * 2 > present {
            Self::Numeric
        } else if timestamps * 2 > present {
            Self::Timestamp
        } else {
            Self::Textual
        }
    }
}

/// Where a column ends up after classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Ignored,
    Label,
    Feature,
}

impl ColumnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Label => "label",
            Self::Feature => "feature",
        }
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why `encode` removed a column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DropReason {
    /// Too many distinct categories to one-hot encode
    HighCardinality { distinct: usize },
    /// No cell survived numeric coercion
    AllMissing,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedColumn {
    pub name: String,
    pub reason: DropReason,
}

/// Raw tabular input: a polars frame plus the kind of every column.
#[derive(Clone, Debug)]
pub struct Dataset {
    frame: DataFrame,
    kinds: Vec<ColumnKind>,
}

impl Dataset {
    /// Wrap a frame, inferring the kind of every column.
    pub fn from_frame(frame: DataFrame) -> Self {
        let kinds = frame
            .get_columns()
            .iter()
            .map(|c| ColumnKind::infer(c.as_materialized_series()))
            .collect();
        Self { frame, kinds }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_index(name).is_some()
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.frame
            .get_column_index(name)
            .and_then(|idx| self.kinds.get(idx).copied())
    }

    /// Columns in order, each with its kind.
    pub fn columns(&self) -> impl Iterator<Item = (&Column, ColumnKind)> {
        self.frame
            .get_columns()
            .iter()
            .zip(self.kinds.iter().copied())
    }

    /// Look up a column, failing with [`PrepError::MissingColumn`] when absent.
    pub fn column(&self, name: &str) -> Result<(&Series, ColumnKind)> {
        let idx = self
            .frame
            .get_column_index(name)
            .ok_or_else(|| PrepError::MissingColumn(name.to_owned()))?;
        let column = self
            .frame
            .get_columns()
            .get(idx)
            .ok_or_else(|| PrepError::MissingColumn(name.to_owned()))?;
        let kind = self.kinds.get(idx).copied().unwrap_or(ColumnKind::Textual);
        Ok((column.as_materialized_series(), kind))
    }

    /// Subset of columns in the given order. Kinds are carried over, not re-inferred.
    pub fn select(&self, names: &[String]) -> Result<Self> {
        let mut kinds = Vec::with_capacity(names.len());
        for name in names {
            kinds.push(
                self.kind(name)
                    .ok_or_else(|| PrepError::MissingColumn(name.clone()))?,
            );
        }
        let frame = self.frame.select(names.iter().map(String::as_str))?;
        Ok(Self { frame, kinds })
    }

    /// Keep the rows where `mask` is true.
    pub fn filter(&self, mask: &BooleanChunked) -> Result<Self> {
        Ok(Self {
            frame: self.frame.filter(mask)?,
            kinds: self.kinds.clone(),
        })
    }

    /// Rename `from` to `to`, replacing any column already called `to`.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }
        if self.frame.get_column_index(from).is_none() {
            return Err(PrepError::MissingColumn(from.to_owned()));
        }
        if let Some(idx) = self.frame.get_column_index(to) {
            self.frame.drop_in_place(to)?;
            self.kinds.remove(idx);
        }
        self.frame.rename(from, to.into())?;
        Ok(())
    }
}

/// Fully numeric output table plus the columns that were dropped to get there.
///
/// `height` is the number of rows that went into encoding, even when every
/// column was dropped.
#[derive(Clone, Debug)]
pub struct CleanedDataset {
    frame: DataFrame,
    dropped: Vec<DroppedColumn>,
    rows: usize,
}

impl CleanedDataset {
    pub(crate) fn new(frame: DataFrame, dropped: Vec<DroppedColumn>, rows: usize) -> Self {
        Self {
            frame,
            dropped,
            rows,
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn dropped(&self) -> &[DroppedColumn] {
        &self.dropped
    }

    pub fn height(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Values of one output column.
    pub fn values(&self, name: &str) -> Result<Vec<f64>> {
        let column = self
            .frame
            .column(name)
            .map_err(|_e| PrepError::MissingColumn(name.to_owned()))?;
        Ok(column
            .as_materialized_series()
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect())
    }
}

/// Result of cleaning one CSV upload end to end.
#[derive(Clone, Debug)]
pub struct CleanOutput {
    pub features_csv: Vec<u8>,
    pub labels_csv: Vec<u8>,
    pub rows: usize,
    pub feature_columns: Vec<String>,
    pub label_columns: Vec<String>,
    pub dropped: Vec<DroppedColumn>,
}

/// Cell values as strings; empty strings count as missing.
pub(crate) fn string_values(series: &Series) -> Result<Vec<Option<String>>> {
    let cast;
    let series = if series.dtype() == &DataType::String {
        series
    } else {
        cast = series.cast(&DataType::String)?;
        &cast
    };
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.filter(|s| !s.is_empty()).map(str::to_owned))
        .collect())
}

/// Cells as finite floats; text that does not parse is `None`.
pub(crate) fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    if series.dtype() == &DataType::String {
        return Ok(series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_number))
            .collect());
    }
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

/// Whether each cell is set. Numeric columns count any non-zero number; missing
/// or unrecognised cells are false.
pub(crate) fn flag_values(series: &Series, kind: ColumnKind) -> Result<Vec<bool>> {
    if series.dtype().is_bool() {
        return Ok(series
            .bool()?
            .into_iter()
            .map(|v| v.unwrap_or(false))
            .collect());
    }
    if kind == ColumnKind::Numeric || series.dtype().is_primitive_numeric() {
        return Ok(numeric_values(series)?
            .into_iter()
            .map(|v| v.is_some_and(|x| x != 0.0))
            .collect());
    }
    Ok(string_values(series)?
        .iter()
        .map(|v| v.as_deref().and_then(parse_flag).unwrap_or(false))
        .collect())
}

/// Timestamp of each cell; numeric cells are Unix seconds.
pub(crate) fn timestamp_values(
    series: &Series,
    kind: ColumnKind,
) -> Result<Vec<Option<DateTime<Utc>>>> {
    if kind == ColumnKind::Numeric {
        return Ok(numeric_values(series)?
            .into_iter()
            .map(|v| v.and_then(|secs| DateTime::from_timestamp(secs.trunc() as i64, 0)))
            .collect());
    }
    Ok(string_values(series)?
        .iter()
        .map(|v| v.as_deref().and_then(parse_timestamp))
        .collect())
}

pub(crate) fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
}

pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parse the timestamp layouts found in charge exports. Naive values are UTC.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
