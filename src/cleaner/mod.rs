//! Charge table cleaning.
//!
//! [`TabularCleaner`] converts one raw charge export into a pair of fully numeric
//! tables:
//!
//! ```text
//! CSV bytes ─> Dataset (typed columns)
//!           ─> rename legacy risk column
//!           ─> filter_rows (captured, inside the trailing window)
//!           ─> classify each column: feature / label / ignored
//!           ─> encode(features), encode(labels)
//! ```
//!
//! The cleaner holds no state besides its configuration and performs no I/O of its
//! own; the reference time for the row window is always passed in.

pub mod classify;
pub mod encode;
pub mod filter;
pub mod io;
pub mod types;

pub use io::{read_csv, write_csv};
pub use types::{
    CleanOutput, CleanedDataset, ColumnKind, ColumnRole, Dataset, DropReason, DroppedColumn,
};

use crate::config::CleanerConfig;
use crate::error::Result;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct TabularCleaner {
    config: CleanerConfig,
}

impl TabularCleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, column_name: &str) -> ColumnRole {
        classify::classify(column_name, &self.config)
    }

    /// See [`filter::filter_rows`].
    ///
    /// # Errors
    ///
    /// Fails when the captured or timestamp column is missing.
    pub fn filter_rows(&self, dataset: &Dataset, reference_time: DateTime<Utc>) -> Result<Dataset> {
        filter::filter_rows(dataset, &self.config, reference_time)
    }

    /// See [`encode::encode`].
    ///
    /// # Errors
    ///
    /// Fails when a column cannot be read or the output cannot be assembled.
    pub fn encode(&self, dataset: &Dataset) -> Result<CleanedDataset> {
        encode::encode(dataset, &self.config)
    }

    /// Split a raw dataset into `(features, labels)`.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::MissingColumn`](crate::error::PrepError::MissingColumn)
    /// when the captured or timestamp column is absent, and
    /// [`PrepError::ProcessingFailure`](crate::error::PrepError::ProcessingFailure)
    /// for failures inside polars.
    pub fn clean(
        &self,
        mut dataset: Dataset,
        reference_time: DateTime<Utc>,
    ) -> Result<(CleanedDataset, CleanedDataset)> {
        let legacy = self.config.legacy_risk_column.as_str();
        if !legacy.is_empty() && dataset.has_column(legacy) {
            tracing::info!(from = legacy, to = %self.config.risk_column, "Renaming legacy risk column");
            dataset.rename(legacy, &self.config.risk_column)?;
        }

        let filtered = self.filter_rows(&dataset, reference_time)?;

        let mut feature_cols = Vec::new();
        let mut label_cols = Vec::new();
        for name in filtered.column_names() {
            match self.classify(&name) {
                ColumnRole::Feature => feature_cols.push(name),
                ColumnRole::Label => label_cols.push(name),
                ColumnRole::Ignored => tracing::debug!(column = %name, "Ignoring column"),
            }
        }

        let features = self.encode(&filtered.select(&feature_cols)?)?;
        let labels = self.encode(&filtered.select(&label_cols)?)?;

        tracing::info!(
            input_rows = dataset.height(),
            kept_rows = filtered.height(),
            features = features.width(),
            labels = labels.width(),
            dropped = features.dropped().len() + labels.dropped().len(),
            "Cleaned dataset"
        );
        Ok((features, labels))
    }

    /// Parse, clean and re-serialize one CSV upload.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::MalformedInput`](crate::error::PrepError::MalformedInput)
    /// for bytes that are not a CSV table, otherwise the errors of [`Self::clean`].
    pub fn clean_csv(&self, bytes: &[u8], reference_time: DateTime<Utc>) -> Result<CleanOutput> {
        let dataset = read_csv(bytes)?;
        let (features, labels) = self.clean(dataset, reference_time)?;

        let mut dropped = features.dropped().to_vec();
        dropped.extend_from_slice(labels.dropped());

        Ok(CleanOutput {
            features_csv: write_csv(features.frame())?,
            labels_csv: write_csv(labels.frame())?,
            rows: features.height(),
            feature_columns: features.column_names(),
            label_columns: labels.column_names(),
            dropped,
        })
    }
}

#[cfg(test)]
mod tests;
