//! Tunables for the cleaning pipeline.
//!
//! Every field has a default matching the charge export format, so an empty JSON
//! object (or no config file at all) gives the standard behaviour.

use crate::error::{Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default trailing window, in days, for the row filter.
pub const PAST_DAYS: i64 = 180;

/// Textual columns with fewer distinct values than this are one-hot encoded.
pub const ONE_HOT_THRESHOLD: usize = 10;

/// Separator between source column and category value in indicator names.
pub const ONE_HOT_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CleanerConfig {
    /// Rows older than this many days before the reference time are dropped
    pub past_days: i64,
    pub one_hot_threshold: usize,
    pub one_hot_separator: String,
    /// Boolean column a row must have set to survive filtering
    pub captured_column: String,
    /// Timestamp column the trailing window is measured on
    pub timestamp_column: String,
    /// Prefix of per-currency amount columns; all but `base_amount_column` are ignored
    pub amount_prefix: String,
    pub base_amount_column: String,
    /// Identifier or administrative columns that carry no signal
    pub ignored_columns: Vec<String>,
    pub risk_level_prefix: String,
    /// Outcome columns routed to the labels table
    pub outcome_columns: Vec<String>,
    /// Older exports name the risk score differently; renamed before classification
    pub legacy_risk_column: String,
    pub risk_column: String,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            past_days: PAST_DAYS,
            one_hot_threshold: ONE_HOT_THRESHOLD,
            one_hot_separator: ONE_HOT_SEPARATOR.to_owned(),
            captured_column: "charge_captured".to_owned(),
            timestamp_column: "created".to_owned(),
            amount_prefix: "amount_in_".to_owned(),
            base_amount_column: "amount_in_usd".to_owned(),
            ignored_columns: vec![
                "billing_address_postal_code".to_owned(),
                "card_bin".to_owned(),
                "created".to_owned(),
            ],
            risk_level_prefix: "risk_level".to_owned(),
            outcome_columns: vec![
                "charge_captured".to_owned(),
                "charge_status".to_owned(),
                "dispute_count".to_owned(),
                "dispute_reason".to_owned(),
                "efw_count".to_owned(),
            ],
            legacy_risk_column: "charge_outcome_risk_score".to_owned(),
            risk_column: "risk_score".to_owned(),
        }
    }
}

impl CleanerConfig {
    /// Load a config from a JSON file. Missing fields fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::Io`](crate::error::PrepError::Io) if the file cannot be
    /// read and [`PrepError::Config`](crate::error::PrepError::Config) if it is not
    /// valid JSON or fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Parse a config from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::Config`](crate::error::PrepError::Config) on invalid JSON
    /// or out-of-range values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the pipeline meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::Config`](crate::error::PrepError::Config) describing the
    /// first invalid field.
    pub fn validate(&self) -> Result<()> {
        use crate::error::PrepError;

        if self.past_days <= 0 {
            return Err(PrepError::Config(format!(
                "past_days must be positive, got {}",
                self.past_days
            )));
        }
        if self.one_hot_separator.is_empty() {
            return Err(PrepError::Config(
                "one_hot_separator must not be empty".to_owned(),
            ));
        }
        if self.captured_column.is_empty() || self.timestamp_column.is_empty() {
            return Err(PrepError::Config(
                "captured_column and timestamp_column must be set".to_owned(),
            ));
        }
        Ok(())
    }
}
