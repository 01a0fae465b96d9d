use super::types::{Dataset, flag_values, timestamp_values};
use crate::config::CleanerConfig;
use crate::error::{Result, ResultExt as _};
use chrono::{DateTime, TimeDelta, Utc};
use polars::prelude::*;

/// Keep captured rows created strictly after `reference_time - past_days`.
///
/// Rows with a missing or unparseable timestamp are dropped. An empty result is
/// not an error.
///
/// # Errors
///
/// Returns [`PrepError::MissingColumn`](crate::error::PrepError::MissingColumn) if
/// the captured or timestamp column is absent.
pub fn filter_rows(
    dataset: &Dataset,
    config: &CleanerConfig,
    reference_time: DateTime<Utc>,
) -> Result<Dataset> {
    let (captured, captured_kind) = dataset.column(&config.captured_column)?;
    let (created, created_kind) = dataset.column(&config.timestamp_column)?;

    let cutoff = window_start(reference_time, config.past_days);
    let captured =
        flag_values(captured, captured_kind).context("Failed to read captured flags")?;
    let created =
        timestamp_values(created, created_kind).context("Failed to read row timestamps")?;

    let mask: Vec<bool> = captured
        .iter()
        .zip(&created)
        .map(|(&is_captured, ts)| is_captured && ts.is_some_and(|ts| ts > cutoff))
        .collect();

    let kept = mask.iter().filter(|&&keep| keep).count();
    tracing::debug!(
        rows = dataset.height(),
        kept,
        %cutoff,
        "Filtered rows to captured charges inside the window"
    );

    let mask = BooleanChunked::from_slice("keep".into(), &mask);
    dataset.filter(&mask)
}

fn window_start(reference_time: DateTime<Utc>, past_days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(past_days)
        .and_then(|window| reference_time.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
