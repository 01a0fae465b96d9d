//! One preprocessing request: resolve an upload, clean it, store both tables and
//! record the outcome.

use crate::cleaner::{DroppedColumn, TabularCleaner};
use crate::error::{PrepError, Result};
use crate::store::{Bucket, UploadRecord, UploadStatus, UploadStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body returned with a 200.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub message: String,
    pub cleaned_path: String,
    pub labels_path: String,
    pub feature_rows: usize,
    pub feature_columns: usize,
    pub label_columns: usize,
    pub dropped_columns: Vec<DroppedColumn>,
}

/// Body returned with any error status.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip)]
    pub status: u16,
}

impl From<&PrepError> for ErrorResponse {
    fn from(err: &PrepError) -> Self {
        Self {
            success: false,
            error: format!("Error processing CSV: {err}"),
            status: err.status_code(),
        }
    }
}

/// Run the full pipeline for `upload_id` against `store`.
///
/// On success the record points at both cleaned tables and is `Processed`. Once the
/// record has been found, any failure marks it `Failed` before the error is returned.
///
/// # Errors
///
/// - [`PrepError::MalformedInput`] for an empty id or unreadable CSV
/// - [`PrepError::InputNotFound`] for an unknown id or missing upload
/// - [`PrepError::MissingColumn`] / [`PrepError::ProcessingFailure`] from cleaning
pub fn process_upload<S: UploadStore + ?Sized>(
    store: &S,
    cleaner: &TabularCleaner,
    upload_id: &str,
    reference_time: DateTime<Utc>,
) -> Result<ProcessResponse> {
    let upload_id = upload_id.trim();
    if upload_id.is_empty() {
        return Err(PrepError::MalformedInput("Missing csvUploadId".to_owned()));
    }

    let record = store.record(upload_id)?;
    let _span = tracing::info_span!("process_upload", id = %record.id, user = %record.user_id)
        .entered();

    match run(store, cleaner, &record, reference_time) {
        Ok(response) => Ok(response),
        Err(err) => {
            tracing::error!("Error processing CSV: {err}");
            let mut failed = record;
            failed.status = UploadStatus::Failed;
            failed.updated_at = Utc::now();
            if let Err(save_err) = store.save_record(&failed) {
                tracing::warn!("Could not mark upload as failed: {save_err}");
            }
            Err(err)
        }
    }
}

fn run<S: UploadStore + ?Sized>(
    store: &S,
    cleaner: &TabularCleaner,
    record: &UploadRecord,
    reference_time: DateTime<Utc>,
) -> Result<ProcessResponse> {
    let raw = store.download(Bucket::Uploads, &record.csv_path)?;
    let output = cleaner.clean_csv(&raw, reference_time)?;

    let file_name = record.file_name();
    let cleaned_path = format!("{}/cleaned/cleaned_{file_name}", record.user_id);
    let labels_path = format!("{}/cleaned/labels_{file_name}", record.user_id);
    store.upload(Bucket::Cleaned, &cleaned_path, &output.features_csv)?;
    store.upload(Bucket::Cleaned, &labels_path, &output.labels_csv)?;

    let mut updated = record.clone();
    updated.cleaned_csv_path = Some(cleaned_path.clone());
    updated.labels_csv_path = Some(labels_path.clone());
    updated.status = UploadStatus::Processed;
    updated.updated_at = Utc::now();
    store.save_record(&updated)?;

    tracing::info!(
        rows = output.rows,
        features = output.feature_columns.len(),
        labels = output.label_columns.len(),
        "Data processed successfully"
    );

    Ok(ProcessResponse {
        success: true,
        message: "Data processed successfully".to_owned(),
        cleaned_path,
        labels_path,
        feature_rows: output.rows,
        feature_columns: output.feature_columns.len(),
        label_columns: output.label_columns.len(),
        dropped_columns: output.dropped,
    })
}
