//! End-to-end tests over the fixture export in `testdata/`.
//!
//! Reference time is pinned to 2024-07-01 so the 180-day window keeps every
//! captured charge from 2024 and drops the one from November 2023.

use chargeprep::cleaner::{ColumnKind, TabularCleaner, read_csv};
use chargeprep::handler::process_upload;
use chargeprep::store::{Bucket, LocalStore, UploadStatus, UploadStore as _};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

fn reference_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-07-01T00:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn fixture() -> Vec<u8> {
    std::fs::read(PathBuf::from("testdata/charges.csv")).expect("fixture exists")
}

#[test]
fn test_fixture_splits_into_expected_tables() {
    let output = TabularCleaner::default()
        .clean_csv(&fixture(), reference_time())
        .expect("fixture cleans");

    assert_eq!(output.rows, 4, "one uncaptured and one stale row are dropped");
    assert_eq!(
        output.feature_columns,
        vec![
            "card_brand__visa",
            "card_brand__mastercard",
            "card_brand__amex",
            "card_country__US",
            "card_country__GB",
            "card_country__CA",
            "amount_in_usd",
            "risk_score",
        ]
    );
    assert_eq!(
        output.label_columns,
        vec![
            "charge_captured",
            "risk_level__normal",
            "risk_level__elevated",
            "charge_status__succeeded",
            "dispute_count",
            "dispute_reason__fraudulent",
            "dispute_reason__duplicate",
            "efw_count",
        ]
    );
    assert!(output.dropped.is_empty());
}

#[test]
fn test_cleaned_output_is_numeric_and_complete() {
    let output = TabularCleaner::default()
        .clean_csv(&fixture(), reference_time())
        .expect("fixture cleans");

    for bytes in [&output.features_csv, &output.labels_csv] {
        let dataset = read_csv(bytes).expect("output parses");
        for name in dataset.column_names() {
            let (series, kind) = dataset.column(&name).expect("column exists");
            assert_eq!(kind, ColumnKind::Numeric, "{name} should be numeric");
            assert_eq!(series.null_count(), 0, "{name} should have no gaps");
        }
    }
}

#[test]
fn test_missing_amount_becomes_zero() {
    let cleaner = TabularCleaner::default();
    let dataset = read_csv(&fixture()).expect("fixture parses");
    let (features, _) = cleaner
        .clean(dataset, reference_time())
        .expect("fixture cleans");

    assert_eq!(
        features.values("amount_in_usd").expect("column exists"),
        vec![25.0, 40.5, 8.75, 0.0]
    );
    assert_eq!(
        features.values("risk_score").expect("column exists"),
        vec![12.0, 48.0, 15.0, 52.0]
    );
}

#[test]
fn test_process_fixture_through_local_store() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let store = LocalStore::open(temp_dir.path()).expect("store opens");
    let record = store
        .register("acct_123", "charges.csv", &fixture())
        .expect("upload registered");

    let response = process_upload(
        &store,
        &TabularCleaner::default(),
        &record.id,
        reference_time(),
    )
    .expect("upload processes");

    assert_eq!(response.feature_rows, 4);
    assert_eq!(response.feature_columns, 8);
    assert_eq!(response.label_columns, 8);

    let updated = store.record(&record.id).expect("record exists");
    assert_eq!(updated.status, UploadStatus::Processed);
    let labels_path = updated.labels_csv_path.expect("labels path set");
    let labels = store
        .download(Bucket::Cleaned, &labels_path)
        .expect("labels stored");
    assert!(labels.starts_with(b"charge_captured,"));
}
