use super::cleaner;
use crate::cleaner::{ColumnKind, Dataset, DropReason};
use crate::config::CleanerConfig;
use crate::cleaner::TabularCleaner;
use anyhow::Result;
use polars::prelude::*;

#[test]
fn test_low_cardinality_column_is_one_hot_encoded() -> Result<()> {
    let df = df!("card_brand" => &["visa", "mastercard", "visa"])?;
    let cleaned = cleaner().encode(&Dataset::from_frame(df))?;

    assert_eq!(
        cleaned.column_names(),
        vec!["card_brand__visa", "card_brand__mastercard"]
    );
    assert_eq!(cleaned.values("card_brand__visa")?, vec![1.0, 0.0, 1.0]);
    assert_eq!(cleaned.values("card_brand__mastercard")?, vec![0.0, 1.0, 0.0]);
    assert!(cleaned.dropped().is_empty());
    Ok(())
}

#[test]
fn test_high_cardinality_column_is_dropped() -> Result<()> {
    let zips: Vec<String> = (0..500).map(|i| format!("{i:05}-{:04}", i % 7)).collect();
    let amounts: Vec<f64> = (0..500_i32).map(f64::from).collect();
    let df = df!("zip_code" => zips, "amount_in_usd" => amounts)?;
    let dataset = Dataset::from_frame(df);
    assert_eq!(dataset.kind("zip_code"), Some(ColumnKind::Textual));

    let cleaned = cleaner().encode(&dataset)?;

    assert_eq!(cleaned.column_names(), vec!["amount_in_usd"]);
    assert_eq!(cleaned.dropped().len(), 1);
    let dropped = cleaned.dropped().first().expect("one dropped column");
    assert_eq!(dropped.name, "zip_code");
    assert_eq!(dropped.reason, DropReason::HighCardinality { distinct: 500 });
    Ok(())
}

#[test]
fn test_threshold_boundary() -> Result<()> {
    let nine: Vec<String> = (0..9).map(|i| format!("cat{i}")).collect();
    let ten: Vec<String> = (0..10).map(|i| format!("cat{i}")).collect();

    let cleaned = cleaner().encode(&Dataset::from_frame(df!("c" => nine)?))?;
    assert_eq!(cleaned.width(), 9);

    let cleaned = cleaner().encode(&Dataset::from_frame(df!("c" => ten)?))?;
    assert_eq!(cleaned.width(), 0);
    assert_eq!(
        cleaned.dropped().first().map(|d| d.reason.clone()),
        Some(DropReason::HighCardinality { distinct: 10 })
    );
    Ok(())
}

#[test]
fn test_unparseable_cells_become_zero() -> Result<()> {
    let df = df!("dispute_count" => &["12", "abc", "7"])?;
    let cleaned = cleaner().encode(&Dataset::from_frame(df))?;

    assert_eq!(cleaned.values("dispute_count")?, vec![12.0, 0.0, 7.0]);
    Ok(())
}

#[test]
fn test_missing_numeric_cells_become_zero() -> Result<()> {
    let df = df!("efw_count" => &[Some(1.0), None, Some(3.0)])?;
    let cleaned = cleaner().encode(&Dataset::from_frame(df))?;

    assert_eq!(cleaned.values("efw_count")?, vec![1.0, 0.0, 3.0]);
    Ok(())
}

#[test]
fn test_all_missing_column_is_dropped() -> Result<()> {
    let empty: Vec<Option<f64>> = vec![None, None, None];
    let df = df!("keep" => &[1.0, 2.0, 3.0], "empty" => empty)?;
    let cleaned = cleaner().encode(&Dataset::from_frame(df))?;

    assert_eq!(cleaned.column_names(), vec!["keep"]);
    let dropped = cleaned.dropped().first().expect("one dropped column");
    assert_eq!(dropped.name, "empty");
    assert_eq!(dropped.reason, DropReason::AllMissing);
    Ok(())
}

#[test]
fn test_booleans_become_indicator_values() -> Result<()> {
    let df = df!("charge_captured" => &[Some(true), Some(false), None])?;
    let cleaned = cleaner().encode(&Dataset::from_frame(df))?;

    assert_eq!(cleaned.values("charge_captured")?, vec![1.0, 0.0, 0.0]);
    Ok(())
}

#[test]
fn test_missing_categories_give_all_zero_indicators() -> Result<()> {
    let df = df!("dispute_reason" => &[Some("fraudulent"), None, Some("duplicate")])?;
    let cleaned = cleaner().encode(&Dataset::from_frame(df))?;

    assert_eq!(
        cleaned.values("dispute_reason__fraudulent")?,
        vec![1.0, 0.0, 0.0]
    );
    assert_eq!(
        cleaned.values("dispute_reason__duplicate")?,
        vec![0.0, 0.0, 1.0]
    );
    Ok(())
}

#[test]
fn test_generated_names_never_collide() -> Result<()> {
    let df = df!(
        "a" => &["b", "c", "b"],
        "a__b" => &[5.0, 6.0, 7.0]
    )?;
    let cleaned = cleaner().encode(&Dataset::from_frame(df))?;

    assert_eq!(cleaned.column_names(), vec!["a__b_2", "a__c", "a__b"]);
    assert_eq!(cleaned.values("a__b")?, vec![5.0, 6.0, 7.0]);
    assert_eq!(cleaned.values("a__b_2")?, vec![1.0, 0.0, 1.0]);
    Ok(())
}

#[test]
fn test_encode_is_idempotent_on_numeric_output() -> Result<()> {
    let df = df!(
        "card_brand" => &["visa", "amex", "visa", "discover"],
        "amount_in_usd" => &[Some(10.5), None, Some(3.0), Some(8.25)],
        "charge_captured" => &[true, true, false, true]
    )?;
    let once = cleaner().encode(&Dataset::from_frame(df))?;
    let twice = cleaner().encode(&Dataset::from_frame(once.frame().clone()))?;

    assert!(once.frame().equals(twice.frame()));
    assert!(twice.dropped().is_empty());
    for name in twice.column_names() {
        assert!(
            twice.values(&name)?.iter().all(|v| v.is_finite()),
            "{name} should be finite"
        );
    }
    Ok(())
}

#[test]
fn test_custom_separator_and_threshold() -> Result<()> {
    let cleaner = TabularCleaner::new(CleanerConfig {
        one_hot_separator: "=".to_owned(),
        one_hot_threshold: 2,
        ..CleanerConfig::default()
    });
    let df = df!(
        "status" => &["ok", "ok", "ok"],
        "brand" => &["visa", "amex", "visa"]
    )?;
    let cleaned = cleaner.encode(&Dataset::from_frame(df))?;

    assert_eq!(cleaned.column_names(), vec!["status=ok"]);
    assert_eq!(cleaned.dropped().len(), 1);
    Ok(())
}
