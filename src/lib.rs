//! # chargeprep - card-charge export preprocessing
//!
//! chargeprep turns a CSV export of card charges into two fully numeric tables,
//! one of model features and one of outcome labels.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chargeprep::cleaner::TabularCleaner;
//! use chrono::Utc;
//!
//! # fn example() -> chargeprep::error::Result<()> {
//! let bytes = std::fs::read("charges.csv")?;
//! let output = TabularCleaner::default().clean_csv(&bytes, Utc::now())?;
//! println!(
//!     "{} rows, {} feature columns, {} label columns",
//!     output.rows,
//!     output.feature_columns.len(),
//!     output.label_columns.len()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`cleaner`]: typed ingestion, row filtering, column classification and encoding
//! - [`store`]: upload records and stored files behind the [`store::UploadStore`] trait
//! - [`handler`]: one end-to-end preprocessing request
//! - [`config`]: pipeline tunables, loadable from JSON
//! - [`error`]: error type and status-code mapping
//! - [`logging`]: `tracing` subscriber setup
//!
//! ## Column Routing
//!
//! Column names decide where data goes. Non-USD `amount_in_*` columns and
//! identifiers such as `card_bin` are ignored, `risk_level*` and outcome columns
//! such as `charge_status` become labels, and everything else is a feature:
//!
//! ```
//! use chargeprep::cleaner::{ColumnRole, TabularCleaner};
//!
//! let cleaner = TabularCleaner::default();
//! assert_eq!(cleaner.classify("amount_in_eur"), ColumnRole::Ignored);
//! assert_eq!(cleaner.classify("risk_level"), ColumnRole::Label);
//! assert_eq!(cleaner.classify("card_brand"), ColumnRole::Feature);
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod cleaner;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod store;
