#![allow(clippy::unwrap_used)]
use super::*;
use chrono::{DateTime, Utc};

mod encode;

/// Fixed "now" so window checks do not depend on the wall clock.
fn reference_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-07-01T00:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn cleaner() -> TabularCleaner {
    TabularCleaner::default()
}
