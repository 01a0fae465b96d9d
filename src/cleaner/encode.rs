use super::types::{CleanedDataset, ColumnKind, Dataset, DropReason, DroppedColumn};
use crate::config::CleanerConfig;
use crate::error::{Result, ResultExt as _};
use polars::prelude::*;
use std::collections::HashSet;

/// Turn every column into fully populated floats.
///
/// Low-cardinality categorical columns are replaced in place by indicator
/// columns named `<column><separator><value>`; high-cardinality ones are dropped.
/// Everything else is coerced to numbers, entirely missing columns are dropped and
/// the remaining gaps become 0.0.
///
/// # Errors
///
/// Returns [`PrepError::ProcessingFailure`](crate::error::PrepError::ProcessingFailure)
/// if a column cannot be read or the output frame cannot be assembled.
pub fn encode(dataset: &Dataset, config: &CleanerConfig) -> Result<CleanedDataset> {
    let rows = dataset.height();
    if dataset.width() == 0 {
        return Ok(CleanedDataset::new(DataFrame::empty(), Vec::new(), rows));
    }

    let staged_exprs: Vec<Expr> = dataset
        .columns()
        .map(|(column, kind)| {
            let name = column.name().as_str();
            staged_expr(name, column.dtype(), kind).alias(name)
        })
        .collect();
    let staged = dataset
        .frame()
        .clone()
        .lazy()
        .select(staged_exprs)
        .collect()
        .context("Failed to coerce columns")?;

    let mut names = OutputNames::reserving(
        dataset
            .columns()
            .filter(|(_, kind)| !kind.is_categorical())
            .map(|(c, _)| c.name().to_string()),
    );
    let mut outputs = Vec::new();
    let mut dropped = Vec::new();

    for (column, (_, kind)) in staged.get_columns().iter().zip(dataset.columns()) {
        let name = column.name().as_str();

        if kind.is_categorical() {
            let categories = distinct_in_order(&staged, name)
                .with_context(|| format!("Failed to read categories of {name}"))?;

            if categories.is_empty() {
                dropped.push(drop_column(name, DropReason::AllMissing));
            } else if categories.len() >= config.one_hot_threshold {
                dropped.push(drop_column(
                    name,
                    DropReason::HighCardinality {
                        distinct: categories.len(),
                    },
                ));
            } else {
                for category in &categories {
                    let out_name =
                        names.claim(format!("{name}{}{category}", config.one_hot_separator));
                    outputs.push(
                        when(col(name).eq(lit(category.as_str())))
                            .then(lit(1.0))
                            .otherwise(lit(0.0))
                            .alias(&out_name),
                    );
                }
            }
            continue;
        }

        if column.null_count() == column.len() {
            dropped.push(drop_column(name, DropReason::AllMissing));
            continue;
        }
        outputs.push(col(name).fill_null(lit(0.0)));
    }

    let frame = if outputs.is_empty() {
        DataFrame::empty()
    } else {
        staged
            .lazy()
            .select(outputs)
            .collect()
            .context("Failed to assemble encoded frame")?
    };
    Ok(CleanedDataset::new(frame, dropped, rows))
}

/// Categorical columns become text with blanks as null; everything else becomes
/// nullable `Float64`, with unparseable and non-finite cells as null.
fn staged_expr(name: &str, dtype: &DataType, kind: ColumnKind) -> Expr {
    let expr = col(name);
    match kind {
        ColumnKind::Textual | ColumnKind::Timestamp => {
            let text = expr.cast(DataType::String);
            when(text.clone().eq(lit("")))
                .then(lit(NULL))
                .otherwise(text)
        }
        ColumnKind::Boolean if dtype.is_bool() => expr.cast(DataType::Float64),
        ColumnKind::Boolean => {
            let lower = expr
                .cast(DataType::String)
                .str()
                .strip_chars(lit(NULL))
                .str()
                .to_lowercase();
            when(
                lower
                    .clone()
                    .eq(lit("true"))
                    .or(lower.clone().eq(lit("1")))
                    .or(lower.clone().eq(lit("yes"))),
            )
            .then(lit(1.0))
            .when(
                lower
                    .clone()
                    .eq(lit("false"))
                    .or(lower.clone().eq(lit("0")))
                    .or(lower.eq(lit("no"))),
            )
            .then(lit(0.0))
            .otherwise(lit(NULL))
            .cast(DataType::Float64)
        }
        ColumnKind::Numeric => {
            let number = if dtype == &DataType::String {
                expr.str().strip_chars(lit(NULL)).cast(DataType::Float64)
            } else {
                expr.cast(DataType::Float64)
            };
            when(number.clone().is_finite())
                .then(number)
                .otherwise(lit(NULL))
        }
    }
}

/// Distinct non-missing values of a staged text column in first-seen order.
fn distinct_in_order(staged: &DataFrame, name: &str) -> Result<Vec<String>> {
    let unique = staged
        .clone()
        .lazy()
        .select([col(name).drop_nulls().unique_stable()])
        .collect()?;
    Ok(unique
        .column(name)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_owned)
        .collect())
}

fn drop_column(name: &str, reason: DropReason) -> DroppedColumn {
    match &reason {
        DropReason::HighCardinality { distinct } => {
            tracing::warn!(column = name, distinct, "Dropping high-cardinality column");
        }
        DropReason::AllMissing => {
            tracing::warn!(column = name, "Dropping column with no usable values");
        }
    }
    DroppedColumn {
        name: name.to_owned(),
        reason,
    }
}

/// Output column names handed out so far.
///
/// Source numeric columns keep their names; a generated indicator name that
/// clashes gets `_2`, `_3`, ... appended.
struct OutputNames {
    taken: HashSet<String>,
}

impl OutputNames {
    fn reserving(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            taken: names.into_iter().collect(),
        }
    }

    fn claim(&mut self, candidate: String) -> String {
        if self.taken.insert(candidate.clone()) {
            return candidate;
        }
        let mut n = 2_usize;
        loop {
            let next = format!("{candidate}_{n}");
            if self.taken.insert(next.clone()) {
                tracing::debug!(from = %candidate, to = %next, "Renamed clashing indicator column");
                return next;
            }
            n += 1;
        }
    }
}
