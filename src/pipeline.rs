//! The transformation pipeline: load, aggregate, derive shares, pivot,
//! persist, reload. Each stage is a standalone function over DataFrames;
//! `run` composes the compute-and-persist pass.

use std::fs::File;
use std::path::Path;

use polars::prelude::pivot::pivot_stable;
use polars::prelude::*;
use tracing::debug;

use crate::error::ShareError;
use crate::schema::{cols, derived, nationality};

/// Read the recipient-counts CSV with all columns as String, trim column
/// names, check the required columns, and parse `recipients` to Float64.
pub fn load_recipients(path: impl AsRef<Path>) -> Result<DataFrame, ShareError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    require_columns(
        &df,
        &[
            cols::PERIOD,
            cols::SCHEME_DESCRIPTION,
            cols::NATIONALITY,
            cols::RECIPIENTS,
        ],
    )?;

    let df = df
        .lazy()
        .with_columns([col(cols::RECIPIENTS)
            .str()
            .strip_chars(lit(" \t\r\n"))
            .cast(DataType::Float64)])
        .collect()?;

    debug!(rows = df.height(), "loaded recipient records");
    Ok(df)
}

/// Sum recipients per (period, scheme_description, nationality). The "All"
/// marker rows pass through like any other nationality.
pub fn aggregate_recipients(records: DataFrame) -> Result<DataFrame, ShareError> {
    let df = records
        .lazy()
        .group_by([
            col(cols::PERIOD),
            col(cols::SCHEME_DESCRIPTION),
            col(cols::NATIONALITY),
        ])
        .agg([col(cols::RECIPIENTS).sum()])
        .collect()?;
    Ok(df)
}

/// Join each aggregated group to its (period, scheme) "All" total and derive
/// the percentage share. The join is inner: a group whose (period, scheme)
/// has no "All" row drops out silently. A zero total propagates a non-finite
/// percentage. The "All" rows themselves get a null percentage.
pub fn with_percentages(grouped: DataFrame) -> Result<DataFrame, ShareError> {
    let totals = grouped
        .clone()
        .lazy()
        .filter(col(cols::NATIONALITY).eq(lit(nationality::ALL)))
        .select([
            col(cols::PERIOD),
            col(cols::SCHEME_DESCRIPTION),
            col(cols::RECIPIENTS).alias(derived::RECIPIENTS_TOTAL),
        ]);

    let df = grouped
        .lazy()
        .join(
            totals,
            [col(cols::PERIOD), col(cols::SCHEME_DESCRIPTION)],
            [col(cols::PERIOD), col(cols::SCHEME_DESCRIPTION)],
            JoinArgs::new(JoinType::Inner),
        )
        .with_columns([when(col(cols::NATIONALITY).neq(lit(nationality::ALL)))
            .then(col(cols::RECIPIENTS) / col(derived::RECIPIENTS_TOTAL) * lit(100.0))
            .otherwise(lit(NULL).cast(DataType::Float64))
            .alias(derived::PERCENTAGE)])
        .collect()?;

    Ok(df)
}

/// Pivot the percentage rows to one row per (period, scheme_description)
/// with one column per nationality. The "All" marker never becomes a column.
/// Missing (row, column) cells fill with 0, which makes "no data" and "zero
/// share" indistinguishable. Rows sort by scheme first, then period, so each
/// scheme's time series is contiguous.
pub fn pivot_shares(percentages: DataFrame) -> Result<DataFrame, ShareError> {
    let long = percentages
        .lazy()
        .filter(col(cols::NATIONALITY).neq(lit(nationality::ALL)))
        .collect()?;

    // Nationality columns come out sorted by name, which also keeps the
    // persisted file stable across runs.
    let wide = pivot_stable(
        &long,
        [cols::NATIONALITY],
        Some([cols::PERIOD, cols::SCHEME_DESCRIPTION]),
        Some([derived::PERCENTAGE]),
        true,
        None,
        None,
    )?;

    let wide = wide
        .lazy()
        .with_columns([dtype_col(&DataType::Float64)
            .as_selector()
            .as_expr()
            .fill_null(lit(0.0))])
        .collect()?;

    let wide = wide.sort(
        [cols::SCHEME_DESCRIPTION, cols::PERIOD],
        SortMultipleOptions::default(),
    )?;

    Ok(wide)
}

/// Write the wide table as CSV, header row included.
pub fn write_shares(shares: &mut DataFrame, path: impl AsRef<Path>) -> Result<(), ShareError> {
    let mut file = File::create(path.as_ref())?;
    CsvWriter::new(&mut file).include_header(true).finish(shares)?;
    Ok(())
}

/// Reload the persisted wide table with schema inference. Rendering works
/// off this file, never the in-memory table.
pub fn read_shares(path: impl AsRef<Path>) -> Result<DataFrame, ShareError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Full compute-and-persist pass: load, aggregate, derive, pivot, write.
/// Returns the wide table that was written.
pub fn run(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<DataFrame, ShareError> {
    let records = load_recipients(input)?;
    let grouped = aggregate_recipients(records)?;
    let percentages = with_percentages(grouped)?;
    let mut wide = pivot_shares(percentages)?;
    write_shares(&mut wide, output)?;
    Ok(wide)
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), ShareError> {
    for &name in required {
        if df.column(name).is_err() {
            return Err(ShareError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}
