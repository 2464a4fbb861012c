//! Dataset loading layer for nomadash
//!
//! The reader module turns the fixed input files into in-memory resources:
//! the EUC-KR encoded consumption CSV becomes a Polars DataFrame with a
//! parsed `Date` column, and the district GeoJSON becomes a
//! [`geometry::DistrictGeometry`].
//!
//! Loading is all-or-nothing: a missing file, undecodable bytes, a missing
//! required column, or a date value that fails to parse aborts the load
//! with [`DashError::DataLoad`]. Rows are never silently dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use nomadash::reader;
//!
//! let data = reader::load_csv("nomad_consumption.csv")?;
//! let geometry = reader::geometry::load_geojson("seoul_districts.json")?;
//! ```

use std::fs;
use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;

use crate::{schema, DashError, Result};

pub mod geometry;

/// Load the consumption dataset from an EUC-KR encoded CSV file.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|e| DashError::DataLoad(format!("Failed to read {}: {}", path.display(), e)))?;
    load_csv_bytes(&bytes)
}

/// Load the consumption dataset from an in-memory EUC-KR encoded buffer.
///
/// Used by tests and by the export round-trip; the contract is identical
/// to [`load_csv`].
pub fn load_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    let (text, _, had_errors) = encoding_rs::EUC_KR.decode(bytes);
    if had_errors {
        return Err(DashError::DataLoad(
            "Input is not valid EUC-KR encoded text".to_string(),
        ));
    }

    let cursor = Cursor::new(text.into_owned().into_bytes());
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(cursor)
        .finish()
        .map_err(|e| DashError::DataLoad(format!("Failed to parse CSV: {}", e)))?;

    validate_columns(&df)?;
    parse_date_column(df)
}

/// Check that every required dataset column is present.
fn validate_columns(df: &DataFrame) -> Result<()> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    for required in schema::REQUIRED_COLUMNS {
        if !names.iter().any(|n| n == required) {
            return Err(DashError::DataLoad(format!(
                "Missing required column '{}' (found: {})",
                required,
                names.join(", ")
            )));
        }
    }
    Ok(())
}

/// Convert the raw `YYYYMMDD` date column into a `Date` column.
///
/// CSV inference may have read the column as integers or strings; either
/// way it is cast to string first and then parsed strictly, so a single
/// malformed value fails the whole load.
fn parse_date_column(df: DataFrame) -> Result<DataFrame> {
    df.lazy()
        .with_column(
            col(schema::DATE)
                .cast(DataType::String)
                .str()
                .to_date(StrptimeOptions {
                    format: Some("%Y%m%d".into()),
                    strict: true,
                    exact: true,
                    cache: true,
                })
                .alias(schema::DATE),
        )
        .collect()
        .map_err(|e| {
            DashError::DataLoad(format!(
                "Failed to parse '{}' as YYYYMMDD dates: {}",
                schema::DATE,
                e
            ))
        })
}

/// Minimum and maximum transaction dates in the loaded table.
///
/// These are the default bounds of the date-range selector.
pub fn date_span(df: &DataFrame) -> Result<(chrono::NaiveDate, chrono::NaiveDate)> {
    let series = df
        .column(schema::DATE)
        .map_err(|e| DashError::DataLoad(format!("Missing date column: {}", e)))?
        .as_materialized_series();
    let ca = series
        .date()
        .map_err(|e| DashError::DataLoad(format!("Date column has wrong type: {}", e)))?;

    let min = ca
        .0
        .min()
        .ok_or_else(|| DashError::DataLoad("Dataset contains no rows".to_string()))?;
    let max = ca
        .0
        .max()
        .ok_or_else(|| DashError::DataLoad("Dataset contains no rows".to_string()))?;

    Ok((days_to_date(min), days_to_date(max)))
}

/// Convert days since the Unix epoch to a calendar date.
pub(crate) fn days_to_date(days: i32) -> chrono::NaiveDate {
    let unix_epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    unix_epoch + chrono::Duration::days(days as i64)
}
