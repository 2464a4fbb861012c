//! Chart output layer for nomadash
//!
//! Each chart is a writer that turns an aggregate table into a Vega-Lite
//! JSON spec with inline data. The specs are self-contained: any host that
//! can embed Vega-Lite (browser, notebook, report) renders them without
//! touching the engine again.
//!
//! # Architecture
//!
//! All writers implement the [`ChartWriter`] trait. A writer is
//! configured at construction (metric, geometry) and consumes the
//! aggregate table it is pointed at; which filter stage feeds which
//! writer is decided by [`crate::dashboard`], not here.
//!
//! An empty aggregate produces a valid spec with an empty data array -
//! "no data" is a rendering state, not an error.

use polars::prelude::*;
use serde_json::{json, Map, Value};

use crate::{DashError, Result};

pub mod bar;
pub mod choropleth;
pub mod line;
pub mod pie;

pub use bar::BarWriter;
pub use choropleth::ChoroplethWriter;
pub use line::LineWriter;
pub use pie::PieWriter;

/// Vega-Lite schema URL stamped on every emitted spec.
pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Trait for chart writers
///
/// Writers take an aggregate DataFrame and produce a Vega-Lite JSON spec.
pub trait ChartWriter {
    /// Generate a Vega-Lite spec from an aggregate table.
    ///
    /// # Errors
    ///
    /// Returns [`DashError::Writer`] if the table is missing a column the
    /// chart needs or a value cannot be serialized.
    fn write(&self, df: &DataFrame) -> Result<Value>;
}

/// Convert a DataFrame to Vega-Lite inline data values (array of objects).
pub(crate) fn dataframe_to_values(df: &DataFrame) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(df.height());
    let column_names = df.get_column_names();

    for row_idx in 0..df.height() {
        let mut row_obj = Map::new();
        for (col_idx, col_name) in column_names.iter().enumerate() {
            let column = df.get_columns().get(col_idx).ok_or_else(|| {
                DashError::Writer(format!("Failed to get column {}", col_name))
            })?;
            let value = series_value_at(column.as_materialized_series(), row_idx)?;
            row_obj.insert(col_name.to_string(), value);
        }
        values.push(Value::Object(row_obj));
    }

    Ok(values)
}

/// Get a single value from a series at a given index as a JSON value.
pub(crate) fn series_value_at(series: &Series, idx: usize) -> Result<Value> {
    use DataType::*;

    match series.dtype() {
        Int32 => {
            let ca = series
                .i32()
                .map_err(|e| DashError::Writer(format!("Failed to cast to i32: {}", e)))?;
            Ok(ca.get(idx).map(|v| json!(v)).unwrap_or(Value::Null))
        }
        Int64 => {
            let ca = series
                .i64()
                .map_err(|e| DashError::Writer(format!("Failed to cast to i64: {}", e)))?;
            Ok(ca.get(idx).map(|v| json!(v)).unwrap_or(Value::Null))
        }
        Float64 => {
            let ca = series
                .f64()
                .map_err(|e| DashError::Writer(format!("Failed to cast to f64: {}", e)))?;
            Ok(ca.get(idx).map(|v| json!(v)).unwrap_or(Value::Null))
        }
        Boolean => {
            let ca = series
                .bool()
                .map_err(|e| DashError::Writer(format!("Failed to cast to bool: {}", e)))?;
            Ok(ca.get(idx).map(|v| json!(v)).unwrap_or(Value::Null))
        }
        String => {
            let ca = series
                .str()
                .map_err(|e| DashError::Writer(format!("Failed to cast to string: {}", e)))?;
            Ok(ca.get(idx).map(|v| json!(v)).unwrap_or(Value::Null))
        }
        Date => {
            // Days since epoch to ISO "YYYY-MM-DD"
            let ca = series
                .date()
                .map_err(|e| DashError::Writer(format!("Failed to cast to date: {}", e)))?;
            if let Some(days) = ca.0.get(idx) {
                let date = crate::reader::days_to_date(days);
                Ok(json!(date.format("%Y-%m-%d").to_string()))
            } else {
                Ok(Value::Null)
            }
        }
        _ => Ok(json!(series
            .get(idx)
            .map(|v| v.to_string())
            .unwrap_or_default())),
    }
}
