//! Metric-parameterized group-and-sum
//!
//! One generic aggregation path covers every view: group a table by one or
//! two categorical columns and sum the column the [`Metric`] toggle
//! selects. The amount/count branching lives in [`Metric::column`], not at
//! the call sites.
//!
//! Output tables are deterministic (keys sorted ascending) and relabeled
//! with the display names from [`schema`]. An empty input produces an
//! empty aggregate, never an error.

use polars::prelude::*;

use crate::selection::Metric;
use crate::{schema, DashError, Result};

/// Group `df` by the given key columns and sum the metric column.
///
/// `keys` pairs each source column with its output label; the summed
/// metric is always labeled [`schema::LABEL_TOTAL`].
pub fn sum_by(df: &DataFrame, keys: &[(&str, &str)], metric: Metric) -> Result<DataFrame> {
    let group_cols: Vec<Expr> = keys.iter().map(|(source, _)| col(*source)).collect();
    let sort_cols: Vec<String> = keys.iter().map(|(source, _)| source.to_string()).collect();
    let old_names: Vec<String> = sort_cols.clone();
    let new_names: Vec<String> = keys.iter().map(|(_, label)| label.to_string()).collect();

    df.clone()
        .lazy()
        .group_by(group_cols)
        .agg([col(metric.column()).sum().alias(schema::LABEL_TOTAL)])
        .sort(sort_cols, SortMultipleOptions::default())
        .rename(old_names, new_names, true)
        .collect()
        .map_err(|e| DashError::Aggregate(format!("Aggregation failed: {}", e)))
}

/// Metric total per merchant region.
pub fn by_merchant_region(df: &DataFrame, metric: Metric) -> Result<DataFrame> {
    sum_by(df, &[(schema::MERCHANT_REGION, schema::LABEL_REGION)], metric)
}

/// Metric total per age band.
pub fn by_age_band(df: &DataFrame, metric: Metric) -> Result<DataFrame> {
    sum_by(df, &[(schema::AGE_BAND, schema::LABEL_AGE_BAND)], metric)
}

/// Metric total per business category and age band.
pub fn by_category_age(df: &DataFrame, metric: Metric) -> Result<DataFrame> {
    sum_by(
        df,
        &[
            (schema::CATEGORY, schema::LABEL_CATEGORY),
            (schema::AGE_BAND, schema::LABEL_AGE_BAND),
        ],
        metric,
    )
}
