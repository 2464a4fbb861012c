//! Date-range selector and cascading filter chain
//!
//! Five pure stages, each consuming the previous stage's output table and
//! one piece of the selection state:
//!
//! 1. date range (inclusive; a reversed range yields an empty table)
//! 2. customer region (equality, single required value)
//! 3. merchant regions (membership; empty selection is identity)
//! 4. genders (membership; empty selection is identity)
//! 5. age bands (closed range over the ordinal order, or forced singleton)
//!
//! Every stage returns a row-subset of its input with input order
//! preserved, and no stage observes a later stage. [`run`] computes the
//! whole cascade once and hands back every intermediate view, because the
//! charts deliberately consume different stages (the map and line chart
//! read the customer-region view, the pie and bar the fully filtered one).

use chrono::NaiveDate;
use polars::prelude::*;

use crate::selection::{AgeSelection, Selection};
use crate::{schema, DashError, Result};

/// Every intermediate table of one filter cascade.
///
/// Each field is a row-subset of the previous one; `filtered` is the
/// output of the full chain.
#[derive(Debug, Clone)]
pub struct Views {
    /// After the date-range selector.
    pub dated: DataFrame,
    /// After the customer-region filter.
    pub customer: DataFrame,
    /// After the merchant-region filter.
    pub merchant: DataFrame,
    /// After the gender filter.
    pub gender: DataFrame,
    /// After the age-band filter (fully filtered).
    pub filtered: DataFrame,
}

/// Run the full cascade for one selection.
pub fn run(data: &DataFrame, selection: &Selection) -> Result<Views> {
    let (start, end) = selection.date_range;
    let dated = by_date_range(data, start, end)?;
    let customer = by_customer_region(&dated, &selection.customer_region)?;
    let merchant = by_merchant_regions(&customer, &selection.merchant_regions)?;
    let gender = by_genders(&merchant, &selection.genders)?;
    let filtered = by_age_bands(&gender, &selection.age_bands)?;

    Ok(Views {
        dated,
        customer,
        merchant,
        gender,
        filtered,
    })
}

/// Keep rows whose date falls in `[start, end]` inclusive.
///
/// `start > end` produces an empty table rather than an error or an
/// auto-swap.
pub fn by_date_range(df: &DataFrame, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
    collect_filter(
        df,
        col(schema::DATE)
            .gt_eq(lit(start))
            .and(col(schema::DATE).lt_eq(lit(end))),
    )
}

/// Keep rows matching exactly one customer region.
pub fn by_customer_region(df: &DataFrame, region: &str) -> Result<DataFrame> {
    collect_filter(df, col(schema::CUSTOMER_REGION).eq(lit(region)))
}

/// Keep rows whose merchant region is in the selection.
///
/// An empty selection means "all" and passes the table through unchanged.
pub fn by_merchant_regions(df: &DataFrame, regions: &[String]) -> Result<DataFrame> {
    if regions.is_empty() {
        return Ok(df.clone());
    }
    collect_filter(df, any_of(schema::MERCHANT_REGION, regions))
}

/// Keep rows whose gender is in the selection; empty selection is identity.
pub fn by_genders(df: &DataFrame, genders: &[String]) -> Result<DataFrame> {
    if genders.is_empty() {
        return Ok(df.clone());
    }
    collect_filter(df, any_of(schema::GENDER, genders))
}

/// Keep rows whose age band falls in the closed selection range.
///
/// Band labels are zero-padded ordinals, so lexicographic comparison
/// matches the natural band order. A singleton selection degenerates to
/// equality.
pub fn by_age_bands(df: &DataFrame, selection: &AgeSelection) -> Result<DataFrame> {
    let (lo, hi) = selection.bounds();
    let predicate = match selection {
        AgeSelection::Single(band) => col(schema::AGE_BAND).eq(lit(band.as_str())),
        AgeSelection::Range(_, _) => col(schema::AGE_BAND)
            .gt_eq(lit(lo))
            .and(col(schema::AGE_BAND).lt_eq(lit(hi))),
    };
    collect_filter(df, predicate)
}

/// Membership predicate as an OR-fold of equalities.
fn any_of(column: &str, values: &[String]) -> Expr {
    values.iter().fold(lit(false), |acc, value| {
        acc.or(col(column).eq(lit(value.as_str())))
    })
}

fn collect_filter(df: &DataFrame, predicate: Expr) -> Result<DataFrame> {
    df.clone()
        .lazy()
        .filter(predicate)
        .collect()
        .map_err(|e| DashError::Filter(format!("Filter failed: {}", e)))
}
