//! Selection state for one interaction cycle
//!
//! Models what the user picked in the UI surface: the metric toggle, the
//! date range, and the four cascading filter selections. The state is
//! immutable; every interaction builds a fresh [`Selection`] and hands it
//! to [`crate::Dashboard::render`].
//!
//! Widget domains cascade strictly: each stage's domain is computed from
//! the previous stage's output table only, so the customer-region domain
//! is always a superset of what survives the later filters.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::{reader, schema, DashError, Result};

// =============================================================================
// Metric
// =============================================================================

/// The measure every aggregation sums: card usage amount or usage count.
///
/// Passed into the single generic aggregation path instead of branching
/// at each call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Amount,
    Count,
}

impl Metric {
    /// The dataset column this metric sums.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Amount => schema::USE_AMOUNT,
            Metric::Count => schema::USE_COUNT,
        }
    }

    /// Display label used on chart axes and legends.
    pub fn display_label(&self) -> &'static str {
        match self {
            Metric::Amount => "카드이용금액",
            Metric::Count => "카드이용건수",
        }
    }

    /// Short machine-friendly name, used in export file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Metric::Amount => "amount",
            Metric::Count => "count",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Metric {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "amount" => Ok(Metric::Amount),
            "count" => Ok(Metric::Count),
            other => Err(DashError::Filter(format!(
                "Unknown metric '{}' (expected 'amount' or 'count')",
                other
            ))),
        }
    }
}

// =============================================================================
// Age-band selection
// =============================================================================

/// Age-band selection: an inclusive range over the sorted ordinal domain,
/// or a single band when the domain has collapsed to one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeSelection {
    Single(String),
    Range(String, String),
}

impl AgeSelection {
    /// Build a selection against a sorted age-band domain.
    ///
    /// A one-value domain always forces [`AgeSelection::Single`] on that
    /// value, regardless of the requested bounds - the UI must not offer
    /// a range picker with one option. Otherwise the requested bounds
    /// (or the domain extremes) form an inclusive range.
    pub fn from_domain(domain: &[String], lo: Option<&str>, hi: Option<&str>) -> Self {
        if domain.len() == 1 {
            return AgeSelection::Single(domain[0].clone());
        }

        let lo = lo
            .map(str::to_string)
            .or_else(|| domain.first().cloned())
            .unwrap_or_default();
        let hi = hi
            .map(str::to_string)
            .or_else(|| domain.last().cloned())
            .unwrap_or_default();

        if lo == hi {
            AgeSelection::Single(lo)
        } else {
            AgeSelection::Range(lo, hi)
        }
    }

    /// Inclusive bounds of the selection.
    pub fn bounds(&self) -> (&str, &str) {
        match self {
            AgeSelection::Single(band) => (band, band),
            AgeSelection::Range(lo, hi) => (lo, hi),
        }
    }
}

// =============================================================================
// Selection state
// =============================================================================

/// Everything the user selected for one interaction cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Which measure to sum in every aggregate.
    pub metric: Metric,
    /// Inclusive date range; a reversed range yields an empty table.
    pub date_range: (NaiveDate, NaiveDate),
    /// Customer region, exactly one, required.
    pub customer_region: String,
    /// Merchant regions; empty means all.
    pub merchant_regions: Vec<String>,
    /// Genders; empty means all.
    pub genders: Vec<String>,
    /// Age-band range or forced singleton.
    pub age_bands: AgeSelection,
}

impl Selection {
    /// Default selection for a freshly loaded table: full date range, the
    /// first customer region in sort order, no merchant/gender narrowing,
    /// and the full age-band range.
    pub fn defaults(data: &DataFrame, metric: Metric) -> Result<Self> {
        let date_range = reader::date_span(data)?;
        let customer_domain = column_domain(data, schema::CUSTOMER_REGION)?;
        let customer_region = customer_domain.first().cloned().ok_or_else(|| {
            DashError::Filter("Dataset contains no customer regions".to_string())
        })?;
        let age_domain = column_domain(data, schema::AGE_BAND)?;

        Ok(Self {
            metric,
            date_range,
            customer_region,
            merchant_regions: Vec::new(),
            genders: Vec::new(),
            age_bands: AgeSelection::from_domain(&age_domain, None, None),
        })
    }

    pub fn with_customer_region(mut self, region: impl Into<String>) -> Self {
        self.customer_region = region.into();
        self
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = (start, end);
        self
    }

    pub fn with_merchant_regions(mut self, regions: Vec<String>) -> Self {
        self.merchant_regions = regions;
        self
    }

    pub fn with_genders(mut self, genders: Vec<String>) -> Self {
        self.genders = genders;
        self
    }

    pub fn with_age_bands(mut self, age_bands: AgeSelection) -> Self {
        self.age_bands = age_bands;
        self
    }
}

// =============================================================================
// Widget domains
// =============================================================================

/// Sorted distinct values of a string column, for populating a widget.
pub fn column_domain(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let series = df
        .column(column)
        .map_err(|e| DashError::Filter(format!("Unknown column '{}': {}", column, e)))?
        .as_materialized_series();
    let ca = series
        .str()
        .map_err(|e| DashError::Filter(format!("Column '{}' is not a string column: {}", column, e)))?;

    let values: BTreeSet<String> = ca.into_iter().flatten().map(str::to_string).collect();
    Ok(values.into_iter().collect())
}
