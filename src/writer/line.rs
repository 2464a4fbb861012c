//! Line chart writer
//!
//! Metric total per age band, drawn over the customer-region view (date
//! and customer-region filters only, the same narrower scope as the map).
//! The x axis follows the sorted ordinal band order; point markers are
//! drawn on the line.

use polars::prelude::*;
use serde_json::{json, Value};

use super::{dataframe_to_values, ChartWriter, VEGA_LITE_SCHEMA};
use crate::selection::Metric;
use crate::{schema, Result};

/// Writer for the age-band trend line.
pub struct LineWriter {
    metric: Metric,
}

impl LineWriter {
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }
}

impl ChartWriter for LineWriter {
    fn write(&self, df: &DataFrame) -> Result<Value> {
        let values = dataframe_to_values(df)?;

        Ok(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "data": {"values": values},
            "mark": {"type": "line", "point": true, "tooltip": true},
            "encoding": {
                "x": {
                    "field": schema::LABEL_AGE_BAND,
                    "type": "ordinal",
                    "sort": "ascending",
                    "axis": {"title": "연령대"},
                },
                "y": {
                    "field": schema::LABEL_TOTAL,
                    "type": "quantitative",
                    "axis": {"title": self.metric.display_label()},
                },
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_line_x_is_sorted_ordinal_age() {
        let agg = df!(
            schema::LABEL_AGE_BAND => ["20대", "30대", "40대"],
            schema::LABEL_TOTAL => [16500i64, 26500, 8000],
        )
        .unwrap();
        let spec = LineWriter::new(Metric::Amount).write(&agg).unwrap();
        assert_eq!(spec["encoding"]["x"]["field"], schema::LABEL_AGE_BAND);
        assert_eq!(spec["encoding"]["x"]["sort"], "ascending");
        assert_eq!(spec["mark"]["point"], true);
        assert_eq!(spec["data"]["values"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_y_axis_titled_by_metric() {
        let agg = df!(
            schema::LABEL_AGE_BAND => ["20대"],
            schema::LABEL_TOTAL => [3i64],
        )
        .unwrap();
        let spec = LineWriter::new(Metric::Count).write(&agg).unwrap();
        assert_eq!(
            spec["encoding"]["y"]["axis"]["title"],
            Metric::Count.display_label()
        );
    }
}
