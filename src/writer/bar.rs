//! Bar chart writer
//!
//! Metric total per business category, stacked by age band, over the
//! fully filtered view (all five filter stages). Wider scope than the
//! line chart, which stops after the customer-region stage. Every
//! stacked segment is labeled with its summed value.

use polars::prelude::*;
use serde_json::{json, Value};

use super::{dataframe_to_values, ChartWriter, VEGA_LITE_SCHEMA};
use crate::selection::Metric;
use crate::{schema, Result};

/// Writer for the category × age-band bar chart.
pub struct BarWriter {
    metric: Metric,
}

impl BarWriter {
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }
}

impl ChartWriter for BarWriter {
    fn write(&self, df: &DataFrame) -> Result<Value> {
        let values = dataframe_to_values(df)?;

        Ok(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "data": {"values": values},
            "encoding": {
                "x": {
                    "field": schema::LABEL_CATEGORY,
                    "type": "nominal",
                    "axis": {"title": "업종"},
                },
                "y": {
                    "field": schema::LABEL_TOTAL,
                    "type": "quantitative",
                    "stack": true,
                    "axis": {"title": self.metric.display_label()},
                },
                "color": {
                    "field": schema::LABEL_AGE_BAND,
                    "type": "ordinal",
                    "sort": "ascending",
                    "legend": {"title": "연령대"},
                },
            },
            "layer": [
                {"mark": {"type": "bar", "tooltip": true}},
                {
                    // Each stacked segment carries its summed value as text,
                    // centered between the segment's stack boundaries.
                    "mark": {"type": "text", "color": "black", "baseline": "middle"},
                    "encoding": {
                        "y": {
                            "field": schema::LABEL_TOTAL,
                            "type": "quantitative",
                            "stack": "zero",
                            "bandPosition": 0.5,
                        },
                        "text": {"field": schema::LABEL_TOTAL, "type": "quantitative"},
                    },
                },
            ],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_bar_encodes_category_age_split() {
        let agg = df!(
            schema::LABEL_CATEGORY => ["커피", "한식", "한식"],
            schema::LABEL_AGE_BAND => ["30대", "20대", "40대"],
            schema::LABEL_TOTAL => [4500i64, 12000, 8000],
        )
        .unwrap();
        let spec = BarWriter::new(Metric::Amount).write(&agg).unwrap();

        assert_eq!(spec["encoding"]["x"]["field"], schema::LABEL_CATEGORY);
        assert_eq!(spec["encoding"]["color"]["field"], schema::LABEL_AGE_BAND);
        assert_eq!(spec["encoding"]["color"]["sort"], "ascending");
        assert_eq!(spec["data"]["values"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_bars_stack_by_age() {
        let agg = df!(
            schema::LABEL_CATEGORY => ["한식"],
            schema::LABEL_AGE_BAND => ["20대"],
            schema::LABEL_TOTAL => [1i64],
        )
        .unwrap();
        let spec = BarWriter::new(Metric::Count).write(&agg).unwrap();
        assert_eq!(spec["encoding"]["y"]["stack"], true);
    }

    #[test]
    fn test_segments_carry_value_text_labels() {
        let agg = df!(
            schema::LABEL_CATEGORY => ["한식", "한식"],
            schema::LABEL_AGE_BAND => ["20대", "40대"],
            schema::LABEL_TOTAL => [12000i64, 8000],
        )
        .unwrap();
        let spec = BarWriter::new(Metric::Amount).write(&agg).unwrap();

        let layers = spec["layer"].as_array().unwrap();
        assert_eq!(layers[0]["mark"]["type"], "bar");
        let text = &layers[1];
        assert_eq!(text["mark"]["type"], "text");
        assert_eq!(text["encoding"]["text"]["field"], schema::LABEL_TOTAL);
        // Labels sit midway through their own stacked segment.
        assert_eq!(text["encoding"]["y"]["stack"], "zero");
        assert_eq!(text["encoding"]["y"]["bandPosition"], 0.5);
    }
}
