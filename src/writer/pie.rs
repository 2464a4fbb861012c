//! Pie chart writer
//!
//! Metric share per merchant region over the fully filtered view. Drawn
//! as a donut with outside slice labels; every region is shown regardless
//! of size (no minimum-slice threshold).

use polars::prelude::*;
use serde_json::{json, Value};

use super::{dataframe_to_values, ChartWriter, VEGA_LITE_SCHEMA};
use crate::selection::Metric;
use crate::{schema, Result};

/// Writer for the merchant-region share pie.
pub struct PieWriter {
    metric: Metric,
}

impl PieWriter {
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }
}

impl ChartWriter for PieWriter {
    fn write(&self, df: &DataFrame) -> Result<Value> {
        let values = dataframe_to_values(df)?;

        Ok(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "data": {"values": values},
            "encoding": {
                "theta": {"field": schema::LABEL_TOTAL, "type": "quantitative", "stack": true},
                // The legend enumerates regions; the metric belongs on the
                // tooltip, so the field label is title enough.
                "color": {"field": schema::LABEL_REGION, "type": "nominal"},
                "tooltip": [
                    {"field": schema::LABEL_REGION, "type": "nominal"},
                    {"field": schema::LABEL_TOTAL, "type": "quantitative", "title": self.metric.display_label()},
                ],
            },
            "layer": [
                {"mark": {"type": "arc", "innerRadius": 60, "outerRadius": 110}},
                {
                    "mark": {"type": "text", "radius": 130},
                    "encoding": {"text": {"field": schema::LABEL_REGION, "type": "nominal"}},
                },
            ],
        }))
    }
}
