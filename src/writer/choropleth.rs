//! Choropleth map writer
//!
//! Shades Seoul's districts by the metric total per merchant region. The
//! input aggregate is computed over the customer-region view only (date +
//! customer-region filters) - the map always shows the full spread of
//! merchant regions for the selected customer region, deliberately
//! bypassing the merchant/gender/age filters.
//!
//! Join semantics:
//! - aggregate region names are trimmed, geometry names arrive already
//!   normalized; the join is exact string equality
//! - districts present in geometry with no aggregate row are rendered
//!   fully transparent (value `null`, fill opacity 0) - transparent, not
//!   zero-colored, so the map never implies "zero spend" where data was
//!   merely filtered out
//! - aggregate rows with no geometry match are dropped from the map only
//!   and logged for diagnostics

use std::collections::HashMap;

use polars::prelude::*;
use serde_json::{json, Value};

use super::{ChartWriter, VEGA_LITE_SCHEMA};
use crate::reader::geometry::DistrictGeometry;
use crate::selection::Metric;
use crate::{schema, DashError, Result};

/// Writer joining a merchant-region aggregate against district geometry.
pub struct ChoroplethWriter<'a> {
    geometry: &'a DistrictGeometry,
    metric: Metric,
}

impl<'a> ChoroplethWriter<'a> {
    pub fn new(geometry: &'a DistrictGeometry, metric: Metric) -> Self {
        Self { geometry, metric }
    }

    /// Region name → metric total, with names trimmed for the join.
    fn totals_by_region(&self, df: &DataFrame) -> Result<HashMap<String, f64>> {
        let regions = df
            .column(schema::LABEL_REGION)
            .map_err(|e| DashError::Writer(format!("Aggregate lacks region column: {}", e)))?
            .as_materialized_series()
            .str()
            .map_err(|e| DashError::Writer(format!("Region column is not a string: {}", e)))?
            .clone();
        let totals = df
            .column(schema::LABEL_TOTAL)
            .map_err(|e| DashError::Writer(format!("Aggregate lacks total column: {}", e)))?
            .as_materialized_series()
            .cast(&DataType::Float64)
            .map_err(|e| DashError::Writer(format!("Total column is not numeric: {}", e)))?;
        let totals = totals
            .f64()
            .map_err(|e| DashError::Writer(format!("Total column cast failed: {}", e)))?
            .clone();

        let mut map = HashMap::new();
        for (region, total) in regions.into_iter().zip(totals.into_iter()) {
            if let (Some(region), Some(total)) = (region, total) {
                map.insert(region.trim().to_string(), total);
            }
        }
        Ok(map)
    }
}

impl ChartWriter for ChoroplethWriter<'_> {
    fn write(&self, df: &DataFrame) -> Result<Value> {
        let totals = self.totals_by_region(df)?;

        // Aggregate rows with no polygon are excluded from the map only;
        // they stay in every table view and export.
        for region in totals.keys() {
            if !self.geometry.contains(region) {
                log::warn!(
                    "geometry join miss: merchant region '{}' has no district polygon",
                    region
                );
            }
        }

        let mut features = Vec::with_capacity(self.geometry.len());
        for (name, feature) in self.geometry.districts() {
            let mut feature_json = serde_json::to_value(feature)
                .map_err(|e| DashError::Writer(format!("Failed to serialize feature: {}", e)))?;
            let value = match totals.get(name) {
                Some(total) => json!(total),
                None => Value::Null,
            };
            if let Some(props) = feature_json
                .get_mut("properties")
                .and_then(|p| p.as_object_mut())
            {
                props.insert("value".to_string(), value);
            }
            features.push(feature_json);
        }

        Ok(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "width": 700,
            "height": 500,
            "data": {
                "values": {
                    "type": "FeatureCollection",
                    "features": features,
                },
                "format": {"type": "json", "property": "features"},
            },
            "projection": {"type": "mercator"},
            "mark": {"type": "geoshape", "stroke": "#666666", "strokeOpacity": 0.5},
            "encoding": {
                "color": {
                    "field": "properties.value",
                    "type": "quantitative",
                    "scale": {"scheme": "yellowgreenblue"},
                    "legend": {"title": self.metric.display_label()},
                },
                "opacity": {
                    "condition": {
                        "test": "datum['properties']['value'] === null",
                        "value": 0,
                    },
                    "value": 0.7,
                },
                "tooltip": [
                    {"field": format!("properties.{}", schema::GEOMETRY_NAME_KEY), "type": "nominal", "title": "가맹점 위치"},
                    {"field": "properties.value", "type": "quantitative", "title": self.metric.display_label()},
                ],
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::geometry::tests::sample_geojson;
    use polars::df;

    fn geometry() -> DistrictGeometry {
        DistrictGeometry::from_str(&sample_geojson()).unwrap()
    }

    fn aggregate() -> DataFrame {
        df!(
            schema::LABEL_REGION => ["마포구", "은평구"],
            schema::LABEL_TOTAL => [12000i64, 9000],
        )
        .unwrap()
    }

    #[test]
    fn test_matched_district_gets_value() {
        let geometry = geometry();
        let writer = ChoroplethWriter::new(&geometry, Metric::Amount);
        let spec = writer.write(&aggregate()).unwrap();

        let features = spec["data"]["values"]["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        let mapo = features
            .iter()
            .find(|f| f["properties"][schema::GEOMETRY_NAME_KEY] == "마포구")
            .unwrap();
        assert_eq!(mapo["properties"]["value"], 12000.0);
    }

    #[test]
    fn test_unmatched_district_is_transparent_but_present() {
        let geometry = geometry();
        let writer = ChoroplethWriter::new(&geometry, Metric::Amount);
        let spec = writer.write(&aggregate()).unwrap();

        // 종로구 has geometry but no aggregate row: present, value null,
        // and the opacity encoding zeroes the fill for null values.
        let features = spec["data"]["values"]["features"].as_array().unwrap();
        let jongno = features
            .iter()
            .find(|f| f["properties"][schema::GEOMETRY_NAME_KEY] == "종로구")
            .unwrap();
        assert_eq!(jongno["properties"]["value"], Value::Null);
        assert_eq!(spec["encoding"]["opacity"]["condition"]["value"], 0);
    }

    #[test]
    fn test_aggregate_row_without_geometry_is_dropped_from_map() {
        let geometry = geometry();
        let writer = ChoroplethWriter::new(&geometry, Metric::Amount);
        let spec = writer.write(&aggregate()).unwrap();

        // 은평구 is in the aggregate but not in the geometry: the map
        // carries exactly the geometry's features, nothing more.
        let features = spec["data"]["values"]["features"].as_array().unwrap();
        assert!(features
            .iter()
            .all(|f| f["properties"][schema::GEOMETRY_NAME_KEY] != "은평구"));
    }

    #[test]
    fn test_empty_aggregate_renders_fully_transparent_map() {
        let geometry = geometry();
        let writer = ChoroplethWriter::new(&geometry, Metric::Count);
        let empty = aggregate().head(Some(0));
        let spec = writer.write(&empty).unwrap();

        let features = spec["data"]["values"]["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert!(features
            .iter()
            .all(|f| f["properties"]["value"] == Value::Null));
    }

    #[test]
    fn test_trimmed_region_names_join() {
        let geometry = geometry();
        let writer = ChoroplethWriter::new(&geometry, Metric::Amount);
        let agg = df!(
            schema::LABEL_REGION => [" 마포구 "],
            schema::LABEL_TOTAL => [500i64],
        )
        .unwrap();
        let spec = writer.write(&agg).unwrap();
        let features = spec["data"]["values"]["features"].as_array().unwrap();
        let mapo = features
            .iter()
            .find(|f| f["properties"][schema::GEOMETRY_NAME_KEY] == "마포구")
            .unwrap();
        assert_eq!(mapo["properties"]["value"], 500.0);
    }
}
