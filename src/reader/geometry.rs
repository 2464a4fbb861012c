//! District geometry resource
//!
//! Loads the Seoul administrative-district GeoJSON and normalizes every
//! feature's `SGG_NM` property (trim whitespace, strip the city prefix)
//! so the choropleth writer can join aggregates by plain name equality.
//!
//! The resource is identical for every session and never mutated, so
//! [`load_geojson_cached`] keeps one parsed copy per path for the life of
//! the process.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use geojson::{FeatureCollection, GeoJson, Value};

use crate::{schema, DashError, Result};

/// Parsed district polygons keyed by normalized district name.
///
/// Read-only after construction; the `SGG_NM` property of every stored
/// feature already holds the normalized name.
#[derive(Debug, Clone)]
pub struct DistrictGeometry {
    collection: FeatureCollection,
    names: Vec<String>,
}

impl DistrictGeometry {
    /// Parse a GeoJSON FeatureCollection from text.
    ///
    /// Every feature must carry a string `SGG_NM` property and polygon
    /// geometry; anything else means the resource file is corrupt.
    pub fn from_str(text: &str) -> Result<Self> {
        let geojson: GeoJson = text
            .parse()
            .map_err(|e| DashError::Geometry(format!("Failed to parse GeoJSON: {}", e)))?;

        let mut collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            _ => {
                return Err(DashError::Geometry(
                    "Expected a GeoJSON FeatureCollection".to_string(),
                ))
            }
        };

        let mut names = Vec::with_capacity(collection.features.len());
        for (idx, feature) in collection.features.iter_mut().enumerate() {
            match &feature.geometry {
                Some(geometry) => match &geometry.value {
                    Value::Polygon(_) | Value::MultiPolygon(_) => {}
                    _ => {
                        return Err(DashError::Geometry(format!(
                            "Feature {} has non-polygon geometry",
                            idx
                        )))
                    }
                },
                None => {
                    return Err(DashError::Geometry(format!(
                        "Feature {} has no geometry",
                        idx
                    )))
                }
            }

            let raw_name = feature
                .properties
                .as_ref()
                .and_then(|props| props.get(schema::GEOMETRY_NAME_KEY))
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    DashError::Geometry(format!(
                        "Feature {} is missing a string '{}' property",
                        idx,
                        schema::GEOMETRY_NAME_KEY
                    ))
                })?;

            let normalized = schema::normalize_district(raw_name);
            if let Some(props) = feature.properties.as_mut() {
                props.insert(
                    schema::GEOMETRY_NAME_KEY.to_string(),
                    serde_json::Value::String(normalized.clone()),
                );
            }
            names.push(normalized);
        }

        Ok(Self { collection, names })
    }

    /// Normalized district names, in feature order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether a normalized district name is present in the geometry.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Number of district features.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the geometry holds no districts.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate (normalized name, feature) pairs in feature order.
    pub fn districts(&self) -> impl Iterator<Item = (&str, &geojson::Feature)> {
        self.names
            .iter()
            .map(|n| n.as_str())
            .zip(self.collection.features.iter())
    }
}

/// Load district geometry from a GeoJSON file.
pub fn load_geojson(path: impl AsRef<Path>) -> Result<DistrictGeometry> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| DashError::Geometry(format!("Failed to read {}: {}", path.display(), e)))?;
    DistrictGeometry::from_str(&text)
}

/// Process-wide cache of parsed geometry, one entry per path.
static GEOMETRY_CACHE: OnceLock<Mutex<HashMap<PathBuf, Arc<DistrictGeometry>>>> = OnceLock::new();

/// Load district geometry through the process-wide cache.
///
/// The resource is the same for every session and input, so repeated
/// loads of the same path return the already-parsed copy.
pub fn load_geojson_cached(path: impl AsRef<Path>) -> Result<Arc<DistrictGeometry>> {
    let path = path.as_ref().to_path_buf();
    let cache = GEOMETRY_CACHE.get_or_init(|| Mutex::new(HashMap::new()));

    let mut cache = cache
        .lock()
        .map_err(|_| DashError::Geometry("Geometry cache lock poisoned".to_string()))?;
    if let Some(geometry) = cache.get(&path) {
        return Ok(Arc::clone(geometry));
    }

    let geometry = Arc::new(load_geojson(&path)?);
    cache.insert(path, Arc::clone(&geometry));
    Ok(geometry)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two-district GeoJSON with city-prefixed names, as in the real file.
    pub(crate) fn sample_geojson() -> String {
        r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"SGG_NM": "서울특별시 마포구", "SGG_CD": "11440"},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[126.9, 37.55], [126.95, 37.55], [126.95, 37.58], [126.9, 37.55]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": {"SGG_NM": "서울특별시 종로구", "SGG_CD": "11110"},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[126.96, 37.57], [127.0, 37.57], [127.0, 37.6], [126.96, 37.57]]]
                    }
                }
            ]
        }"#
        .to_string()
    }

    #[test]
    fn test_names_are_normalized() {
        let geometry = DistrictGeometry::from_str(&sample_geojson()).unwrap();
        assert_eq!(geometry.names(), &["마포구", "종로구"]);
        assert!(geometry.contains("마포구"));
        assert!(!geometry.contains("서울특별시 마포구"));
    }

    #[test]
    fn test_features_carry_normalized_property() {
        let geometry = DistrictGeometry::from_str(&sample_geojson()).unwrap();
        for (name, feature) in geometry.districts() {
            let prop = feature
                .properties
                .as_ref()
                .and_then(|p| p.get(schema::GEOMETRY_NAME_KEY))
                .and_then(|v| v.as_str())
                .unwrap();
            assert_eq!(prop, name);
        }
    }

    #[test]
    fn test_missing_name_property_is_rejected() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}
            }]
        }"#;
        let result = DistrictGeometry::from_str(text);
        assert!(matches!(result, Err(DashError::Geometry(_))));
    }

    #[test]
    fn test_non_polygon_geometry_is_rejected() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"SGG_NM": "마포구"},
                "geometry": {"type": "Point", "coordinates": [126.9, 37.55]}
            }]
        }"#;
        let result = DistrictGeometry::from_str(text);
        assert!(matches!(result, Err(DashError::Geometry(_))));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            DistrictGeometry::from_str("not geojson"),
            Err(DashError::Geometry(_))
        ));
    }
}
