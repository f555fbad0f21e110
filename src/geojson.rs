//! GeoJSON export for map display.

use geo::BoundingRect;
use serde::Serialize;

use crate::models::{AreaTable, BoundaryCollection, BoundarySource, GeoPoint};

#[derive(Debug, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub geo_type: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub geo_type: &'static str,
    /// [minLon, minLat, maxLon, maxLat]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    pub geometry: PolygonGeometry,
    pub properties: FeatureProperties,
}

#[derive(Debug, Serialize)]
pub struct PolygonGeometry {
    #[serde(rename = "type")]
    pub geo_type: &'static str,
    /// One exterior ring of [lon, lat] positions
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Serialize)]
pub struct FeatureProperties {
    pub name: String,
    pub source: BoundarySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<GeoPoint>,
}

/// Convert a boundary collection into a GeoJSON FeatureCollection.
///
/// Centroids are attached when the area is present in `table`.
pub fn to_feature_collection(
    boundaries: &BoundaryCollection,
    table: Option<&AreaTable>,
) -> FeatureCollection {
    let features = boundaries
        .iter()
        .map(|(name, boundary)| {
            let ring: Vec<[f64; 2]> = boundary.ring().coords().map(|c| [c.x, c.y]).collect();
            let bbox = boundary
                .ring()
                .bounding_rect()
                .map(|rect| [rect.min().x, rect.min().y, rect.max().x, rect.max().y]);

            Feature {
                geo_type: "Feature",
                bbox,
                geometry: PolygonGeometry {
                    geo_type: "Polygon",
                    coordinates: vec![ring],
                },
                properties: FeatureProperties {
                    name: name.to_string(),
                    source: boundary.source.clone(),
                    centroid: table.and_then(|t| t.get(name)).map(|a| a.centroid),
                },
            }
        })
        .collect();

    FeatureCollection {
        geo_type: "FeatureCollection",
        features,
    }
}
