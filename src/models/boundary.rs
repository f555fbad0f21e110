//! Boundary rings and the per-area boundary collection.

use geo_types::{Coord, LineString};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::GeoPoint;

/// Where a boundary's geometry came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundarySource {
    /// Real geometry from the geometry service
    Authoritative {
        /// OSM relation ID
        relation_id: i64,
        /// Name the service used, when it differs from the local name
        #[serde(skip_serializing_if = "Option::is_none")]
        matched_as: Option<String>,
    },
    /// Square synthesized around the centroid
    Approximate,
}

/// A closed boundary ring.
///
/// Coordinates are stored as `x = lon, y = lat`; the first and last
/// coordinate are always identical.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Boundary {
    #[serde(serialize_with = "serialize_ring_lat_lon")]
    ring: LineString<f64>,
    pub source: BoundarySource,
}

impl Boundary {
    /// Build a boundary from an open or closed coordinate sequence.
    ///
    /// Returns None when fewer than 3 coordinates are given.
    pub fn from_coords(mut coords: Vec<Coord<f64>>, source: BoundarySource) -> Option<Self> {
        if coords.len() < 3 {
            return None;
        }
        let first = coords[0];
        if coords.last() != Some(&first) {
            coords.push(first);
        }
        Some(Self {
            ring: LineString::new(coords),
            source,
        })
    }

    /// Square ring centred on `center` with the given half-width in degrees
    pub fn square(center: GeoPoint, half_width: f64) -> Self {
        let GeoPoint { lat, lon } = center;
        let r = half_width;
        let corners = [
            (lat - r, lon - r),
            (lat - r, lon + r),
            (lat + r, lon + r),
            (lat + r, lon - r),
            (lat - r, lon - r),
        ];
        Self {
            ring: corners
                .iter()
                .map(|&(lat, lon)| Coord { x: lon, y: lat })
                .collect(),
            source: BoundarySource::Approximate,
        }
    }

    pub fn ring(&self) -> &LineString<f64> {
        &self.ring
    }

    /// Ring as (lat, lon) points
    pub fn points(&self) -> Vec<GeoPoint> {
        self.ring
            .coords()
            .map(|c| GeoPoint::new(c.y, c.x))
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.ring.is_closed()
    }

    pub fn is_authoritative(&self) -> bool {
        matches!(self.source, BoundarySource::Authoritative { .. })
    }
}

fn serialize_ring_lat_lon<S: Serializer>(
    ring: &LineString<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(ring.0.len()))?;
    for c in ring.coords() {
        seq.serialize_element(&[c.y, c.x])?;
    }
    seq.end()
}

/// Area name → boundary, kept in area table order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryCollection {
    entries: Vec<(String, Boundary)>,
}

impl BoundaryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the boundary for `name`
    pub fn insert(&mut self, name: impl Into<String>, boundary: Boundary) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = boundary,
            None => self.entries.push((name, boundary)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Boundary> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Boundary)> {
        self.entries.iter().map(|(n, b)| (n.as_str(), b))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn authoritative_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, b)| b.is_authoritative())
            .count()
    }
}

impl Serialize for BoundaryCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, boundary) in &self.entries {
            map.serialize_entry(name, boundary)?;
        }
        map.end()
    }
}
