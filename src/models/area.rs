//! Area records and the immutable centroid table.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A named sub-area (barangay) of a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// Unique display name, also the key of every boundary collection
    pub name: String,

    /// Representative point used for markers and approximate polygons
    pub centroid: GeoPoint,

    /// Alternative spellings accepted when matching geometry service names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl Area {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            centroid: GeoPoint::new(lat, lon),
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("area table for {region:?} has no areas")]
    Empty { region: String },

    #[error("duplicate area name {0:?}")]
    DuplicateName(String),

    #[error("area {name:?} has out of range centroid ({lat}, {lon})")]
    InvalidCentroid { name: String, lat: f64, lon: f64 },

    #[error("area name must not be blank")]
    BlankName,
}

/// The fixed set of areas for one city region.
///
/// Built once and never mutated; the resolver borrows its order for
/// deterministic output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaTable {
    region: String,
    areas: Vec<Area>,
}

impl AreaTable {
    pub fn new(region: impl Into<String>, areas: Vec<Area>) -> Result<Self, TableError> {
        let region = region.into();
        if areas.is_empty() {
            return Err(TableError::Empty { region });
        }

        let mut seen = HashSet::new();
        for area in &areas {
            if area.name.trim().is_empty() {
                return Err(TableError::BlankName);
            }
            if !seen.insert(area.name.as_str()) {
                return Err(TableError::DuplicateName(area.name.clone()));
            }
            if !area.centroid.is_valid() {
                return Err(TableError::InvalidCentroid {
                    name: area.name.clone(),
                    lat: area.centroid.lat,
                    lon: area.centroid.lon,
                });
            }
        }

        Ok(Self { region, areas })
    }

    /// Barangays of Koronadal City, South Cotabato
    pub fn koronadal() -> Self {
        let areas = vec![
            Area::new("General Paulino Santos", 6.5125, 124.8520)
                .with_aliases(["General Paulino", "GPS"]),
            Area::new("Morales", 6.5030, 124.8350),
            Area::new("Santa Cruz", 6.4930, 124.8570),
            Area::new("Sto. Niño", 6.5050, 124.8680)
                .with_aliases(["Santo Niño", "Sto Niño", "St. Niño"]),
            Area::new("Zone II", 6.4990, 124.8460).with_aliases(["Zone 2", "Zone2"]),
        ];

        Self {
            region: "Koronadal".to_string(),
            areas,
        }
    }

    /// City region the external query is scoped to
    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn get(&self, name: &str) -> Option<&Area> {
        self.areas.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.areas.iter().map(|a| a.name.as_str())
    }

    /// Name → centroid pairs in table order
    pub fn centroids(&self) -> Vec<(&str, GeoPoint)> {
        self.areas
            .iter()
            .map(|a| (a.name.as_str(), a.centroid))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}
