//! Barangay boundary resolution for city maps.
//!
//! Fetches administrative boundary polygons from the Overpass API and
//! fills any gaps with square approximations around known centroids, so
//! callers always get a complete, renderable set.

pub mod config;
pub mod geojson;
pub mod matching;
pub mod models;
pub mod overpass;
pub mod resolver;

use std::sync::LazyLock;

pub use models::{Area, AreaTable, Boundary, BoundaryCollection, BoundarySource, GeoPoint};
pub use resolver::{
    approximate, BoundaryResolver, Resolution, ResolutionOutcome, DEFAULT_HALF_WIDTH,
};

static DEFAULT_AREAS: LazyLock<AreaTable> = LazyLock::new(AreaTable::koronadal);

static DEFAULT_BOUNDARIES: LazyLock<BoundaryCollection> =
    LazyLock::new(|| approximate(&DEFAULT_AREAS, DEFAULT_HALF_WIDTH));

/// Built-in centroid table (Koronadal City)
pub fn default_areas() -> &'static AreaTable {
    &DEFAULT_AREAS
}

/// Approximate boundaries for the built-in table, computed on first use
pub fn default_boundaries() -> &'static BoundaryCollection {
    &DEFAULT_BOUNDARIES
}
