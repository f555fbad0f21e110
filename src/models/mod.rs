//! Core data models for boundary resolution.

pub mod area;
pub mod boundary;

pub use area::{Area, AreaTable, GeoPoint, TableError};
pub use boundary::{Boundary, BoundaryCollection, BoundarySource};
