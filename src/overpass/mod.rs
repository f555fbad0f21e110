//! Overpass API client and codec.
//!
//! Builds the boundary query for an area table, posts it to the
//! interpreter endpoint, and turns the returned relations into rings.

mod client;
mod error;
mod query;
mod response;

pub use client::{OverpassClient, OverpassOptions, DEFAULT_ENDPOINT};
pub use error::FetchError;
pub use query::build_boundary_query;
pub use response::{parse_response, ParsedRelation, ParsedResponse, RelationGeometry};
