//! Boundary resolution with per-area fallback to synthetic squares.

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use tracing::{debug, info, warn};

use crate::matching::{MatchKind, NameMatcher};
use crate::models::{AreaTable, Boundary, BoundaryCollection, BoundarySource};
use crate::overpass::{FetchError, OverpassClient, OverpassOptions, RelationGeometry};

/// Half-width in degrees of the synthetic square around a centroid
pub const DEFAULT_HALF_WIDTH: f64 = 0.005;

/// Which data source backs the returned boundaries
#[derive(Debug)]
pub enum ResolutionOutcome {
    /// Every area has geometry from the service
    Authoritative,
    /// These areas had no usable geometry and were approximated
    PartialFallback { approximated: Vec<String> },
    /// The fetch failed as a whole; every area is approximated
    TotalFallback { error: FetchError },
}

impl ResolutionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionOutcome::Authoritative => "authoritative",
            ResolutionOutcome::PartialFallback { .. } => "partial_fallback",
            ResolutionOutcome::TotalFallback { .. } => "total_fallback",
        }
    }
}

/// Result of an authoritative resolution; always complete
#[derive(Debug)]
pub struct Resolution {
    pub boundaries: BoundaryCollection,
    pub outcome: ResolutionOutcome,
    pub resolved_at: DateTime<Utc>,
}

/// Square approximation for every area in the table
pub fn approximate(table: &AreaTable, half_width: f64) -> BoundaryCollection {
    let mut boundaries = BoundaryCollection::new();
    for area in table.areas() {
        boundaries.insert(area.name.clone(), Boundary::square(area.centroid, half_width));
    }
    boundaries
}

/// Resolves boundaries for a fixed area table
pub struct BoundaryResolver {
    table: AreaTable,
    client: OverpassClient,
    half_width: f64,
}

impl BoundaryResolver {
    pub fn new(
        table: AreaTable,
        options: OverpassOptions,
        half_width: f64,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            table,
            client: OverpassClient::new(options)?,
            half_width,
        })
    }

    /// Centroid table this resolver covers
    pub fn areas(&self) -> &AreaTable {
        &self.table
    }

    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    /// Synthetic squares for every area. Never fails, no I/O.
    pub fn resolve_approximate(&self) -> BoundaryCollection {
        approximate(&self.table, self.half_width)
    }

    /// Fetch real boundaries, approximating each area the service could not supply.
    ///
    /// Failures never surface as errors; they are reported in the outcome.
    pub async fn resolve_authoritative(&self) -> Resolution {
        let relations = match self.client.fetch_relations(&self.table).await {
            Ok(r) => r,
            Err(error) => {
                warn!(
                    "Boundary fetch from {} failed, using approximate boundaries: {}",
                    self.client.endpoint(),
                    error
                );
                return Resolution {
                    boundaries: self.resolve_approximate(),
                    outcome: ResolutionOutcome::TotalFallback { error },
                    resolved_at: Utc::now(),
                };
            }
        };

        let matcher = NameMatcher::new(&self.table);
        let mut found: HashMap<&str, (MatchKind, Boundary)> = HashMap::new();

        for relation in relations {
            let Some(service_name) = relation.name.as_deref() else {
                debug!("Relation {} has no name, skipping", relation.id);
                continue;
            };

            let Some((local, kind)) = matcher.resolve(service_name) else {
                debug!("Relation {} ({:?}) matches no known area", relation.id, service_name);
                continue;
            };

            // Keep the strongest match per area; ties go to the first relation
            if let Some((existing, _)) = found.get(local) {
                if *existing <= kind {
                    continue;
                }
            }

            let coords = match relation.geometry {
                RelationGeometry::Ring(coords) => coords,
                other => {
                    debug!(
                        "Relation {} for {:?} has unusable geometry: {:?}",
                        relation.id, local, other
                    );
                    continue;
                }
            };

            let source = BoundarySource::Authoritative {
                relation_id: relation.id,
                matched_as: (kind != MatchKind::Exact).then(|| service_name.to_string()),
            };

            match Boundary::from_coords(coords, source) {
                Some(boundary) => {
                    if kind != MatchKind::Exact {
                        debug!("Matched {:?} to service name {:?} ({:?})", local, service_name, kind);
                    }
                    found.insert(local, (kind, boundary));
                }
                None => debug!("Relation {} for {:?} has too few points", relation.id, local),
            }
        }

        let mut boundaries = BoundaryCollection::new();
        let mut approximated = Vec::new();

        for area in self.table.areas() {
            match found.remove(area.name.as_str()) {
                Some((_, boundary)) => boundaries.insert(area.name.clone(), boundary),
                None => {
                    debug!("No authoritative boundary for {:?}, approximating", area.name);
                    approximated.push(area.name.clone());
                    boundaries.insert(
                        area.name.clone(),
                        Boundary::square(area.centroid, self.half_width),
                    );
                }
            }
        }

        info!(
            "Resolved {} boundaries ({} authoritative, {} approximate)",
            boundaries.len(),
            boundaries.len() - approximated.len(),
            approximated.len()
        );

        let outcome = if approximated.is_empty() {
            ResolutionOutcome::Authoritative
        } else {
            ResolutionOutcome::PartialFallback { approximated }
        };

        Resolution {
            boundaries,
            outcome,
            resolved_at: Utc::now(),
        }
    }
}
