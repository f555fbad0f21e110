use geo_types::Coord;
use hashbrown::HashMap;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<serde_json::Value>,
    /// Set by the interpreter on runtime errors such as query timeouts
    #[serde(default)]
    remark: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    members: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    role: String,
    geometry: Option<Vec<RawPoint>>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    lat: f64,
    lon: f64,
}

/// Geometry recovered from one relation
#[derive(Debug, Clone, PartialEq)]
pub enum RelationGeometry {
    /// Concatenated outer way coordinates, not yet closed
    Ring(Vec<Coord<f64>>),
    /// A member could not be decoded or lacked geometry
    Malformed,
    /// No outer way coordinates at all
    Empty,
}

/// A boundary relation from the response
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRelation {
    pub id: i64,
    pub name: Option<String>,
    pub geometry: RelationGeometry,
}

/// Decoded interpreter response
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub relations: Vec<ParsedRelation>,
    pub remark: Option<String>,
}

impl ParsedResponse {
    /// A remark that means the query did not run to completion.
    ///
    /// Overpass reports server-side timeouts and memory limits as a 200
    /// with a `runtime error` remark and truncated (usually empty) elements.
    pub fn failure_remark(&self) -> Option<&str> {
        let remark = self.remark.as_deref()?;
        if self.relations.is_empty() || remark.trim_start().starts_with("runtime error") {
            Some(remark)
        } else {
            None
        }
    }
}

/// Parse an Overpass JSON body into boundary relations.
///
/// Fails only when the body is not JSON or has no `elements` array.
/// Elements that are not relations, or do not decode, are skipped.
pub fn parse_response(body: &str) -> Result<ParsedResponse, serde_json::Error> {
    let response: OverpassResponse = serde_json::from_str(body)?;

    let mut relations = Vec::new();
    for value in response.elements {
        let element: RawElement = match serde_json::from_value(value) {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping undecodable element: {}", e);
                continue;
            }
        };

        if element.kind != "relation" {
            continue;
        }

        let geometry = relation_geometry(&element.members);
        relations.push(ParsedRelation {
            id: element.id,
            name: element.tags.get("name").cloned(),
            geometry,
        });
    }

    Ok(ParsedResponse {
        relations,
        remark: response.remark,
    })
}

fn relation_geometry(members: &[serde_json::Value]) -> RelationGeometry {
    let mut coords = Vec::new();

    for value in members {
        let member: RawMember = match serde_json::from_value(value.clone()) {
            Ok(m) => m,
            Err(_) => return RelationGeometry::Malformed,
        };

        // Only outer ways form the boundary (nodes are labels/admin centres)
        if member.kind != "way" || !(member.role == "outer" || member.role.is_empty()) {
            continue;
        }

        match member.geometry {
            Some(points) if !points.is_empty() => {
                coords.extend(points.into_iter().map(|p| Coord { x: p.lon, y: p.lat }));
            }
            _ => return RelationGeometry::Malformed,
        }
    }

    if coords.is_empty() {
        RelationGeometry::Empty
    } else {
        RelationGeometry::Ring(coords)
    }
}
