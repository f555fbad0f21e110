use std::time::Duration;

use httpmock::prelude::*;
use serde_json::{json, Value};

use barangay_bounds::overpass::{FetchError, OverpassOptions};
use barangay_bounds::{
    approximate, AreaTable, BoundaryResolver, BoundarySource, GeoPoint, ResolutionOutcome,
    DEFAULT_HALF_WIDTH,
};

const INTERPRETER_PATH: &str = "/api/interpreter";

fn resolver_for(endpoint: String) -> BoundaryResolver {
    let options = OverpassOptions {
        endpoint,
        request_timeout: Duration::from_secs(5),
        ..OverpassOptions::default()
    };
    BoundaryResolver::new(AreaTable::koronadal(), options, DEFAULT_HALF_WIDTH).unwrap()
}

/// Relation whose ring is split over two outer ways
fn relation(id: i64, name: &str, lat: f64, lon: f64) -> Value {
    json!({
        "type": "relation",
        "id": id,
        "tags": {"boundary": "administrative", "admin_level": "10", "name": name},
        "members": [
            {"type": "way", "ref": id * 10, "role": "outer", "geometry": [
                {"lat": lat - 0.01, "lon": lon - 0.01},
                {"lat": lat - 0.01, "lon": lon + 0.01}
            ]},
            {"type": "way", "ref": id * 10 + 1, "role": "outer", "geometry": [
                {"lat": lat + 0.01, "lon": lon + 0.01},
                {"lat": lat + 0.01, "lon": lon - 0.01}
            ]},
            {"type": "node", "ref": id * 100, "role": "admin_centre", "lat": lat, "lon": lon}
        ]
    })
}

fn overpass_body(elements: Vec<Value>) -> Value {
    json!({
        "version": 0.6,
        "generator": "Overpass API",
        "elements": elements
    })
}

#[tokio::test]
async fn test_unreachable_source_equals_approximate() {
    let resolver = resolver_for(format!("http://127.0.0.1:1{}", INTERPRETER_PATH));

    let resolution = resolver.resolve_authoritative().await;

    assert_eq!(resolution.boundaries, resolver.resolve_approximate());
    assert!(matches!(
        resolution.outcome,
        ResolutionOutcome::TotalFallback {
            error: FetchError::Transport(_)
        }
    ));
}

#[tokio::test]
async fn test_partial_geometry_fills_remaining_areas() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(INTERPRETER_PATH)
            .header("content-type", "application/x-www-form-urlencoded")
            .body_contains("data=");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(overpass_body(vec![
                relation(1, "Morales", 6.5030, 124.8350),
                relation(2, "Santa Cruz", 6.4930, 124.8570),
                relation(3, "Somewhere Else", 7.0, 125.0),
            ]));
    });

    let resolver = resolver_for(server.url(INTERPRETER_PATH));
    let resolution = resolver.resolve_authoritative().await;
    mock.assert();

    let boundaries = &resolution.boundaries;
    assert!(resolver.areas().names().eq(boundaries.names()));
    assert_eq!(boundaries.len(), 5);
    assert_eq!(boundaries.authoritative_count(), 2);

    let morales = boundaries.get("Morales").unwrap();
    assert_eq!(
        morales.source,
        BoundarySource::Authoritative {
            relation_id: 1,
            matched_as: None
        }
    );
    // 4 way points plus the closing point
    assert_eq!(morales.points().len(), 5);
    assert!(morales.is_closed());
    assert_eq!(morales.points()[0], GeoPoint::new(6.5030 - 0.01, 124.8350 - 0.01));

    let approximate = resolver.resolve_approximate();
    for name in ["General Paulino Santos", "Sto. Niño", "Zone II"] {
        assert_eq!(boundaries.get(name), approximate.get(name), "{}", name);
    }

    match &resolution.outcome {
        ResolutionOutcome::PartialFallback { approximated } => {
            assert_eq!(
                approximated,
                &vec![
                    "General Paulino Santos".to_string(),
                    "Sto. Niño".to_string(),
                    "Zone II".to_string()
                ]
            );
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_all_areas_found_is_authoritative() {
    let table = AreaTable::koronadal();
    let elements = table
        .areas()
        .iter()
        .enumerate()
        .map(|(i, a)| relation(i as i64 + 1, &a.name, a.centroid.lat, a.centroid.lon))
        .collect();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(INTERPRETER_PATH);
        then.status(200).json_body(overpass_body(elements));
    });

    let resolver = resolver_for(server.url(INTERPRETER_PATH));
    let resolution = resolver.resolve_authoritative().await;

    assert!(matches!(resolution.outcome, ResolutionOutcome::Authoritative));
    assert_eq!(resolution.boundaries.authoritative_count(), 5);
}

#[tokio::test]
async fn test_non_json_body_falls_back_entirely() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(INTERPRETER_PATH);
        then.status(200)
            .header("content-type", "text/html")
            .body("<html><body>rate_limited</body></html>");
    });

    let resolver = resolver_for(server.url(INTERPRETER_PATH));
    let resolution = resolver.resolve_authoritative().await;

    assert_eq!(resolution.boundaries, resolver.resolve_approximate());
    assert!(matches!(
        resolution.outcome,
        ResolutionOutcome::TotalFallback {
            error: FetchError::Parse(_)
        }
    ));
}

#[tokio::test]
async fn test_error_status_falls_back_entirely() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(INTERPRETER_PATH);
        then.status(429).body("Too Many Requests");
    });

    let resolver = resolver_for(server.url(INTERPRETER_PATH));
    let resolution = resolver.resolve_authoritative().await;

    assert_eq!(resolution.boundaries, approximate(resolver.areas(), DEFAULT_HALF_WIDTH));
    match resolution.outcome {
        ResolutionOutcome::TotalFallback {
            error: FetchError::Status { status },
        } => assert_eq!(status.as_u16(), 429),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_stalled_source_times_out() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(INTERPRETER_PATH);
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(overpass_body(vec![]));
    });

    let options = OverpassOptions {
        endpoint: server.url(INTERPRETER_PATH),
        request_timeout: Duration::from_millis(200),
        ..OverpassOptions::default()
    };
    let resolver =
        BoundaryResolver::new(AreaTable::koronadal(), options, DEFAULT_HALF_WIDTH).unwrap();

    let resolution = resolver.resolve_authoritative().await;

    assert_eq!(resolution.boundaries, resolver.resolve_approximate());
    match &resolution.outcome {
        ResolutionOutcome::TotalFallback { error } => assert!(error.is_timeout(), "{}", error),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_server_side_timeout_remark_falls_back_entirely() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(INTERPRETER_PATH);
        then.status(200).json_body(json!({
            "version": 0.6,
            "generator": "Overpass API",
            "elements": [],
            "remark": "runtime error: Query timed out in \"query\" at line 3 after 26 seconds."
        }));
    });

    let resolver = resolver_for(server.url(INTERPRETER_PATH));
    let resolution = resolver.resolve_authoritative().await;

    assert_eq!(resolution.boundaries, resolver.resolve_approximate());
    match &resolution.outcome {
        ResolutionOutcome::TotalFallback { error } => {
            assert!(
                matches!(error, FetchError::Remark(remark) if remark.starts_with("runtime error")),
                "{}",
                error
            );
            assert!(error.is_timeout());
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_member_falls_back_for_that_area_only() {
    let broken = json!({
        "type": "relation",
        "id": 7,
        "tags": {"name": "Zone II"},
        "members": [{"type": "way", "ref": 70, "role": "outer"}]
    });

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(INTERPRETER_PATH);
        then.status(200).json_body(overpass_body(vec![
            broken,
            relation(1, "Morales", 6.5030, 124.8350),
        ]));
    });

    let resolver = resolver_for(server.url(INTERPRETER_PATH));
    let resolution = resolver.resolve_authoritative().await;

    let boundaries = &resolution.boundaries;
    assert!(boundaries.get("Morales").unwrap().is_authoritative());
    assert_eq!(
        boundaries.get("Zone II"),
        resolver.resolve_approximate().get("Zone II")
    );
    assert_eq!(boundaries.authoritative_count(), 1);
}

#[tokio::test]
async fn test_renamed_relations_match_by_alias_and_normalized_name() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(INTERPRETER_PATH);
        then.status(200).json_body(overpass_body(vec![
            relation(4, "Zone 2", 6.4990, 124.8460),
            relation(5, "Santo Nino", 6.5050, 124.8680),
        ]));
    });

    let resolver = resolver_for(server.url(INTERPRETER_PATH));
    let resolution = resolver.resolve_authoritative().await;

    assert_eq!(
        resolution.boundaries.get("Zone II").unwrap().source,
        BoundarySource::Authoritative {
            relation_id: 4,
            matched_as: Some("Zone 2".to_string())
        }
    );
    assert_eq!(
        resolution.boundaries.get("Sto. Niño").unwrap().source,
        BoundarySource::Authoritative {
            relation_id: 5,
            matched_as: Some("Santo Nino".to_string())
        }
    );
}

#[tokio::test]
async fn test_exact_match_beats_earlier_alias() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(INTERPRETER_PATH);
        then.status(200).json_body(overpass_body(vec![
            relation(8, "Zone 2", 6.4990, 124.8460),
            relation(9, "Zone II", 6.4990, 124.8460),
        ]));
    });

    let resolver = resolver_for(server.url(INTERPRETER_PATH));
    let resolution = resolver.resolve_authoritative().await;

    assert_eq!(
        resolution.boundaries.get("Zone II").unwrap().source,
        BoundarySource::Authoritative {
            relation_id: 9,
            matched_as: None
        }
    );
}

#[test]
fn test_approximate_rings_offset_by_half_width() {
    let table = AreaTable::koronadal();
    let boundaries = approximate(&table, DEFAULT_HALF_WIDTH);
    let r = DEFAULT_HALF_WIDTH;

    assert_eq!(boundaries.len(), 5);
    for area in table.areas() {
        let points = boundaries.get(&area.name).unwrap().points();
        let GeoPoint { lat, lon } = area.centroid;

        assert_eq!(points.len(), 5);
        assert_eq!(points.first(), points.last());
        assert_eq!(
            &points[..4],
            &[
                GeoPoint::new(lat - r, lon - r),
                GeoPoint::new(lat - r, lon + r),
                GeoPoint::new(lat + r, lon + r),
                GeoPoint::new(lat + r, lon - r),
            ]
        );
    }
}
