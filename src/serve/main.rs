//! Boundary server for the map view.
//!
//! Serves the centroid table and boundary sets as JSON or GeoJSON, and
//! optionally proxies a path prefix to a separate local backend.

mod proxy;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use axum::{
    extract::{Query, State},
    http::{header::HeaderName, HeaderValue},
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use barangay_bounds::config::{Config, ProxyConfig};
use barangay_bounds::geojson::to_feature_collection;
use barangay_bounds::{AreaTable, BoundaryCollection, BoundaryResolver, ResolutionOutcome};

#[derive(Parser, Debug)]
#[command(name = "serve")]
#[command(about = "Barangay boundary server")]
struct Args {
    /// TOML config file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides server.listen
    #[arg(short, long)]
    listen: Option<String>,
}

/// Application state shared across handlers
pub struct AppState {
    resolver: BoundaryResolver,
    /// Computed once at startup so the first request never waits on the network
    approximate: BoundaryCollection,
    http: reqwest::Client,
    proxy: Option<ProxyConfig>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    let resolver = config.build_resolver()?;
    let approximate = resolver.resolve_approximate();
    info!(
        "Loaded {} areas for {}",
        resolver.areas().len(),
        resolver.areas().region()
    );

    let proxy = config.server.proxy.clone();
    let state = Arc::new(AppState {
        resolver,
        approximate,
        http: reqwest::Client::new(),
        proxy: proxy.clone(),
    });

    let mut app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/centroids", get(centroids_handler))
        .route("/v1/boundaries", get(boundaries_handler));

    if let Some(proxy) = &proxy {
        info!("Proxying {} to {}", proxy.prefix, proxy.target);
        app = app
            .route(&proxy.prefix, any(proxy::proxy_handler))
            .route(&format!("{}/{{*rest}}", proxy.prefix), any(proxy::proxy_handler));
    }

    let app = app
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listen = args.listen.unwrap_or(config.server.listen);
    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn centroids_handler(State(state): State<Arc<AppState>>) -> Json<AreaTable> {
    Json(state.resolver.areas().clone())
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
enum Mode {
    #[default]
    Approximate,
    Authoritative,
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
enum Format {
    #[default]
    Json,
    Geojson,
}

#[derive(Deserialize)]
struct BoundariesParams {
    mode: Option<Mode>,
    format: Option<Format>,
}

#[derive(Serialize)]
struct BoundariesResponse<'a> {
    outcome: &'static str,
    #[serde(skip_serializing_if = "is_empty")]
    approximated: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_at: Option<DateTime<Utc>>,
    boundaries: &'a BoundaryCollection,
}

fn is_empty(names: &&[String]) -> bool {
    names.is_empty()
}

/// Header carrying the outcome on GeoJSON responses
const OUTCOME_HEADER: &str = "x-boundary-outcome";

async fn boundaries_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BoundariesParams>,
) -> Response {
    let format = params.format.unwrap_or_default();

    let (boundaries, outcome, resolved_at) = match params.mode.unwrap_or_default() {
        Mode::Approximate => (state.approximate.clone(), None, None),
        Mode::Authoritative => {
            let resolution = state.resolver.resolve_authoritative().await;
            (
                resolution.boundaries,
                Some(resolution.outcome),
                Some(resolution.resolved_at),
            )
        }
    };

    let label = outcome.as_ref().map(|o| o.label()).unwrap_or("approximate");

    match format {
        Format::Geojson => {
            let fc = to_feature_collection(&boundaries, Some(state.resolver.areas()));
            let mut response = Json(fc).into_response();
            response.headers_mut().insert(
                HeaderName::from_static(OUTCOME_HEADER),
                HeaderValue::from_static(label),
            );
            response
        }
        Format::Json => {
            let (approximated, error) = match &outcome {
                Some(ResolutionOutcome::PartialFallback { approximated }) => {
                    (approximated.as_slice(), None)
                }
                Some(ResolutionOutcome::TotalFallback { error }) => {
                    (&[][..], Some(error.to_string()))
                }
                _ => (&[][..], None),
            };

            Json(BoundariesResponse {
                outcome: label,
                approximated,
                error,
                resolved_at,
                boundaries: &boundaries,
            })
            .into_response()
        }
    }
}
