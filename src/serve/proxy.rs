//! Reverse proxy for a path prefix, forwarding to another local service.

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::header::{CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use std::sync::Arc;
use tracing::{debug, error};

use barangay_bounds::config::ProxyConfig;

use crate::AppState;

const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Map an incoming path (with query) onto the proxy target
pub fn forward_url(proxy: &ProxyConfig, path_and_query: &str) -> String {
    let forwarded = if proxy.strip_prefix {
        match path_and_query.strip_prefix(proxy.prefix.as_str()) {
            Some(rest) if rest.is_empty() => "/".to_string(),
            Some(rest) if rest.starts_with('?') => format!("/{}", rest),
            Some(rest) => rest.to_string(),
            None => path_and_query.to_string(),
        }
    } else {
        path_and_query.to_string()
    };

    format!("{}{}", proxy.target.trim_end_matches('/'), forwarded)
}

fn strip_hop_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    for name in [HOST, CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING] {
        headers.remove(name);
    }
    headers
}

pub async fn proxy_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let Some(proxy) = state.proxy.as_ref() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let url = forward_url(proxy, &path_and_query);

    let method = request.method().clone();
    let headers = strip_hop_headers(request.headers());
    let body = match to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to read proxied request body: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    debug!("Proxying {} {} -> {}", method, path_and_query, url);

    let upstream = match state
        .http
        .request(method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            error!("Proxy request to {} failed: {}", url, e);
            return (StatusCode::BAD_GATEWAY, e.to_string()).into_response();
        }
    };

    let status = upstream.status();
    let headers = strip_hop_headers(upstream.headers());
    let bytes = match upstream.bytes().await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to read proxy response from {}: {}", url, e);
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
