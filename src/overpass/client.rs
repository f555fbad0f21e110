use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::{build_boundary_query, parse_response, FetchError, ParsedRelation};
use crate::models::AreaTable;

pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Connection settings for the geometry service
#[derive(Debug, Clone)]
pub struct OverpassOptions {
    pub endpoint: String,
    /// Total time allowed for one request, including the body
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// `[timeout:N]` sent inside the query
    pub server_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for OverpassOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            server_timeout_secs: 25,
            user_agent: concat!("barangay-bounds/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Posts boundary queries to an Overpass interpreter
#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: Client,
    options: OverpassOptions,
}

impl OverpassClient {
    pub fn new(options: OverpassOptions) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(options.request_timeout)
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client, options })
    }

    pub fn endpoint(&self) -> &str {
        &self.options.endpoint
    }

    /// Run one boundary query for the table and parse the relations
    pub async fn fetch_relations(
        &self,
        table: &AreaTable,
    ) -> Result<Vec<ParsedRelation>, FetchError> {
        let query = build_boundary_query(table, self.options.server_timeout_secs);
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("data", &query)
            .finish();

        info!(
            "Querying {} for {} areas in {}",
            self.options.endpoint,
            table.len(),
            table.region()
        );

        let response = self
            .client
            .post(&self.options.endpoint)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        let text = response.text().await?;
        let parsed = parse_response(&text)?;

        if let Some(remark) = parsed.failure_remark() {
            return Err(FetchError::Remark(remark.to_string()));
        }

        debug!("Geometry service returned {} relations", parsed.relations.len());
        Ok(parsed.relations)
    }
}
