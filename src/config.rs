//! TOML configuration shared by the `serve` and `fetch` binaries.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::models::{Area, AreaTable};
use crate::overpass::{OverpassOptions, DEFAULT_ENDPOINT};
use crate::resolver::{BoundaryResolver, DEFAULT_HALF_WIDTH};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub overpass: OverpassConfig,
    pub region: RegionConfig,
    /// Empty means the built-in Koronadal table (region name must be left as is)
    pub areas: Vec<AreaConfig>,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OverpassConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub server_timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            server_timeout_secs: 25,
            user_agent: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RegionConfig {
    pub name: String,
    pub half_width: f64,
}

/// Region covered by the built-in area table
const BUILTIN_REGION: &str = "Koronadal";

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            name: BUILTIN_REGION.to_string(),
            half_width: DEFAULT_HALF_WIDTH,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AreaConfig {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// `0.0.0.0:<port>` exposes the server on every interface
    pub listen: String,
    pub proxy: Option<ProxyConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:5173".to_string(),
            proxy: None,
        }
    }
}

/// Forward requests under `prefix` to another local service
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProxyConfig {
    pub prefix: String,
    pub target: String,
    #[serde(default = "default_strip_prefix")]
    pub strip_prefix: bool,
}

fn default_strip_prefix() -> bool {
    true
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        Url::parse(&self.overpass.endpoint)
            .with_context(|| format!("Invalid overpass endpoint: {}", self.overpass.endpoint))?;

        if self.overpass.timeout_secs == 0 || self.overpass.connect_timeout_secs == 0 {
            anyhow::bail!("overpass.timeout_secs and overpass.connect_timeout_secs must be non-zero");
        }

        let half_width = self.region.half_width;
        if !half_width.is_finite() || half_width <= 0.0 {
            anyhow::bail!("region.half_width must be a positive finite number");
        }

        if self.areas.is_empty() && self.region.name != BUILTIN_REGION {
            anyhow::bail!(
                "region {:?} has no [[areas]]; the built-in table only covers {}",
                self.region.name,
                BUILTIN_REGION
            );
        }

        if let Some(proxy) = &self.server.proxy {
            let prefix = proxy.prefix.as_str();
            if !prefix.starts_with('/') || prefix.len() < 2 {
                anyhow::bail!("server.proxy.prefix must start with '/' and name a path");
            }
            if prefix.ends_with('/') || prefix.contains("//") {
                anyhow::bail!("server.proxy.prefix {:?} must not contain empty segments", prefix);
            }
            if prefix.contains(['{', '}', '*', '?', '#']) {
                anyhow::bail!("server.proxy.prefix {:?} contains reserved characters", prefix);
            }
            Url::parse(&proxy.target)
                .with_context(|| format!("Invalid proxy target: {}", proxy.target))?;
        }

        Ok(())
    }

    /// Build the immutable area table
    pub fn area_table(&self) -> Result<AreaTable> {
        if self.areas.is_empty() {
            if self.region.name != BUILTIN_REGION {
                anyhow::bail!("region {:?} has no [[areas]]", self.region.name);
            }
            return Ok(AreaTable::koronadal());
        }

        let areas = self
            .areas
            .iter()
            .map(|a| Area::new(a.name.clone(), a.lat, a.lon).with_aliases(a.aliases.clone()))
            .collect();

        AreaTable::new(self.region.name.clone(), areas).context("Invalid area table")
    }

    pub fn overpass_options(&self) -> OverpassOptions {
        let defaults = OverpassOptions::default();
        OverpassOptions {
            endpoint: self.overpass.endpoint.clone(),
            request_timeout: Duration::from_secs(self.overpass.timeout_secs),
            connect_timeout: Duration::from_secs(self.overpass.connect_timeout_secs),
            server_timeout_secs: self.overpass.server_timeout_secs,
            user_agent: self
                .overpass
                .user_agent
                .clone()
                .unwrap_or(defaults.user_agent),
        }
    }

    pub fn build_resolver(&self) -> Result<BoundaryResolver> {
        let resolver = BoundaryResolver::new(
            self.area_table()?,
            self.overpass_options(),
            self.region.half_width,
        )
        .context("Failed to create geometry service client")?;
        Ok(resolver)
    }
}
