//! Matching between local area names and names returned by the geometry service.

use hashbrown::HashMap;
use regex::Regex;
use std::sync::LazyLock;

use crate::models::AreaTable;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HONORIFIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(sto|st|santo|sta|santa)\s").unwrap());
static ZONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^zone\s?(\d{1,2})$").unwrap());

/// How a service name was tied to a local area, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Exact,
    Alias,
    Normalized,
}

/// Normalized comparison key for a barangay name.
///
/// "Sto. Niño", "Santo Nino" and "sto nino" share a key, as do
/// "Zone 2" and "Zone II".
pub fn normalize_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace('ñ', "n").replace('.', " ");
    let collapsed = WHITESPACE.replace_all(lowered.trim(), " ").into_owned();

    let expanded = HONORIFIC
        .replace(&collapsed, |caps: &regex::Captures| match &caps[1] {
            "sta" | "santa" => "santa ".to_string(),
            _ => "santo ".to_string(),
        })
        .into_owned();

    match ZONE_NUMBER.captures(&expanded) {
        Some(caps) => match caps[1].parse::<u32>().ok().and_then(to_roman) {
            Some(roman) => format!("zone {}", roman),
            None => expanded,
        },
        None => expanded,
    }
}

fn to_roman(n: u32) -> Option<String> {
    if n == 0 || n > 39 {
        return None;
    }
    let mut out = String::new();
    let mut rest = n;
    for (value, numeral) in [(10, "x"), (9, "ix"), (5, "v"), (4, "iv"), (1, "i")] {
        while rest >= value {
            out.push_str(numeral);
            rest -= value;
        }
    }
    Some(out)
}

/// Lookup from service names to local area names.
pub struct NameMatcher {
    exact: HashMap<String, String>,
    alias: HashMap<String, String>,
    normalized: HashMap<String, String>,
}

impl NameMatcher {
    pub fn new(table: &AreaTable) -> Self {
        let mut exact = HashMap::new();
        let mut alias = HashMap::new();
        let mut normalized = HashMap::new();

        for area in table.areas() {
            exact.insert(area.name.clone(), area.name.clone());
            normalized
                .entry(normalize_name(&area.name))
                .or_insert_with(|| area.name.clone());
            for a in &area.aliases {
                alias.entry(a.clone()).or_insert_with(|| area.name.clone());
                normalized
                    .entry(normalize_name(a))
                    .or_insert_with(|| area.name.clone());
            }
        }

        Self {
            exact,
            alias,
            normalized,
        }
    }

    /// Resolve a service name to a local area name
    pub fn resolve(&self, service_name: &str) -> Option<(&str, MatchKind)> {
        if let Some(name) = self.exact.get(service_name) {
            return Some((name.as_str(), MatchKind::Exact));
        }
        if let Some(name) = self.alias.get(service_name) {
            return Some((name.as_str(), MatchKind::Alias));
        }
        self.normalized
            .get(&normalize_name(service_name))
            .map(|name| (name.as_str(), MatchKind::Normalized))
    }
}
