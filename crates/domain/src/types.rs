//! Wire-level domain types shared across the gateway
//!
//! These mirror the shapes the Cloudflare API returns. Every field that may
//! be absent on the wire defaults safely, so a never-provisioned resource
//! deserializes to an empty value rather than failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single rule inside a provider-managed ruleset.
///
/// The `expression` string is the de facto identity key for feature-toggle
/// rules: the gateway finds "the rule this feature controls" by exact
/// string match, never by a locally stored id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub action_parameters: Option<Value>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// An ordered collection of rules for one phase (e.g. cache settings).
///
/// Deserializes from the entrypoint ruleset payload; a zone that has never
/// had a ruleset created yields the default (no id, no rules).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Ruleset {
    /// All rules whose expression matches `expression` exactly.
    pub fn rules_matching<'a>(&'a self, expression: &str) -> Vec<&'a Rule> {
        self.rules.iter().filter(|r| r.expression == expression).collect()
    }

    pub fn has_rule_with_expression(&self, expression: &str) -> bool {
        self.rules.iter().any(|r| r.expression == expression)
    }
}

/// Pagination metadata from the response envelope's `result_info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultInfo {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// Typed view over a paginated API response.
///
/// Paginated service methods return this instead of a raw value, giving
/// callers a consistent contract for both data and pagination info.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult {
    pub items: Vec<Value>,
    #[serde(default)]
    pub result_info: ResultInfo,
}

impl PaginatedResult {
    pub fn new(items: Vec<Value>, result_info: ResultInfo) -> Self {
        Self { items, result_info }
    }

    pub fn total_pages(&self) -> u32 {
        self.result_info.total_pages.unwrap_or(1)
    }

    pub fn total_count(&self) -> u64 {
        self.result_info.total_count.unwrap_or(self.items.len() as u64)
    }

    pub fn current_page(&self) -> u32 {
        self.result_info.page.unwrap_or(1)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// DNS record types the admin panel manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DnsRecordType {
    A,
    AAAA,
    CNAME,
    MX,
    TXT,
    NS,
    SRV,
    CAA,
    PTR,
}

impl DnsRecordType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AAAA => "AAAA",
            Self::CNAME => "CNAME",
            Self::MX => "MX",
            Self::TXT => "TXT",
            Self::NS => "NS",
            Self::SRV => "SRV",
            Self::CAA => "CAA",
            Self::PTR => "PTR",
        }
    }

    /// Only A, AAAA and CNAME records can sit behind the proxy.
    pub const fn supports_proxy(self) -> bool {
        matches!(self, Self::A | Self::AAAA | Self::CNAME)
    }

    /// MX and SRV records require a priority value.
    pub const fn requires_priority(self) -> bool {
        matches!(self, Self::MX | Self::SRV)
    }
}

impl std::fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a `purge_cache` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeRequest {
    /// Drop the entire zone cache.
    Everything,
    /// Selective purge; empty lists are omitted from the request body.
    Selective {
        files: Vec<String>,
        tags: Vec<String>,
        hosts: Vec<String>,
    },
}

impl PurgeRequest {
    pub fn to_body(&self) -> Value {
        match self {
            Self::Everything => serde_json::json!({ "purge_everything": true }),
            Self::Selective { files, tags, hosts } => {
                let mut body = serde_json::Map::new();
                if !files.is_empty() {
                    body.insert("files".into(), serde_json::json!(files));
                }
                if !tags.is_empty() {
                    body.insert("tags".into(), serde_json::json!(tags));
                }
                if !hosts.is_empty() {
                    body.insert("hosts".into(), serde_json::json!(hosts));
                }
                Value::Object(body)
            }
        }
    }
}
