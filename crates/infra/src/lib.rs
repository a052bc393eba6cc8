//! # Cloudgate Infrastructure
//!
//! Infrastructure layer of the Cloudflare gateway.
//!
//! This crate contains:
//! - Credential resolution and settings providers
//! - The resilient HTTP client and response envelope
//! - Version-tag cache invalidation over pluggable cache stores
//! - Zone-scoped services (rules, DNS, zone settings, purge, analytics)
//!
//! ## Architecture
//! - Implements the ports defined in `cloudgate-core`
//! - Depends on `cloudgate-domain` and `cloudgate-core`
//! - Contains all "impure" code (HTTP, clocks, cache stores)

pub mod auth;
pub mod cache;
pub mod gateway;
pub mod http;
pub mod services;
pub mod settings;

// Re-export commonly used items
pub use auth::CredentialResolver;
pub use cache::stores::MemoryStore;
pub use cache::VersionedCache;
pub use gateway::Cloudflare;
pub use http::{ApiResponse, CloudflareClient, RequestOptions};
pub use services::{
    CachePurgeService, CacheRulesService, DnsListFilters, DnsService, EdgeCachingService,
    GraphQlService, NewCacheRule, NewDnsRecord, ZoneService,
};
pub use settings::{CacheConfig, EnvSettingsProvider, StaticSettingsProvider};
