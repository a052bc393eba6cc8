//! Zone-scoped Cloudflare services
//!
//! Each service covers one API surface and shares the same context:
//! client, settings, and the versioned response cache. Cache invalidation
//! always happens after the write is confirmed successful, never before.

pub mod cache_rules;
pub mod context;
pub mod dns;
pub mod edge_caching;
pub mod graphql;
pub mod purge;
pub mod zone;

pub use cache_rules::{CacheRulesService, NewCacheRule, NO_ENTRYPOINT_ERROR_CODE};
pub use context::ServiceContext;
pub use dns::{DnsListFilters, DnsService, NewDnsRecord};
pub use edge_caching::EdgeCachingService;
pub use graphql::GraphQlService;
pub use purge::CachePurgeService;
pub use zone::ZoneService;
