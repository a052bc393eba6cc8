//! Service registry and entry point
//!
//! All services are constructed eagerly at startup from explicit
//! dependencies. Nothing here reads ambient global state; the settings
//! provider and cache store are injected by the caller.

use std::sync::Arc;

use reqwest::Method;
use tracing::info;

use cloudgate_core::{CacheStore, SettingsProvider};
use cloudgate_domain::{settings_keys, Result};

use crate::auth::CredentialResolver;
use crate::cache::VersionedCache;
use crate::http::{CloudflareClient, RequestOptions};
use crate::services::{
    CachePurgeService, CacheRulesService, DnsService, EdgeCachingService, GraphQlService,
    ServiceContext, ZoneService,
};
use crate::settings::CacheConfig;

/// The gateway: one instance per credential set, owning every service.
pub struct Cloudflare {
    client: Arc<CloudflareClient>,
    settings: Arc<dyn SettingsProvider>,
    zone: ZoneService,
    dns: DnsService,
    cache_rules: Arc<CacheRulesService>,
    edge_caching: EdgeCachingService,
    purge: CachePurgeService,
    graphql: GraphQlService,
}

impl Cloudflare {
    /// Gateway against the production API.
    pub fn new(
        settings: Arc<dyn SettingsProvider>,
        store: Arc<dyn CacheStore>,
        cache_config: CacheConfig,
    ) -> Result<Self> {
        let auth = Arc::new(CredentialResolver::new(Arc::clone(&settings)));
        let client = Arc::new(CloudflareClient::new(Arc::clone(&auth))?);
        Ok(Self::with_client(client, settings, store, cache_config))
    }

    /// Gateway over a pre-built client (tests inject a mock base URL here).
    pub fn with_client(
        client: Arc<CloudflareClient>,
        settings: Arc<dyn SettingsProvider>,
        store: Arc<dyn CacheStore>,
        cache_config: CacheConfig,
    ) -> Self {
        let cache = Arc::new(VersionedCache::new(store, cache_config));
        let ctx = ServiceContext::new(Arc::clone(&client), Arc::clone(&settings), cache);

        let cache_rules = Arc::new(CacheRulesService::new(ctx.clone()));
        let edge_caching = EdgeCachingService::new(ctx.clone(), Arc::clone(&cache_rules));

        info!("Cloudflare gateway initialized");
        Self {
            zone: ZoneService::new(ctx.clone()),
            dns: DnsService::new(ctx.clone()),
            edge_caching,
            purge: CachePurgeService::new(ctx.clone()),
            graphql: GraphQlService::new(ctx),
            cache_rules,
            client,
            settings,
        }
    }

    pub fn zone(&self) -> &ZoneService {
        &self.zone
    }

    pub fn dns(&self) -> &DnsService {
        &self.dns
    }

    pub fn cache_rules(&self) -> &CacheRulesService {
        &self.cache_rules
    }

    pub fn edge_caching(&self) -> &EdgeCachingService {
        &self.edge_caching
    }

    pub fn purge(&self) -> &CachePurgeService {
        &self.purge
    }

    pub fn graphql(&self) -> &GraphQlService {
        &self.graphql
    }

    pub fn client(&self) -> &CloudflareClient {
        &self.client
    }

    pub fn auth(&self) -> &CredentialResolver {
        self.client.auth()
    }

    pub fn settings(&self) -> &Arc<dyn SettingsProvider> {
        &self.settings
    }

    /// Check that the configured credentials are accepted by the API.
    ///
    /// A token is verified against `user/tokens/verify`; on failure (or
    /// when no token is set) `user` is tried with whatever auth headers
    /// apply. The error from the last attempt is surfaced.
    pub async fn verify_credentials(&self) -> Result<bool> {
        let auth = self.client.auth();
        if !auth.has_credentials() {
            auth.refresh_credentials();
        }

        if auth.token().is_some() && self.check_endpoint("user/tokens/verify").await.is_ok() {
            return Ok(true);
        }

        self.check_endpoint("user").await?;
        Ok(true)
    }

    async fn check_endpoint(&self, endpoint: &str) -> Result<()> {
        let response = self
            .client
            .make_request(Method::GET, endpoint, RequestOptions::new())
            .await?;
        response.throw_if_failed()
    }

    pub fn zone_id(&self) -> Option<String> {
        self.settings.get(settings_keys::ZONE_ID)
    }

    pub fn account_id(&self) -> Option<String> {
        self.settings.get(settings_keys::ACCOUNT_ID)
    }
}
