use std::fmt::Write as _;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use cloudgate_domain::{Result, Ruleset};

use crate::services::cache_rules::{CacheRulesService, NewCacheRule};
use crate::services::ServiceContext;

/// Matches guest traffic: no session cookies, plain GET, no query string.
pub const GUEST_EXPRESSION: &str = "(not http.cookie contains \"laravel_session=\" and not http.cookie contains \"XSRF-TOKEN=\" and http.request.method eq \"GET\" and http.request.uri.query eq \"\")";

pub const DEFAULT_MEDIA_PATH_PREFIX: &str = "/storage";

const MEDIA_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".mp4", ".webm", ".mp3", ".ogg", ".wav",
];

/// Feature toggles built on cache rules.
///
/// A feature is "enabled" exactly when a rule with its expression exists in
/// the zone's cache ruleset. There is no separate state store; toggling is
/// reconciliation against the remote ruleset. Expressions parameterised by
/// a path prefix are distinct per prefix, so callers re-enabling with a new
/// prefix must disable the old one first or both rules stay active.
pub struct EdgeCachingService {
    ctx: ServiceContext,
    cache_rules: Arc<CacheRulesService>,
}

impl EdgeCachingService {
    pub fn new(ctx: ServiceContext, cache_rules: Arc<CacheRulesService>) -> Self {
        Self { ctx, cache_rules }
    }

    pub async fn enable_guest_cache(
        &self,
        seconds: u64,
        zone_id: Option<&str>,
    ) -> Result<Value> {
        self.enable_rule("Cache guest pages", GUEST_EXPRESSION, seconds, zone_id)
            .await
    }

    pub async fn disable_guest_cache(&self, zone_id: Option<&str>) -> Result<()> {
        self.disable_rule(GUEST_EXPRESSION, zone_id).await
    }

    pub async fn is_guest_cache_enabled(&self, zone_id: Option<&str>) -> Result<bool> {
        self.is_rule_enabled(GUEST_EXPRESSION, zone_id).await
    }

    pub async fn enable_media_cache(
        &self,
        seconds: u64,
        zone_id: Option<&str>,
        media_path_prefix: Option<&str>,
    ) -> Result<Value> {
        let expression = media_expression(prefix_or_default(media_path_prefix));
        self.enable_rule("Cache media attachments", &expression, seconds, zone_id)
            .await
    }

    pub async fn disable_media_cache(
        &self,
        zone_id: Option<&str>,
        media_path_prefix: Option<&str>,
    ) -> Result<()> {
        let expression = media_expression(prefix_or_default(media_path_prefix));
        self.disable_rule(&expression, zone_id).await
    }

    pub async fn is_media_cache_enabled(
        &self,
        zone_id: Option<&str>,
        media_path_prefix: Option<&str>,
    ) -> Result<bool> {
        let expression = media_expression(prefix_or_default(media_path_prefix));
        self.is_rule_enabled(&expression, zone_id).await
    }

    /// True iff a rule with exactly this expression exists in the zone's
    /// cache ruleset. A zone without a ruleset counts as disabled.
    pub async fn is_rule_enabled(&self, expression: &str, zone_id: Option<&str>) -> Result<bool> {
        let ruleset = self.fetch_ruleset(zone_id).await?;
        Ok(ruleset.has_rule_with_expression(expression))
    }

    /// Create a rule for the feature unconditionally.
    ///
    /// No upsert: enabling an already-enabled feature adds a duplicate
    /// rule. Callers re-enabling with new parameters disable first.
    pub async fn enable_rule(
        &self,
        description: &str,
        expression: &str,
        seconds: u64,
        zone_id: Option<&str>,
    ) -> Result<Value> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let ruleset = self.fetch_ruleset(Some(&zone_id)).await?;
        let rule = NewCacheRule::new(description, expression, build_cache_action(seconds));

        self.cache_rules
            .create_cache_rule(&rule, ruleset.id.as_deref(), Some(&zone_id))
            .await
    }

    /// Delete every rule whose expression matches exactly. Disabling an
    /// already-disabled feature is a successful no-op.
    pub async fn disable_rule(&self, expression: &str, zone_id: Option<&str>) -> Result<()> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let ruleset = self.fetch_ruleset(Some(&zone_id)).await?;

        let Some(ruleset_id) = ruleset.id.as_deref() else {
            return Ok(());
        };

        for rule in ruleset.rules_matching(expression) {
            let Some(rule_id) = rule.id.as_deref() else {
                continue;
            };
            debug!(rule_id, "removing edge caching rule");
            self.cache_rules
                .delete_cache_rule(ruleset_id, rule_id, Some(&zone_id))
                .await?;
        }
        Ok(())
    }

    async fn fetch_ruleset(&self, zone_id: Option<&str>) -> Result<Ruleset> {
        self.cache_rules.get_cache_rules(zone_id).await
    }
}

fn prefix_or_default(prefix: Option<&str>) -> &str {
    match prefix {
        Some(p) if !p.trim().is_empty() => p,
        _ => DEFAULT_MEDIA_PATH_PREFIX,
    }
}

/// Expression matching media files under the given path prefix.
fn media_expression(prefix: &str) -> String {
    let mut suffixes = String::new();
    for (i, ext) in MEDIA_EXTENSIONS.iter().enumerate() {
        if i > 0 {
            suffixes.push_str(" or ");
        }
        let _ = write!(suffixes, "ends_with(http.request.uri.path, \"{ext}\")");
    }
    format!("(starts_with(http.request.uri.path, \"{prefix}\") and ({suffixes}))")
}

/// Cache action overriding both edge and browser TTL.
fn build_cache_action(seconds: u64) -> Value {
    json!({
        "cache": true,
        "edge_ttl": { "default": seconds, "mode": "override_origin" },
        "browser_ttl": { "default": seconds, "mode": "override_origin" },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_expression_interpolates_prefix() {
        let expr = media_expression("/uploads");
        assert!(expr.starts_with("(starts_with(http.request.uri.path, \"/uploads\") and ("));
        assert!(expr.contains("ends_with(http.request.uri.path, \".webp\")"));
        assert!(expr.ends_with(")))"));
    }

    #[test]
    fn media_expressions_differ_per_prefix() {
        assert_ne!(media_expression("/storage"), media_expression("/media"));
    }

    #[test]
    fn cache_action_overrides_both_ttls() {
        let action = build_cache_action(3600);
        assert_eq!(action["cache"], true);
        assert_eq!(action["edge_ttl"]["default"], 3600);
        assert_eq!(action["edge_ttl"]["mode"], "override_origin");
        assert_eq!(action["browser_ttl"]["default"], 3600);
    }

    #[test]
    fn blank_prefix_falls_back_to_default() {
        assert_eq!(prefix_or_default(None), DEFAULT_MEDIA_PATH_PREFIX);
        assert_eq!(prefix_or_default(Some("  ")), DEFAULT_MEDIA_PATH_PREFIX);
        assert_eq!(prefix_or_default(Some("/media")), "/media");
    }
}
