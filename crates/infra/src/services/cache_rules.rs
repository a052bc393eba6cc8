use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use cloudgate_domain::{CloudflareError, Result, Ruleset};

use crate::http::RequestOptions;
use crate::services::ServiceContext;

/// API error code returned when a zone has no entrypoint ruleset for the
/// cache phase yet. Treated as "no rules", not as a failure.
pub const NO_ENTRYPOINT_ERROR_CODE: i64 = 10003;

const CACHE_PHASE: &str = "http_request_cache_settings";
const CACHE_RULE_ACTION: &str = "set_cache_settings";

fn entrypoint_endpoint(zone_id: &str) -> String {
    format!("zones/{zone_id}/rulesets/phases/{CACHE_PHASE}/entrypoint")
}

fn cache_group(zone_id: &str) -> String {
    format!("cache_rules:{zone_id}")
}

/// Payload for creating or updating a cache rule.
#[derive(Debug, Clone)]
pub struct NewCacheRule {
    pub description: String,
    pub expression: String,
    pub action_parameters: Value,
    pub enabled: bool,
}

impl NewCacheRule {
    pub fn new(
        description: impl Into<String>,
        expression: impl Into<String>,
        action_parameters: Value,
    ) -> Self {
        Self {
            description: description.into(),
            expression: expression.into(),
            action_parameters,
            enabled: true,
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn to_body(&self) -> Value {
        json!({
            "action": CACHE_RULE_ACTION,
            "description": self.description,
            "expression": self.expression,
            "action_parameters": self.action_parameters,
            "enabled": self.enabled,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.expression.trim().is_empty() {
            return Err(CloudflareError::Configuration(
                "cache rule expression must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// CRUD against the zone's `http_request_cache_settings` ruleset phase.
pub struct CacheRulesService {
    ctx: ServiceContext,
}

impl CacheRulesService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Fetch the entrypoint ruleset for the cache phase, cached per zone.
    ///
    /// A zone that has never had cache rules returns API error 10003; that
    /// is mapped to an empty ruleset so callers can treat "no ruleset" and
    /// "empty ruleset" uniformly.
    pub async fn get_cache_rules(&self, zone_id: Option<&str>) -> Result<Ruleset> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = entrypoint_endpoint(&zone_id);
        let ctx = &self.ctx;

        ctx.remember(&cache_group(&zone_id), "", || async {
            let response = ctx
                .client()
                .make_request(Method::GET, &endpoint, RequestOptions::new())
                .await?;
            match response.throw_if_failed() {
                Ok(()) => response.result_or_default::<Ruleset>(),
                Err(err) if err.has_error_code(NO_ENTRYPOINT_ERROR_CODE) => {
                    debug!(%endpoint, "zone has no cache ruleset yet");
                    Ok(Ruleset::default())
                }
                Err(err) => Err(err),
            }
        })
        .await
    }

    /// Create a cache rule.
    ///
    /// When the zone has no ruleset for the phase yet (`ruleset_id` is
    /// `None`), a PUT to the entrypoint creates the ruleset with the rule
    /// in one shot; otherwise the rule is POSTed to the existing ruleset.
    pub async fn create_cache_rule(
        &self,
        rule: &NewCacheRule,
        ruleset_id: Option<&str>,
        zone_id: Option<&str>,
    ) -> Result<Value> {
        rule.validate()?;
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;

        let response = match ruleset_id {
            Some(ruleset_id) => {
                let endpoint = format!("zones/{zone_id}/rulesets/{ruleset_id}/rules");
                self.ctx
                    .client()
                    .make_request(
                        Method::POST,
                        &endpoint,
                        RequestOptions::new().json(rule.to_body()),
                    )
                    .await?
            }
            None => {
                let body = json!({ "rules": [rule.to_body()] });
                self.ctx
                    .client()
                    .make_request(
                        Method::PUT,
                        &entrypoint_endpoint(&zone_id),
                        RequestOptions::new().json(body),
                    )
                    .await?
            }
        };

        response.throw_if_failed()?;
        self.ctx.invalidate(&cache_group(&zone_id));
        response.result_or_default::<Value>()
    }

    /// Update a rule in place via PATCH.
    pub async fn update_cache_rule(
        &self,
        ruleset_id: &str,
        rule_id: &str,
        rule: &NewCacheRule,
        zone_id: Option<&str>,
    ) -> Result<Value> {
        rule.validate()?;
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = format!("zones/{zone_id}/rulesets/{ruleset_id}/rules/{rule_id}");

        let response = self
            .ctx
            .client()
            .make_request(
                Method::PATCH,
                &endpoint,
                RequestOptions::new().json(rule.to_body()),
            )
            .await?;

        response.throw_if_failed()?;
        self.ctx.invalidate(&cache_group(&zone_id));
        response.result_or_default::<Value>()
    }

    pub async fn delete_cache_rule(
        &self,
        ruleset_id: &str,
        rule_id: &str,
        zone_id: Option<&str>,
    ) -> Result<()> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = format!("zones/{zone_id}/rulesets/{ruleset_id}/rules/{rule_id}");

        let response = self
            .ctx
            .client()
            .make_request(Method::DELETE, &endpoint, RequestOptions::new())
            .await?;

        response.throw_if_failed()?;
        self.ctx.invalidate(&cache_group(&zone_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_body_shape() {
        let rule = NewCacheRule::new(
            "Cache images",
            "ends_with(http.request.uri.path, \".png\")",
            json!({"cache": true}),
        )
        .enabled(false);

        let body = rule.to_body();
        assert_eq!(body["action"], CACHE_RULE_ACTION);
        assert_eq!(body["description"], "Cache images");
        assert_eq!(body["enabled"], false);
        assert_eq!(body["action_parameters"]["cache"], true);
    }

    #[test]
    fn empty_expression_is_rejected() {
        let rule = NewCacheRule::new("bad", "   ", json!({"cache": true}));
        assert!(matches!(
            rule.validate(),
            Err(CloudflareError::Configuration(_))
        ));
    }
}
