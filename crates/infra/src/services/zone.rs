use reqwest::Method;
use serde_json::{json, Value};

use cloudgate_domain::Result;

use crate::http::RequestOptions;
use crate::services::ServiceContext;

/// Zone listing, details, and settings.
pub struct ZoneService {
    ctx: ServiceContext,
}

impl ZoneService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Zones visible to the credentials, cached account-wide.
    pub async fn list_zones(&self) -> Result<Vec<Value>> {
        let ctx = &self.ctx;
        ctx.remember("zones", "", || async {
            let response = ctx
                .client()
                .make_request(Method::GET, "zones", RequestOptions::new())
                .await?;
            response.throw_if_failed()?;
            response.result_or_default::<Vec<Value>>()
        })
        .await
    }

    pub async fn zone_details(&self, zone_id: Option<&str>) -> Result<Value> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = format!("zones/{zone_id}");
        let ctx = &self.ctx;

        ctx.remember(&format!("zone_details:{zone_id}"), "", || async {
            let response = ctx
                .client()
                .make_request(Method::GET, &endpoint, RequestOptions::new())
                .await?;
            response.throw_if_failed()?;
            response.result_or_default::<Value>()
        })
        .await
    }

    pub async fn zone_settings(&self, zone_id: Option<&str>) -> Result<Vec<Value>> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = format!("zones/{zone_id}/settings");
        let ctx = &self.ctx;

        ctx.remember(&format!("zone_settings:{zone_id}"), "", || async {
            let response = ctx
                .client()
                .make_request(Method::GET, &endpoint, RequestOptions::new())
                .await?;
            response.throw_if_failed()?;
            response.result_or_default::<Vec<Value>>()
        })
        .await
    }

    /// Update one setting by id, e.g. `("browser_cache_ttl", json!(14400))`.
    pub async fn update_zone_setting(
        &self,
        setting: &str,
        value: Value,
        zone_id: Option<&str>,
    ) -> Result<Value> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = format!("zones/{zone_id}/settings/{setting}");

        let response = self
            .ctx
            .client()
            .make_request(
                Method::PATCH,
                &endpoint,
                RequestOptions::new().json(json!({ "value": value })),
            )
            .await?;
        response.throw_if_failed()?;

        self.ctx.invalidate(&format!("zone_settings:{zone_id}"));
        response.result_or_default::<Value>()
    }

    /// Batch-update settings in one PATCH.
    pub async fn update_zone_settings(
        &self,
        settings: &[(String, Value)],
        zone_id: Option<&str>,
    ) -> Result<Value> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = format!("zones/{zone_id}/settings");

        let items: Vec<Value> = settings
            .iter()
            .map(|(id, value)| json!({ "id": id, "value": value }))
            .collect();

        let response = self
            .ctx
            .client()
            .make_request(
                Method::PATCH,
                &endpoint,
                RequestOptions::new().json(json!({ "items": items })),
            )
            .await?;
        response.throw_if_failed()?;

        self.ctx.invalidate(&format!("zone_settings:{zone_id}"));
        response.result_or_default::<Value>()
    }
}
