use reqwest::Method;
use serde_json::Value;
use tracing::info;

use cloudgate_domain::{PurgeRequest, Result};

use crate::http::RequestOptions;
use crate::services::ServiceContext;

/// Edge cache purging.
pub struct CachePurgeService {
    ctx: ServiceContext,
}

impl CachePurgeService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn purge(&self, request: &PurgeRequest, zone_id: Option<&str>) -> Result<Value> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = format!("zones/{zone_id}/purge_cache");

        info!(%zone_id, everything = matches!(request, PurgeRequest::Everything), "purging edge cache");
        let response = self
            .ctx
            .client()
            .make_request(
                Method::POST,
                &endpoint,
                RequestOptions::new().json(request.to_body()),
            )
            .await?;
        response.throw_if_failed()?;
        response.result_or_default::<Value>()
    }

    pub async fn purge_everything(&self, zone_id: Option<&str>) -> Result<Value> {
        self.purge(&PurgeRequest::Everything, zone_id).await
    }
}
