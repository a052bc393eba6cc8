use reqwest::Method;
use serde_json::{json, Map, Value};

use cloudgate_domain::{DnsRecordType, PaginatedResult, Result};

use crate::http::RequestOptions;
use crate::services::ServiceContext;

/// Filters for listing DNS records. Unset fields use the API defaults
/// baked into [`DnsListFilters::to_query`].
#[derive(Debug, Clone, Default)]
pub struct DnsListFilters {
    pub record_type: Option<DnsRecordType>,
    pub name: Option<String>,
    pub content: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub order: Option<String>,
    pub direction: Option<String>,
}

impl DnsListFilters {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(record_type) = self.record_type {
            query.push(("type".to_string(), record_type.to_string()));
        }
        if let Some(name) = &self.name {
            query.push(("name".to_string(), name.clone()));
        }
        if let Some(content) = &self.content {
            query.push(("content".to_string(), content.clone()));
        }
        query.push(("page".to_string(), self.page.unwrap_or(1).to_string()));
        query.push((
            "per_page".to_string(),
            self.per_page.unwrap_or(100).to_string(),
        ));
        query.push((
            "order".to_string(),
            self.order.clone().unwrap_or_else(|| "type".to_string()),
        ));
        query.push((
            "direction".to_string(),
            self.direction.clone().unwrap_or_else(|| "asc".to_string()),
        ));
        query
    }

    /// Stable cache-key suffix derived from the effective query.
    fn cache_suffix(&self) -> String {
        self.to_query()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// A DNS record to create or to replace an existing record with.
///
/// `proxied` is only sent for record types that can sit behind the proxy,
/// and `priority` only for types that require one.
#[derive(Debug, Clone)]
pub struct NewDnsRecord {
    pub record_type: DnsRecordType,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
    pub priority: Option<u16>,
    pub comment: Option<String>,
}

impl NewDnsRecord {
    pub fn new(
        record_type: DnsRecordType,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            record_type,
            name: name.into(),
            content: content.into(),
            // 1 means "automatic" on the API side.
            ttl: 1,
            proxied: false,
            priority: None,
            comment: None,
        }
    }

    #[must_use]
    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: u16) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("type".to_string(), json!(self.record_type.to_string()));
        body.insert("name".to_string(), json!(self.name));
        body.insert("content".to_string(), json!(self.content));
        body.insert("ttl".to_string(), json!(self.ttl));
        if self.record_type.supports_proxy() {
            body.insert("proxied".to_string(), json!(self.proxied));
        }
        if self.record_type.requires_priority() {
            if let Some(priority) = self.priority {
                body.insert("priority".to_string(), json!(priority));
            }
        }
        if let Some(comment) = &self.comment {
            body.insert("comment".to_string(), json!(comment));
        }
        Value::Object(body)
    }
}

/// DNS record management for a zone.
pub struct DnsService {
    ctx: ServiceContext,
}

impl DnsService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// List records matching the filters, cached per zone and filter set.
    pub async fn list_records(
        &self,
        filters: &DnsListFilters,
        zone_id: Option<&str>,
    ) -> Result<PaginatedResult> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = format!("zones/{zone_id}/dns_records");
        let query = filters.to_query();
        let ctx = &self.ctx;

        ctx.remember(
            &format!("dns_records:{zone_id}"),
            &filters.cache_suffix(),
            || async {
                let mut options = RequestOptions::new();
                for (key, value) in query {
                    options = options.query(key, value);
                }
                let response = ctx.client().make_request(Method::GET, &endpoint, options).await?;
                response.throw_if_failed()?;

                Ok(PaginatedResult::new(
                    response.result_or_default::<Vec<Value>>()?,
                    response.result_info().clone(),
                ))
            },
        )
        .await
    }

    pub async fn get_record(&self, record_id: &str, zone_id: Option<&str>) -> Result<Value> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = format!("zones/{zone_id}/dns_records/{record_id}");
        let ctx = &self.ctx;

        ctx.remember(&format!("dns_record:{zone_id}:{record_id}"), "", || async {
            let response = ctx
                .client()
                .make_request(Method::GET, &endpoint, RequestOptions::new())
                .await?;
            response.throw_if_failed()?;
            response.result_or_default::<Value>()
        })
        .await
    }

    pub async fn create_record(
        &self,
        record: &NewDnsRecord,
        zone_id: Option<&str>,
    ) -> Result<Value> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = format!("zones/{zone_id}/dns_records");

        let response = self
            .ctx
            .client()
            .make_request(
                Method::POST,
                &endpoint,
                RequestOptions::new().json(record.to_body()),
            )
            .await?;
        response.throw_if_failed()?;

        self.ctx.invalidate(&format!("dns_records:{zone_id}"));
        response.result_or_default::<Value>()
    }

    pub async fn update_record(
        &self,
        record_id: &str,
        record: &NewDnsRecord,
        zone_id: Option<&str>,
    ) -> Result<Value> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = format!("zones/{zone_id}/dns_records/{record_id}");

        let response = self
            .ctx
            .client()
            .make_request(
                Method::PATCH,
                &endpoint,
                RequestOptions::new().json(record.to_body()),
            )
            .await?;
        response.throw_if_failed()?;

        self.ctx.invalidate(&format!("dns_records:{zone_id}"));
        self.ctx.invalidate(&format!("dns_record:{zone_id}:{record_id}"));
        response.result_or_default::<Value>()
    }

    pub async fn delete_record(&self, record_id: &str, zone_id: Option<&str>) -> Result<Value> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = format!("zones/{zone_id}/dns_records/{record_id}");

        let response = self
            .ctx
            .client()
            .make_request(Method::DELETE, &endpoint, RequestOptions::new())
            .await?;
        response.throw_if_failed()?;

        self.ctx.invalidate(&format!("dns_records:{zone_id}"));
        self.ctx.invalidate(&format!("dns_record:{zone_id}:{record_id}"));
        response.result_or_default::<Value>()
    }

    /// Export the zone's records as a BIND zone file.
    pub async fn export_records(&self, zone_id: Option<&str>) -> Result<String> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let endpoint = format!("zones/{zone_id}/dns_records/export");

        let response = self
            .ctx
            .client()
            .request(Method::GET, &endpoint, RequestOptions::new())
            .await?;
        response.text().await.map_err(|e| {
            cloudgate_domain::CloudflareError::Request {
                method: Method::GET.to_string(),
                endpoint,
                message: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_fill_the_query() {
        let filters = DnsListFilters::default();
        let query = filters.to_query();
        assert!(query.contains(&("page".to_string(), "1".to_string())));
        assert!(query.contains(&("per_page".to_string(), "100".to_string())));
        assert!(query.contains(&("order".to_string(), "type".to_string())));
        assert!(query.contains(&("direction".to_string(), "asc".to_string())));
        assert!(!query.iter().any(|(k, _)| k == "type" || k == "name"));
    }

    #[test]
    fn cache_suffix_tracks_filters() {
        let a = DnsListFilters::default();
        let b = DnsListFilters {
            record_type: Some(DnsRecordType::CNAME),
            ..DnsListFilters::default()
        };
        assert_ne!(a.cache_suffix(), b.cache_suffix());
        assert_eq!(a.cache_suffix(), DnsListFilters::default().cache_suffix());
    }

    #[test]
    fn proxied_only_sent_for_proxyable_types() {
        let a_record = NewDnsRecord::new(DnsRecordType::A, "www", "192.0.2.1").proxied(true);
        assert_eq!(a_record.to_body()["proxied"], true);

        let txt = NewDnsRecord::new(DnsRecordType::TXT, "txt", "v=spf1").proxied(true);
        assert!(txt.to_body().get("proxied").is_none());
    }

    #[test]
    fn priority_only_sent_when_required() {
        let mx = NewDnsRecord::new(DnsRecordType::MX, "@", "mail.example.com").priority(10);
        assert_eq!(mx.to_body()["priority"], 10);

        let a_record = NewDnsRecord::new(DnsRecordType::A, "www", "192.0.2.1").priority(10);
        assert!(a_record.to_body().get("priority").is_none());
    }
}
