use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::{json, Map, Value};
use tracing::warn;

use cloudgate_domain::Result;

use crate::services::ServiceContext;

const ZULU_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Analytics via the GraphQL side channel.
///
/// Queries go to the `/graphql` endpoint with the same auth headers as the
/// REST API but no retry wrapper. Results are uncached; callers decide
/// their own refresh cadence.
pub struct GraphQlService {
    ctx: ServiceContext,
}

/// Time grouping parameters for a zone analytics query.
///
/// One-day windows without an exact anchor use hourly buckets; everything
/// else groups by day.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AnalyticsWindow {
    group: &'static str,
    time_field: &'static str,
    since: String,
    until: String,
}

fn analytics_window(days: i64, exact_date: bool, anchor: DateTime<Utc>) -> AnalyticsWindow {
    let start = anchor - ChronoDuration::days(days);
    let end = anchor - ChronoDuration::seconds(1);

    if days == 1 && !exact_date {
        AnalyticsWindow {
            group: "httpRequests1hGroups",
            time_field: "datetime",
            since: start.format(ZULU_TIME_FORMAT).to_string(),
            until: end.format(ZULU_TIME_FORMAT).to_string(),
        }
    } else {
        AnalyticsWindow {
            group: "httpRequests1dGroups",
            time_field: "date",
            since: start.format(DATE_FORMAT).to_string(),
            until: end.format(DATE_FORMAT).to_string(),
        }
    }
}

fn zone_analytics_query(window: &AnalyticsWindow) -> String {
    let group = window.group;
    let time_field = window.time_field;
    format!(
        "query GetZoneAnalytics($zoneTag: string, $since: string, $until: string) {{
            viewer {{
                zones(filter: {{zoneTag: $zoneTag}}) {{
                    totals: {group}(limit: 10000, filter: {{{time_field}_geq: $since, {time_field}_lt: $until}}) {{
                        uniq {{ uniques }}
                    }}
                    zones: {group}(orderBy: [{time_field}_ASC], limit: 10000, filter: {{{time_field}_geq: $since, {time_field}_lt: $until}}) {{
                        dimensions {{ timeslot: {time_field} }}
                        uniq {{ uniques }}
                        sum {{
                            browserMap {{ pageViews key: uaBrowserFamily }}
                            bytes
                            cachedBytes
                            cachedRequests
                            contentTypeMap {{ bytes requests key: edgeResponseContentTypeName }}
                            countryMap {{ bytes requests threats key: clientCountryName }}
                            encryptedBytes
                            encryptedRequests
                            pageViews
                            requests
                            responseStatusMap {{ requests key: edgeResponseStatus }}
                            threats
                        }}
                    }}
                }}
            }}
        }}"
    )
}

impl GraphQlService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Run a raw GraphQL query and return the `data` object, or an empty
    /// object when the response has none.
    pub async fn query(
        &self,
        operation_name: Option<&str>,
        query: &str,
        variables: Value,
    ) -> Result<Value> {
        let mut body = Map::new();
        if let Some(operation_name) = operation_name {
            body.insert("operationName".to_string(), json!(operation_name));
        }
        body.insert("query".to_string(), json!(query));
        body.insert("variables".to_string(), variables);

        let response = self
            .ctx
            .client()
            .post_graphql(&Value::Object(body))
            .await
            .map_err(|err| {
                warn!(operation = operation_name.unwrap_or("<anonymous>"), error = %err, "GraphQL request failed");
                err
            })?;

        Ok(response
            .get("data")
            .cloned()
            .unwrap_or_else(|| json!({})))
    }

    /// Traffic analytics for a zone over the last `days` days.
    ///
    /// `date_from` anchors the window end; when absent the window ends now.
    /// `exact_date` forces daily buckets even for a one-day window.
    pub async fn zone_analytics(
        &self,
        days: i64,
        exact_date: bool,
        date_from: Option<DateTime<Utc>>,
        zone_id: Option<&str>,
    ) -> Result<Value> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let window = analytics_window(days, exact_date, date_from.unwrap_or_else(Utc::now));
        let query = zone_analytics_query(&window);

        self.query(
            Some("GetZoneAnalytics"),
            &query,
            json!({
                "zoneTag": zone_id,
                "since": window.since,
                "until": window.until,
            }),
        )
        .await
    }

    /// Count of firewall events attributed to one rule, excluding the
    /// challenge-resolution noise actions.
    pub async fn rule_activity(
        &self,
        rule_id: &str,
        days: i64,
        zone_id: Option<&str>,
    ) -> Result<Value> {
        let zone_id = self.ctx.ensure_zone_id(zone_id)?;
        let now = Utc::now();
        let since = (now - ChronoDuration::days(days))
            .format(ZULU_TIME_FORMAT)
            .to_string();
        let until = (now - ChronoDuration::seconds(1))
            .format(ZULU_TIME_FORMAT)
            .to_string();

        let query = "query RuleActivityQuery($zoneTag: string) {
            viewer {
                zones(filter: { zoneTag: $zoneTag }) {
                    issued: firewallEventsAdaptiveByTimeGroups(limit: 1, filter: $filter) {
                        count
                    }
                }
            }
        }";

        let excluded_actions = [
            "challenge_solved",
            "challenge_failed",
            "challenge_bypassed",
            "jschallenge_solved",
            "jschallenge_failed",
            "jschallenge_bypassed",
            "managed_challenge_skipped",
            "managed_challenge_non_interactive_solved",
            "managed_challenge_interactive_solved",
            "managed_challenge_bypassed",
        ];
        let and: Vec<Value> = excluded_actions
            .iter()
            .map(|action| json!({ "action_neq": action }))
            .collect();

        self.query(
            Some("RuleActivityQuery"),
            query,
            json!({
                "zoneTag": zone_id,
                "filter": {
                    "AND": and,
                    "datetime_geq": since,
                    "datetime_leq": until,
                    "ruleId": rule_id,
                },
            }),
        )
        .await
    }
}
