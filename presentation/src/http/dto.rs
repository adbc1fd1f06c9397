//! Request and response bodies

use super::error::ApiError;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use council_application::{DeliberateInput, DeliberationPage, ListFilter};
use council_domain::{
    Deliberation, DeliberationOptions, DeliberationResult, DeliberationStatus, Disposition,
    HealthStatus, HealthSummary, RequesterId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /deliberations`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeliberationRequest {
    pub query: String,
    #[serde(default)]
    pub consensus_threshold: Option<f64>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub context: Vec<String>,
}

impl CreateDeliberationRequest {
    pub fn into_input(self, requester_id: RequesterId) -> DeliberateInput {
        let mut options = DeliberationOptions::default().with_context(self.context);
        if let Some(threshold) = self.consensus_threshold {
            options = options.with_threshold(threshold);
        }
        if let Some(locale) = self.locale {
            options = options.with_locale(locale);
        }
        DeliberateInput::new(self.query, requester_id).with_options(options)
    }
}

/// A full result with its disposition lifted to the top level
#[derive(Debug, Clone, Serialize)]
pub struct DeliberationResponse {
    #[serde(flatten)]
    pub result: DeliberationResult,
    pub disposition: Option<Disposition>,
    pub needs_review: bool,
}

impl From<DeliberationResult> for DeliberationResponse {
    fn from(result: DeliberationResult) -> Self {
        Self {
            disposition: result.consensus_record.as_ref().map(|r| r.disposition),
            needs_review: result.needs_review(),
            result,
        }
    }
}

/// Query string of `GET /deliberations`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub flagged: Option<bool>,
}

impl ListParams {
    pub fn to_filter(&self) -> Result<ListFilter, ApiError> {
        let mut filter = ListFilter::default()
            .with_page(self.limit.unwrap_or(0), self.offset.unwrap_or(0))
            .with_range(
                self.from.as_deref().map(|s| parse_date(s, false)).transpose()?,
                self.to.as_deref().map(|s| parse_date(s, true)).transpose()?,
            );
        if let Some(status) = &self.status {
            let status: DeliberationStatus = status.parse().map_err(ApiError::BadRequest)?;
            filter = filter.with_status(status);
        }
        if let Some(flagged) = self.flagged {
            filter = filter.with_flagged(flagged);
        }
        Ok(filter)
    }
}

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date
///
/// A bare date used as an upper bound covers the whole day.
fn parse_date(s: &str, end_of_day: bool) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date: {}", s)))?;
    let start = date.and_time(NaiveTime::MIN).and_utc();
    if end_of_day {
        Ok(start + TimeDelta::days(1) - TimeDelta::nanoseconds(1))
    } else {
        Ok(start)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub deliberations: Vec<Deliberation>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl From<DeliberationPage> for ListResponse {
    fn from(page: DeliberationPage) -> Self {
        Self {
            deliberations: page.items,
            total: page.total,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub total_agents: usize,
    pub healthy_agents: usize,
    pub degraded_agents: usize,
    pub failed_agents: usize,
    pub agent_statuses: BTreeMap<String, HealthStatus>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl From<HealthSummary> for HealthResponse {
    fn from(summary: HealthSummary) -> Self {
        Self {
            status: summary.overall.as_str(),
            total_agents: summary.total,
            healthy_agents: summary.healthy,
            degraded_agents: summary.degraded,
            failed_agents: summary.failed,
            agent_statuses: summary
                .statuses
                .into_iter()
                .map(|(id, status)| (id.to_string(), status))
                .collect(),
            last_checked: summary.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let filter = ListParams::default().to_filter().unwrap();
        assert_eq!(filter, ListFilter::default());
    }

    #[test]
    fn test_filter_from_params() {
        let p = ListParams {
            limit: Some(500),
            offset: Some(40),
            status: Some("no_consensus".into()),
            from: Some("2024-01-01".into()),
            to: Some("2024-01-31".into()),
            flagged: Some(true),
        };
        let filter = p.to_filter().unwrap();
        assert_eq!(filter.limit, 100);
        assert_eq!(filter.offset, 40);
        assert_eq!(filter.status, Some(DeliberationStatus::NoConsensus));
        assert_eq!(filter.flagged, Some(true));
        assert_eq!(
            filter.from.unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
        let to = filter.to.unwrap();
        assert_eq!(to.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert!(to > DateTime::parse_from_rfc3339("2024-01-31T23:59:59Z").unwrap());
    }

    #[test]
    fn test_rfc3339_dates_kept_exact() {
        let p = ListParams {
            to: Some("2024-03-01T12:00:00+02:00".into()),
            ..ListParams::default()
        };
        let filter = p.to_filter().unwrap();
        assert_eq!(filter.to.unwrap().to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_invalid_params_rejected() {
        let bad_status = ListParams {
            status: Some("bogus".into()),
            ..ListParams::default()
        };
        assert!(matches!(bad_status.to_filter(), Err(ApiError::BadRequest(_))));

        let bad_date = ListParams {
            from: Some("last tuesday".into()),
            ..ListParams::default()
        };
        assert!(matches!(bad_date.to_filter(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_create_request_to_input() {
        let request: CreateDeliberationRequest = serde_json::from_str(
            r#"{"query": "Beds free?", "consensus_threshold": 0.8, "context": ["ward 3"]}"#,
        )
        .unwrap();
        let input = request.into_input("alice".into());
        assert_eq!(input.query, "Beds free?");
        assert_eq!(input.requester_id.as_str(), "alice");
        assert_eq!(input.options.consensus_threshold, Some(0.8));
        assert_eq!(input.options.context, vec!["ward 3"]);
        assert!(input.options.locale.is_none());
    }

    #[test]
    fn test_health_response_fields() {
        let mut statuses = BTreeMap::new();
        statuses.insert("a".into(), HealthStatus::Healthy);
        statuses.insert("b".into(), HealthStatus::Unhealthy);
        let summary = HealthSummary::from_statuses(statuses, None);

        let json = serde_json::to_value(HealthResponse::from(summary)).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["total_agents"], 2);
        assert_eq!(json["failed_agents"], 1);
        assert_eq!(json["agent_statuses"]["b"], "unhealthy");
        assert!(json["last_checked"].is_null());
    }
}
