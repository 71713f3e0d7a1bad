//! Directions provider
//!
//! Real-time travel duration between two addresses (MapQuest directions v2).

use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;

use super::{fetch_body, redact};
use crate::config::{HttpConfig, RoutingConfig};
use crate::error::ProviderError;

/// Travel-time estimate for one route
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEstimate {
    pub seconds: f64,
}

impl RouteEstimate {
    /// Whole minutes, rounded up so a trip is never reported shorter than it is
    pub fn minutes(&self) -> u64 {
        (self.seconds / 60.0).ceil() as u64
    }
}

/// Routing capability
#[async_trait::async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn travel_time(&self, from: &str, to: &str) -> Result<RouteEstimate, ProviderError>;
}

/// MapQuest directions API client
pub struct MapQuestRouting {
    client: HttpClient,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl MapQuestRouting {
    pub fn new(client: HttpClient, config: &RoutingConfig, http: &HttpConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(http.timeout_secs),
        }
    }
}

#[async_trait::async_trait]
impl RoutingProvider for MapQuestRouting {
    async fn travel_time(&self, from: &str, to: &str) -> Result<RouteEstimate, ProviderError> {
        let request = self.client.get(&self.endpoint).query(&[
            ("key", self.api_key.as_str()),
            ("from", from),
            ("to", to),
        ]);

        if let Some(built) = request.try_clone().and_then(|r| r.build().ok()) {
            tracing::debug!("GET {}", redact(built.url().as_str(), &self.api_key));
        }

        let body = fetch_body(request, self.timeout).await?;
        let estimate = parse_route(&body)?;
        tracing::info!(
            "Route {} -> {}: {}s ({} min)",
            from,
            to,
            estimate.seconds,
            estimate.minutes()
        );
        Ok(estimate)
    }
}

/// Parse a directions response body.
///
/// No `route`, no `realTime`, or a nonsensical duration means there is no
/// usable route; a non-JSON body is malformed.
pub fn parse_route(body: &str) -> Result<RouteEstimate, ProviderError> {
    let json: Value = serde_json::from_str(body).map_err(|e| ProviderError::MalformedBody {
        reason: e.to_string(),
    })?;

    let seconds = json
        .get("route")
        .and_then(|r| r.get("realTime"))
        .and_then(|t| t.as_f64())
        .ok_or(ProviderError::EmptyResult)?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ProviderError::EmptyResult);
    }

    Ok(RouteEstimate { seconds })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_round_up() {
        assert_eq!(RouteEstimate { seconds: 125.0 }.minutes(), 3);
        assert_eq!(RouteEstimate { seconds: 120.0 }.minutes(), 2);
        assert_eq!(RouteEstimate { seconds: 1.0 }.minutes(), 1);
        assert_eq!(RouteEstimate { seconds: 0.0 }.minutes(), 0);
        assert_eq!(RouteEstimate { seconds: 3599.5 }.minutes(), 60);
    }

    #[test]
    fn test_parse_route() {
        let body = r#"{"route": {"realTime": 1534, "time": 1400, "distance": 44.2}, "info": {}}"#;
        let estimate = parse_route(body).unwrap();
        assert_eq!(estimate.seconds, 1534.0);
        assert_eq!(estimate.minutes(), 26);
    }

    #[test]
    fn test_parse_route_without_result() {
        assert!(matches!(parse_route("{}"), Err(ProviderError::EmptyResult)));
        assert!(matches!(
            parse_route(r#"{"route": {"routeError": {"errorCode": 2}}}"#),
            Err(ProviderError::EmptyResult)
        ));
        assert!(matches!(
            parse_route(r#"{"route": {"realTime": "soon"}}"#),
            Err(ProviderError::EmptyResult)
        ));
        assert!(matches!(
            parse_route(r#"{"route": {"realTime": -5}}"#),
            Err(ProviderError::EmptyResult)
        ));
    }

    #[test]
    fn test_parse_route_malformed() {
        assert!(matches!(
            parse_route("Service Unavailable"),
            Err(ProviderError::MalformedBody { .. })
        ));
    }
}
