//! Traffic incidents provider
//!
//! Queries incidents inside a bounding box (MapQuest traffic v2 shape).

use reqwest::Client as HttpClient;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::{fetch_body, redact};
use crate::config::{HttpConfig, TrafficConfig};
use crate::error::ProviderError;

/// Four coordinates, `lat,lon,lat,lon`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub corners: [f64; 4],
}

impl FromStr for BoundingBox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!("expected 4 comma-separated coordinates, got {}", parts.len()));
        }
        let mut corners = [0.0; 4];
        for (slot, part) in corners.iter_mut().zip(&parts) {
            *slot = part
                .parse::<f64>()
                .map_err(|_| format!("invalid coordinate: {}", part))?;
        }
        let [lat1, lon1, lat2, lon2] = corners;
        if !(-90.0..=90.0).contains(&lat1) || !(-90.0..=90.0).contains(&lat2) {
            return Err("latitude out of range".to_string());
        }
        if !(-180.0..=180.0).contains(&lon1) || !(-180.0..=180.0).contains(&lon2) {
            return Err("longitude out of range".to_string());
        }
        Ok(Self { corners })
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.corners;
        write!(f, "{:.4},{:.4},{:.4},{:.4}", a, b, c, d)
    }
}

/// One reported road incident
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficIncident {
    pub short_description: String,
    /// Minutes of delay over typical, when reported
    pub delay_from_typical: Option<f64>,
    pub cross_road: Option<String>,
}

/// Traffic capability
#[async_trait::async_trait]
pub trait TrafficProvider: Send + Sync {
    /// Incidents inside `area`, in provider order
    async fn incidents(&self, area: &BoundingBox) -> Result<Vec<TrafficIncident>, ProviderError>;
}

/// MapQuest traffic API client
pub struct MapQuestTraffic {
    client: HttpClient,
    endpoint: String,
    api_key: String,
    filters: String,
    timeout: Duration,
}

impl MapQuestTraffic {
    pub fn new(client: HttpClient, config: &TrafficConfig, http: &HttpConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            filters: config.filters.clone(),
            timeout: Duration::from_secs(http.timeout_secs),
        }
    }
}

#[async_trait::async_trait]
impl TrafficProvider for MapQuestTraffic {
    async fn incidents(&self, area: &BoundingBox) -> Result<Vec<TrafficIncident>, ProviderError> {
        let bbox = area.to_string();
        let request = self.client.get(&self.endpoint).query(&[
            ("key", self.api_key.as_str()),
            ("boundingBox", bbox.as_str()),
            ("filters", self.filters.as_str()),
        ]);

        if let Some(built) = request.try_clone().and_then(|r| r.build().ok()) {
            tracing::debug!("GET {}", redact(built.url().as_str(), &self.api_key));
        }

        let body = fetch_body(request, self.timeout).await?;
        let incidents = parse_incidents(&body)?;
        tracing::info!("Traffic provider returned {} incidents", incidents.len());
        Ok(incidents)
    }
}

/// Parse a traffic incidents response body.
///
/// A missing `incidents` list and incidents without `shortDesc` degrade to
/// "nothing to report"; a body that is not JSON at all is malformed.
pub fn parse_incidents(body: &str) -> Result<Vec<TrafficIncident>, ProviderError> {
    let json: Value = serde_json::from_str(body).map_err(|e| ProviderError::MalformedBody {
        reason: e.to_string(),
    })?;

    let incidents = match json.get("incidents") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ProviderError::MalformedBody {
                reason: "`incidents` is not an array".to_string(),
            })
        }
    };

    let parsed = incidents
        .iter()
        .filter_map(|item| {
            let short_description = item
                .get("shortDesc")
                .and_then(|d| d.as_str())
                .map(str::trim)
                .filter(|d| !d.is_empty())?;
            let delay_from_typical = item.get("delayFromTypical").and_then(|d| d.as_f64());
            let cross_road = item
                .get("parameterizedDescription")
                .and_then(|p| p.get("crossRoad2"))
                .and_then(|r| r.as_str())
                .map(str::to_string);

            Some(TrafficIncident {
                short_description: short_description.to_string(),
                delay_from_typical,
                cross_road,
            })
        })
        .collect();

    Ok(parsed)
}
