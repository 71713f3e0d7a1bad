//! Outbound provider capabilities
//!
//! One async trait per external service so handlers can be exercised
//! against stubs. Every implementation makes exactly one HTTP call.

pub mod messaging;
pub mod routing;
pub mod traffic;

pub use messaging::{MessageReceipt, MessagingProvider, OutboundMessage, TwilioMessaging};
pub use routing::{MapQuestRouting, RouteEstimate, RoutingProvider};
pub use traffic::{BoundingBox, MapQuestTraffic, TrafficIncident, TrafficProvider};

use reqwest::Client as HttpClient;
use std::time::Duration;

use crate::config::{ConfigError, HttpConfig};
use crate::error::ProviderError;

/// Build the shared HTTP client used by every provider
pub fn build_http_client(config: &HttpConfig) -> Result<HttpClient, ConfigError> {
    HttpClient::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .user_agent(concat!("plan-my-trip/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::InvalidValue(format!("http client: {}", e)))
}

/// Send a prepared request and return the body of a successful response
pub(crate) async fn fetch_body(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<String, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::from_transport(e, timeout))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::from_transport(e, timeout))?;

    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: truncate(&body, 200),
        });
    }
    Ok(body)
}

/// Replace a credential in a URL before it is logged
pub(crate) fn redact(url: &str, secret: &str) -> String {
    if secret.is_empty() {
        url.to_string()
    } else {
        url.replace(secret, "***")
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
