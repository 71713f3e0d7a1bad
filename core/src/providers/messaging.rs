//! SMS provider
//!
//! Sends a single text message through the Twilio REST API.

use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;

use super::fetch_body;
use crate::config::{HttpConfig, MessagingConfig};
use crate::error::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub from: String,
    pub body: String,
}

/// Provider acknowledgement of an accepted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReceipt {
    pub sid: String,
}

/// Messaging capability
#[async_trait::async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<MessageReceipt, ProviderError>;
}

pub struct TwilioMessaging {
    client: HttpClient,
    base_url: String,
    account_sid: String,
    auth_token: String,
    timeout: Duration,
}

impl TwilioMessaging {
    pub fn new(client: HttpClient, config: &MessagingConfig, http: &HttpConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            timeout: Duration::from_secs(http.timeout_secs),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}

#[async_trait::async_trait]
impl MessagingProvider for TwilioMessaging {
    async fn send(&self, message: &OutboundMessage) -> Result<MessageReceipt, ProviderError> {
        if self.account_sid.is_empty() || self.auth_token.is_empty() {
            return Err(ProviderError::NotConfigured {
                provider: "twilio".to_string(),
            });
        }

        let request = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", message.to.as_str()),
                ("From", message.from.as_str()),
                ("Body", message.body.as_str()),
            ]);

        let body = fetch_body(request, self.timeout).await?;
        parse_receipt(&body)
    }
}

/// Extract the message sid from a create-message response
pub fn parse_receipt(body: &str) -> Result<MessageReceipt, ProviderError> {
    let json: Value = serde_json::from_str(body).map_err(|e| ProviderError::MalformedBody {
        reason: e.to_string(),
    })?;

    json.get("sid")
        .and_then(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .map(|sid| MessageReceipt {
            sid: sid.to_string(),
        })
        .ok_or_else(|| ProviderError::MalformedBody {
            reason: "response has no message sid".to_string(),
        })
}
