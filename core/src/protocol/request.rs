use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::SkillError;

/// One inbound event from the host platform
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub context: Option<Context>,
    pub request: Request,
}

impl RequestEnvelope {
    /// Parse one raw event, reporting shape errors as `MalformedEvent`
    pub fn from_json(raw: &str) -> Result<Self, SkillError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Application id from the session, falling back to the device context
    pub fn application_id(&self) -> Option<&str> {
        let from_session = self
            .session
            .as_ref()
            .and_then(|s| s.application.as_ref())
            .map(|a| a.application_id.as_str())
            .filter(|id| !id.is_empty());

        from_session.or_else(|| {
            self.context
                .as_ref()
                .map(|c| c.system.application.application_id.as_str())
                .filter(|id| !id.is_empty())
        })
    }

    pub fn session_id(&self) -> &str {
        self.session
            .as_ref()
            .map(|s| s.session_id.as_str())
            .unwrap_or("-")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub application: Option<Application>,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Context {
    #[serde(rename = "System")]
    pub system: SystemContext,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SystemContext {
    pub application: Application,
}

/// Fields every request type carries
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RequestMeta {
    pub request_id: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum Request {
    SessionStartedRequest {
        #[serde(flatten)]
        meta: RequestMeta,
    },
    LaunchRequest {
        #[serde(flatten)]
        meta: RequestMeta,
    },
    IntentRequest {
        #[serde(flatten)]
        meta: RequestMeta,
        intent: Intent,
    },
    SessionEndedRequest {
        #[serde(flatten)]
        meta: RequestMeta,
        #[serde(default)]
        reason: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

impl Request {
    pub fn request_id(&self) -> &str {
        match self {
            Request::SessionStartedRequest { meta }
            | Request::LaunchRequest { meta }
            | Request::IntentRequest { meta, .. }
            | Request::SessionEndedRequest { meta, .. } => &meta.request_id,
            Request::Unsupported => "-",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub slots: HashMap<String, Slot>,
}

impl Intent {
    /// Trimmed, non-empty value of a slot
    pub fn slot_value(&self, name: &str) -> Option<&str> {
        self.slots
            .get(name)
            .and_then(|slot| slot.value.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Slot {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}
