//! Skill capability and request lifecycle dispatch
//!
//! `Skill::execute` validates the application id, fires the session-started
//! hook for new sessions, and routes the request to exactly one lifecycle
//! callback.

pub mod intents;
pub mod narration;
pub mod plan_my_trip;

pub use intents::TripIntent;
pub use plan_my_trip::PlanMyTripSkill;

use crate::error::{Result, SkillError};
use crate::protocol::{Intent, Request, RequestEnvelope, RequestMeta, ResponseEnvelope, Session};

/// Something that can answer host platform lifecycle events
#[async_trait::async_trait]
pub trait Skill: Send + Sync {
    /// Identifier every inbound event must carry
    fn application_id(&self) -> &str;

    async fn on_session_started(&self, meta: &RequestMeta, session: &Session) {
        tracing::info!(
            "onSessionStarted requestId: {}, sessionId: {}",
            meta.request_id,
            session.session_id
        );
    }

    async fn on_launch(&self, meta: &RequestMeta, session: &Session) -> Result<ResponseEnvelope>;

    async fn on_intent(
        &self,
        meta: &RequestMeta,
        intent: &Intent,
        session: &Session,
    ) -> Result<ResponseEnvelope>;

    async fn on_session_ended(&self, meta: &RequestMeta, reason: Option<&str>, session: &Session) {
        tracing::info!(
            "onSessionEnded requestId: {}, sessionId: {}, reason: {}",
            meta.request_id,
            session.session_id,
            reason.unwrap_or("-")
        );
    }

    /// Handle one inbound event end to end
    async fn execute(&self, envelope: RequestEnvelope) -> Result<ResponseEnvelope> {
        let received = envelope.application_id();
        if received != Some(self.application_id()) {
            tracing::warn!(
                "Rejecting request {}: application id {:?} does not match",
                envelope.request.request_id(),
                received
            );
            return Err(SkillError::ApplicationIdMismatch {
                expected: self.application_id().to_string(),
                received: received.map(str::to_string),
            });
        }

        let session = envelope.session.unwrap_or_default();

        if session.new {
            match &envelope.request {
                Request::LaunchRequest { meta } | Request::IntentRequest { meta, .. } => {
                    self.on_session_started(meta, &session).await;
                }
                _ => {}
            }
        }

        match &envelope.request {
            Request::SessionStartedRequest { meta } => {
                self.on_session_started(meta, &session).await;
                Ok(ResponseEnvelope::empty())
            }
            Request::LaunchRequest { meta } => Ok(self
                .on_launch(meta, &session)
                .await?
                .with_session_attributes(session.attributes.clone())),
            Request::IntentRequest { meta, intent } => Ok(self
                .on_intent(meta, intent, &session)
                .await?
                .with_session_attributes(session.attributes.clone())),
            Request::SessionEndedRequest { meta, reason } => {
                self.on_session_ended(meta, reason.as_deref(), &session).await;
                Ok(ResponseEnvelope::empty())
            }
            Request::Unsupported => {
                tracing::warn!("Unsupported request type for session {}", session.session_id);
                Err(SkillError::UnsupportedRequest)
            }
        }
    }
}
