//! HTTP endpoint for the skill
//!
//! `POST /` takes one host event and returns the response envelope.
//! Surfaced errors come back as `{ "error": { "code", "message" } }`.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use plan_my_trip_core::{RequestEnvelope, Skill, SkillError};

pub struct AppState {
    pub skill: Arc<dyn Skill>,
}

pub fn router(skill: Arc<dyn Skill>) -> Router {
    Router::new()
        .route("/", post(handle_event))
        .route("/health", get(health))
        .with_state(Arc::new(AppState { skill }))
}

pub async fn start_server(skill: Arc<dyn Skill>, host: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind server on {}", addr))?;

    tracing::info!(
        revision = env!("PLAN_MY_TRIP_REVISION"),
        "plan-my-trip listening on http://{}",
        addr
    );

    axum::serve(listener, router(skill))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutting down");
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn handle_event(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RequestEnvelope>, JsonRejection>,
) -> Response {
    let envelope = match payload {
        Ok(Json(envelope)) => envelope,
        Err(rejection) => {
            let err = SkillError::MalformedEvent(rejection.body_text());
            tracing::warn!("Rejected event: {}", err);
            return skill_error_response(&err);
        }
    };

    match state.skill.execute(envelope).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => {
            tracing::error!("Invocation failed: {}", err);
            skill_error_response(&err)
        }
    }
}

fn skill_error_response(err: &SkillError) -> Response {
    error_response(status_for(err), err.code(), &err.to_string())
}

fn status_for(err: &SkillError) -> StatusCode {
    match err {
        SkillError::ApplicationIdMismatch { .. } => StatusCode::UNAUTHORIZED,
        SkillError::UnsupportedRequest | SkillError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
        SkillError::UnrecognizedIntent { .. } => StatusCode::NOT_FOUND,
        SkillError::Provider(_) => StatusCode::BAD_GATEWAY,
        SkillError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "code": code, "message": message } })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_my_trip_core::protocol::{Intent, RequestMeta, Session, SpeechOutput};
    use plan_my_trip_core::config::ConfigError;
    use plan_my_trip_core::{ProviderError, ResponseEnvelope};
    use serde_json::Value;

    struct EchoSkill;

    #[async_trait::async_trait]
    impl Skill for EchoSkill {
        fn application_id(&self) -> &str {
            "amzn1.ask.skill.echo"
        }

        async fn on_launch(
            &self,
            _meta: &RequestMeta,
            _session: &Session,
        ) -> plan_my_trip_core::error::Result<ResponseEnvelope> {
            Ok(ResponseEnvelope::tell(SpeechOutput::plain("launched")))
        }

        async fn on_intent(
            &self,
            _meta: &RequestMeta,
            _intent: &Intent,
            _session: &Session,
        ) -> plan_my_trip_core::error::Result<ResponseEnvelope> {
            Err(ProviderError::MalformedBody {
                reason: "bad".to_string(),
            }
            .into())
        }
    }

    async fn spawn() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(EchoSkill))).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn post_event(base: &str, body: String) -> (u16, Value) {
        let response = reqwest::Client::new()
            .post(base)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    fn launch(app_id: &str) -> String {
        json!({
            "session": { "new": true, "sessionId": "s", "application": { "applicationId": app_id } },
            "request": { "type": "LaunchRequest", "requestId": "r" }
        })
        .to_string()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&SkillError::ApplicationIdMismatch {
                expected: "a".to_string(),
                received: None
            }),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&SkillError::UnsupportedRequest),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ProviderError::EmptyResult.into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&ConfigError::MissingValue("app_id".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_router_round_trip() {
        let base = spawn().await;

        let (status, body) = post_event(&base, launch("amzn1.ask.skill.echo")).await;
        assert_eq!(status, 200);
        assert_eq!(body["response"]["outputSpeech"]["text"], "launched");

        let (status, body) = post_event(&base, launch("amzn1.ask.skill.other")).await;
        assert_eq!(status, 401);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, body) = post_event(&base, "{\"request\": 5}".to_string()).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"]["code"], "INVALID");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("malformed event"));
    }
}
