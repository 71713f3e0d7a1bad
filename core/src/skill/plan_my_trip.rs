//! The Plan My Trip skill
//!
//! Traffic updates, travel times to a handful of known places, and an SMS
//! "time to leave" reminder.

use std::sync::Arc;

use super::intents::TripIntent;
use super::narration::{self, SKILL_TITLE};
use super::Skill;
use crate::config::{Config, ConfigError};
use crate::error::{ProviderError, Result, SkillError};
use crate::places::PlaceBook;
use crate::protocol::{Intent, RequestMeta, ResponseEnvelope, Session, SpeechOutput};
use crate::providers::{
    build_http_client, BoundingBox, MapQuestRouting, MapQuestTraffic, MessagingProvider,
    OutboundMessage, RoutingProvider, TrafficProvider, TwilioMessaging,
};

/// Slot carrying the spoken destination
pub const END_LOCATION_SLOT: &str = "endLocation";

pub struct PlanMyTripSkill {
    app_id: String,
    area: BoundingBox,
    origin: String,
    places: PlaceBook,
    reminder: Option<OutboundMessage>,
    traffic: Arc<dyn TrafficProvider>,
    routing: Arc<dyn RoutingProvider>,
    messaging: Arc<dyn MessagingProvider>,
}

impl PlanMyTripSkill {
    /// Build the skill with the real HTTP providers
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let client = build_http_client(&config.http)?;

        let traffic = Arc::new(MapQuestTraffic::new(client.clone(), &config.traffic, &config.http));
        let routing = Arc::new(MapQuestRouting::new(client.clone(), &config.routing, &config.http));
        let messaging = Arc::new(TwilioMessaging::new(client, &config.messaging, &config.http));

        Self::with_providers(config, traffic, routing, messaging)
    }

    /// Build the skill around caller-supplied providers
    pub fn with_providers(
        config: &Config,
        traffic: Arc<dyn TrafficProvider>,
        routing: Arc<dyn RoutingProvider>,
        messaging: Arc<dyn MessagingProvider>,
    ) -> Result<Self> {
        let area = config
            .traffic
            .bounding_box
            .parse::<BoundingBox>()
            .map_err(|e| ConfigError::InvalidValue(format!("traffic.bounding_box: {}", e)))?;

        let reminder = config.messaging_ready().then(|| OutboundMessage {
            to: config.messaging.to_number.clone(),
            from: config.messaging.from_number.clone(),
            body: config.messaging.body.clone(),
        });
        if reminder.is_none() {
            tracing::warn!("Messaging is not configured; reminders will apologize");
        }

        Ok(Self {
            app_id: config.app_id.clone(),
            area,
            origin: config.routing.origin.clone(),
            places: config.places.clone(),
            reminder,
            traffic,
            routing,
            messaging,
        })
    }

    /// Answer a resolved intent
    pub async fn handle(&self, intent: TripIntent, slots: &Intent) -> Result<ResponseEnvelope> {
        match intent {
            TripIntent::TrafficUpdates => self.traffic_updates().await,
            TripIntent::TimeToArrival => self.time_to_arrival(slots).await,
            TripIntent::RemindMe => self.remind_me().await,
            TripIntent::TellFriends => Ok(self.tell_friends()),
            TripIntent::Help => Ok(help()),
            TripIntent::Stop | TripIntent::Cancel => Ok(farewell()),
        }
    }

    async fn traffic_updates(&self) -> Result<ResponseEnvelope> {
        let incidents = match self.traffic.incidents(&self.area).await {
            Ok(incidents) if incidents.is_empty() => {
                return apologize(ProviderError::EmptyResult);
            }
            Ok(incidents) => incidents,
            Err(err) => return apologize(err),
        };

        let (speech, card) = narration::traffic_report(&incidents);
        Ok(ResponseEnvelope::ask_with_card(
            speech,
            SpeechOutput::plain(narration::TRAFFIC_REPROMPT),
            narration::TRAFFIC_CARD_TITLE,
            card,
        ))
    }

    async fn time_to_arrival(&self, intent: &Intent) -> Result<ResponseEnvelope> {
        let Some(spoken) = intent.slot_value(END_LOCATION_SLOT) else {
            tracing::info!("No destination in {} slot; asking for one", END_LOCATION_SLOT);
            return Ok(ResponseEnvelope::ask(
                SpeechOutput::plain(narration::DESTINATION_PROMPT),
                SpeechOutput::plain(narration::DESTINATION_REPROMPT),
            ));
        };

        let destination = self.places.resolve(spoken);
        if !self.places.knows(spoken) {
            tracing::info!("Unknown place {:?}; using default address", spoken);
        }

        let estimate = match self.routing.travel_time(&self.origin, destination).await {
            Ok(estimate) => estimate,
            Err(err) => return apologize(err),
        };

        let (speech, card) = narration::eta_report(&estimate, destination);
        Ok(ResponseEnvelope::ask_with_card(
            speech,
            SpeechOutput::plain(narration::ETA_REPROMPT),
            narration::ETA_CARD_TITLE,
            card,
        ))
    }

    async fn remind_me(&self) -> Result<ResponseEnvelope> {
        let Some(message) = &self.reminder else {
            return apologize(ProviderError::NotConfigured {
                provider: "messaging".to_string(),
            });
        };

        match self.messaging.send(message).await {
            Ok(receipt) => {
                tracing::info!("Reminder sent, message sid: {}", receipt.sid);
                Ok(ResponseEnvelope::empty())
            }
            Err(err) => {
                // A 2xx reply without a sid may still have delivered the SMS
                tracing::warn!("Reminder failed, apologizing: {}", err);
                Ok(apology())
            }
        }
    }

    fn tell_friends(&self) -> ResponseEnvelope {
        tracing::debug!("Tell-friends is not implemented; returning empty response");
        ResponseEnvelope::empty()
    }
}

#[async_trait::async_trait]
impl Skill for PlanMyTripSkill {
    fn application_id(&self) -> &str {
        &self.app_id
    }

    async fn on_launch(&self, meta: &RequestMeta, session: &Session) -> Result<ResponseEnvelope> {
        tracing::info!(
            "onLaunch requestId: {}, sessionId: {}",
            meta.request_id,
            session.session_id
        );
        Ok(welcome())
    }

    async fn on_intent(
        &self,
        meta: &RequestMeta,
        intent: &Intent,
        session: &Session,
    ) -> Result<ResponseEnvelope> {
        tracing::info!(
            "onIntent {} requestId: {}, sessionId: {}",
            intent.name,
            meta.request_id,
            session.session_id
        );

        match TripIntent::lookup(&intent.name) {
            Ok(resolved) => self.handle(resolved, intent).await,
            Err(err @ SkillError::UnrecognizedIntent { .. }) => {
                tracing::warn!("{}; falling back to help", err);
                Ok(not_understood())
            }
            Err(err) => Err(err),
        }
    }
}

/// Terminal apology for recoverable provider failures; anything else surfaces
fn apologize(err: ProviderError) -> Result<ResponseEnvelope> {
    if !err.is_apologizable() {
        tracing::error!("Provider failure surfaced to host: {}", err);
        return Err(err.into());
    }
    tracing::warn!("Provider failure, apologizing: {}", err);
    Ok(apology())
}

fn apology() -> ResponseEnvelope {
    ResponseEnvelope::tell(SpeechOutput::plain(narration::APOLOGY))
}

fn welcome() -> ResponseEnvelope {
    ResponseEnvelope::ask_with_card(
        SpeechOutput::ssml(narration::WELCOME_SSML),
        SpeechOutput::plain(narration::WELCOME_REPROMPT),
        SKILL_TITLE,
        narration::WELCOME_CARD,
    )
}

fn help() -> ResponseEnvelope {
    ResponseEnvelope::ask(
        SpeechOutput::plain(narration::HELP),
        SpeechOutput::plain(narration::HELP_REPROMPT),
    )
}

fn farewell() -> ResponseEnvelope {
    ResponseEnvelope::tell(SpeechOutput::plain(narration::FAREWELL))
}

fn not_understood() -> ResponseEnvelope {
    ResponseEnvelope::ask(
        SpeechOutput::plain(format!("{} {}", narration::NOT_UNDERSTOOD, narration::HELP)),
        SpeechOutput::plain(narration::HELP_REPROMPT),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{OutputSpeech, RequestEnvelope};
    use crate::providers::{MessageReceipt, RouteEstimate, TrafficIncident};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const APP_ID: &str = "amzn1.ask.skill.plan-my-trip-test";

    /// Canned traffic answers
    struct StubTraffic {
        result: fn() -> std::result::Result<Vec<TrafficIncident>, ProviderError>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TrafficProvider for StubTraffic {
        async fn incidents(
            &self,
            _area: &BoundingBox,
        ) -> std::result::Result<Vec<TrafficIncident>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    /// Canned routing answers, remembering the last destination
    struct StubRouting {
        result: fn() -> std::result::Result<RouteEstimate, ProviderError>,
        last_to: Mutex<Option<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl RoutingProvider for StubRouting {
        async fn travel_time(
            &self,
            from: &str,
            to: &str,
        ) -> std::result::Result<RouteEstimate, ProviderError> {
            *self.last_to.lock().unwrap() = Some((from.to_string(), to.to_string()));
            (self.result)()
        }
    }

    struct StubMessaging {
        result: fn() -> std::result::Result<MessageReceipt, ProviderError>,
        sent: Mutex<Vec<OutboundMessage>>,
    }

    #[async_trait::async_trait]
    impl MessagingProvider for StubMessaging {
        async fn send(
            &self,
            message: &OutboundMessage,
        ) -> std::result::Result<MessageReceipt, ProviderError> {
            self.sent.lock().unwrap().push(message.clone());
            (self.result)()
        }
    }

    fn incident(desc: &str) -> TrafficIncident {
        TrafficIncident {
            short_description: desc.to_string(),
            delay_from_typical: Some(2.0),
            cross_road: None,
        }
    }

    fn four_incidents() -> std::result::Result<Vec<TrafficIncident>, ProviderError> {
        Ok(vec![
            incident("I-80 E: accident"),
            incident("US-101 N: construction"),
            incident("CA-1: congestion"),
            incident("I-280 S: debris"),
        ])
    }

    fn no_incidents() -> std::result::Result<Vec<TrafficIncident>, ProviderError> {
        Ok(Vec::new())
    }

    fn unreachable_network<T>() -> std::result::Result<T, ProviderError> {
        Err(ProviderError::Network {
            message: "connection refused".to_string(),
        })
    }

    fn timed_out<T>() -> std::result::Result<T, ProviderError> {
        Err(ProviderError::Timeout {
            duration: Duration::from_secs(10),
        })
    }

    fn malformed<T>() -> std::result::Result<T, ProviderError> {
        Err(ProviderError::MalformedBody {
            reason: "expected value at line 1".to_string(),
        })
    }

    fn route_125s() -> std::result::Result<RouteEstimate, ProviderError> {
        Ok(RouteEstimate { seconds: 125.0 })
    }

    fn route_120s() -> std::result::Result<RouteEstimate, ProviderError> {
        Ok(RouteEstimate { seconds: 120.0 })
    }

    fn sent_ok() -> std::result::Result<MessageReceipt, ProviderError> {
        Ok(MessageReceipt {
            sid: "SM123".to_string(),
        })
    }

    struct Harness {
        skill: PlanMyTripSkill,
        traffic: Arc<StubTraffic>,
        routing: Arc<StubRouting>,
        messaging: Arc<StubMessaging>,
    }

    fn test_config(with_messaging: bool) -> Config {
        let mut config = Config::default();
        config.app_id = APP_ID.to_string();
        config.traffic.api_key = "t".to_string();
        config.routing.api_key = "r".to_string();
        if with_messaging {
            config.messaging.account_sid = "AC1".to_string();
            config.messaging.auth_token = "tok".to_string();
            config.messaging.from_number = "+15550000001".to_string();
            config.messaging.to_number = "+15550000002".to_string();
        }
        config
    }

    fn harness_with(
        traffic: fn() -> std::result::Result<Vec<TrafficIncident>, ProviderError>,
        routing: fn() -> std::result::Result<RouteEstimate, ProviderError>,
        messaging: fn() -> std::result::Result<MessageReceipt, ProviderError>,
        with_messaging: bool,
    ) -> Harness {
        let traffic = Arc::new(StubTraffic {
            result: traffic,
            calls: AtomicUsize::new(0),
        });
        let routing = Arc::new(StubRouting {
            result: routing,
            last_to: Mutex::new(None),
        });
        let messaging = Arc::new(StubMessaging {
            result: messaging,
            sent: Mutex::new(Vec::new()),
        });
        let skill = PlanMyTripSkill::with_providers(
            &test_config(with_messaging),
            traffic.clone(),
            routing.clone(),
            messaging.clone(),
        )
        .unwrap();
        Harness {
            skill,
            traffic,
            routing,
            messaging,
        }
    }

    fn harness() -> Harness {
        harness_with(four_incidents, route_125s, sent_ok, true)
    }

    fn intent_event(name: &str, slots: serde_json::Value) -> RequestEnvelope {
        serde_json::from_value(json!({
            "version": "1.0",
            "session": {
                "new": false,
                "sessionId": "s-1",
                "application": { "applicationId": APP_ID },
                "attributes": {}
            },
            "request": {
                "type": "IntentRequest",
                "requestId": "r-1",
                "intent": { "name": name, "slots": slots }
            }
        }))
        .unwrap()
    }

    fn eta_event(place: &str) -> RequestEnvelope {
        intent_event(
            "GetTimeToArrivalIntent",
            json!({ "endLocation": { "name": "endLocation", "value": place } }),
        )
    }

    fn plain_text(response: &ResponseEnvelope) -> &str {
        match response.response.output_speech.as_ref() {
            Some(OutputSpeech::PlainText { text }) => text,
            other => panic!("expected plain text speech, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_launch_welcomes_with_card() {
        let h = harness();
        let event: RequestEnvelope = serde_json::from_value(json!({
            "session": { "new": true, "sessionId": "s", "application": { "applicationId": APP_ID } },
            "request": { "type": "LaunchRequest", "requestId": "r" }
        }))
        .unwrap();

        let response = h.skill.execute(event).await.unwrap();
        assert!(!response.ends_session());
        assert!(response.speech_text().unwrap().starts_with("<speak><p>Plan My Trip.</p>"));
        assert!(response.response.card.is_some());
        assert!(response.response.reprompt.is_some());
    }

    #[tokio::test]
    async fn test_every_recognized_intent_gets_one_envelope() {
        for (name, _) in TripIntent::TABLE {
            let h = harness();
            let response = h
                .skill
                .execute(eta_event_or_plain(name))
                .await
                .unwrap_or_else(|e| panic!("{} failed: {}", name, e));
            let value = serde_json::to_value(&response).unwrap();
            assert_eq!(value["version"], "1.0");
            assert!(value["response"]["shouldEndSession"].is_boolean());
        }
    }

    fn eta_event_or_plain(name: &str) -> RequestEnvelope {
        if name == "GetTimeToArrivalIntent" {
            eta_event("pier 39")
        } else {
            intent_event(name, json!({}))
        }
    }

    #[tokio::test]
    async fn test_traffic_reads_first_three_in_order() {
        let h = harness();
        let response = h
            .skill
            .execute(intent_event("GetTrafficUpdatesIntent", json!({})))
            .await
            .unwrap();

        assert!(!response.ends_session());
        let ssml = response.speech_text().unwrap();
        let first = ssml.find("I-80 E").unwrap();
        let second = ssml.find("US-101 N").unwrap();
        let third = ssml.find("CA-1").unwrap();
        assert!(first < second && second < third);
        assert!(!ssml.contains("I-280"));
        assert!(ssml.contains("<p>Firstly, </p>"));
        assert!(ssml.contains("<p>Secondly, </p>"));
        assert!(ssml.contains("<p>Lastly, </p>"));
        assert_eq!(h.traffic.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_traffic_with_no_incidents_apologizes() {
        let h = harness_with(no_incidents, route_125s, sent_ok, true);
        let response = h
            .skill
            .execute(intent_event("GetTrafficUpdatesIntent", json!({})))
            .await
            .unwrap();
        assert!(response.ends_session());
        assert_eq!(plain_text(&response), narration::APOLOGY);
    }

    #[tokio::test]
    async fn test_network_failure_is_identical_for_both_handlers() {
        let h = harness_with(unreachable_network, unreachable_network, sent_ok, true);
        let traffic = h
            .skill
            .execute(intent_event("GetTrafficUpdatesIntent", json!({})))
            .await
            .unwrap();
        let eta = h.skill.execute(eta_event("levis stadium")).await.unwrap();

        assert_eq!(traffic, eta);
        assert!(traffic.ends_session());
        assert_eq!(plain_text(&traffic), narration::APOLOGY);

        let h = harness_with(timed_out, timed_out, sent_ok, true);
        let timed = h.skill.execute(eta_event("levis stadium")).await.unwrap();
        assert_eq!(timed, eta);
    }

    #[tokio::test]
    async fn test_malformed_body_surfaces() {
        let h = harness_with(malformed, malformed, sent_ok, true);
        let err = h
            .skill
            .execute(intent_event("GetTrafficUpdatesIntent", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SkillError::Provider(ProviderError::MalformedBody { .. })
        ));
        assert!(h.skill.execute(eta_event("pier 39")).await.is_err());
    }

    #[tokio::test]
    async fn test_eta_rounds_up_and_resolves_place() {
        let h = harness();
        let response = h.skill.execute(eta_event("Levis Stadium")).await.unwrap();
        assert!(!response.ends_session());
        assert!(response.speech_text().unwrap().contains("is... 3 minutes."));

        let (from, to) = h.routing.last_to.lock().unwrap().clone().unwrap();
        assert_eq!(from, "Pier 48, San Francisco, CA");
        assert_eq!(to, "4900 Marie P DeBartolo Way, Santa Clara, CA");
    }

    #[tokio::test]
    async fn test_eta_exact_minute_boundary() {
        let h = harness_with(four_incidents, route_120s, sent_ok, true);
        let response = h.skill.execute(eta_event("twin peaks")).await.unwrap();
        assert!(response.speech_text().unwrap().contains("is... 2 minutes."));
    }

    #[tokio::test]
    async fn test_eta_unknown_place_uses_default_address() {
        let h = harness();
        h.skill.execute(eta_event("the moon")).await.unwrap();
        let (_, to) = h.routing.last_to.lock().unwrap().clone().unwrap();
        assert_eq!(to, "Pier 48, San Francisco, CA");
    }

    #[tokio::test]
    async fn test_eta_without_destination_asks() {
        let h = harness();
        let response = h
            .skill
            .execute(intent_event("GetTimeToArrivalIntent", json!({})))
            .await
            .unwrap();
        assert!(!response.ends_session());
        assert_eq!(plain_text(&response), narration::DESTINATION_PROMPT);
        assert!(h.routing.last_to.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remind_me_sends_one_fixed_message() {
        let h = harness();
        let response = h
            .skill
            .execute(intent_event("GetRemindMeIntent", json!({})))
            .await
            .unwrap();

        assert_eq!(response.response.output_speech, None);
        assert!(response.ends_session());

        let sent = h.messaging.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "+15550000002");
        assert_eq!(sent[0].from, "+15550000001");
        assert_eq!(sent[0].body, Config::default().messaging.body);
    }

    #[tokio::test]
    async fn test_remind_me_failure_apologizes() {
        let h = harness_with(four_incidents, route_125s, unreachable_network, true);
        let response = h
            .skill
            .execute(intent_event("GetRemindMeIntent", json!({})))
            .await
            .unwrap();
        assert_eq!(plain_text(&response), narration::APOLOGY);
    }

    #[tokio::test]
    async fn test_remind_me_unreadable_receipt_apologizes() {
        let h = harness_with(four_incidents, route_125s, malformed, true);
        let response = h
            .skill
            .handle(
                TripIntent::RemindMe,
                &Intent {
                    name: "GetRemindMeIntent".to_string(),
                    slots: Default::default(),
                },
            )
            .await
            .unwrap();
        assert!(response.ends_session());
        assert_eq!(plain_text(&response), narration::APOLOGY);
        assert_eq!(h.messaging.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remind_me_unconfigured_never_calls_provider() {
        let h = harness_with(four_incidents, route_125s, sent_ok, false);
        let response = h
            .skill
            .execute(intent_event("GetRemindMeIntent", json!({})))
            .await
            .unwrap();
        assert!(response.ends_session());
        assert_eq!(plain_text(&response), narration::APOLOGY);
        assert!(h.messaging.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tell_friends_is_a_valid_empty_reply() {
        let h = harness();
        let response = h
            .skill
            .execute(intent_event("GetTellFriendsIntent", json!({})))
            .await
            .unwrap();
        assert_eq!(response.response.output_speech, None);
        assert!(response.ends_session());
        assert!(h.messaging.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_help_continues_stop_and_cancel_terminate() {
        let h = harness();
        let help = h
            .skill
            .execute(intent_event("AMAZON.HelpIntent", json!({})))
            .await
            .unwrap();
        assert!(!help.ends_session());
        assert!(help.response.reprompt.is_some());

        for name in ["AMAZON.StopIntent", "AMAZON.CancelIntent"] {
            let response = h.skill.execute(intent_event(name, json!({}))).await.unwrap();
            assert!(response.ends_session());
            assert_eq!(plain_text(&response), narration::FAREWELL);
        }
    }

    #[tokio::test]
    async fn test_unrecognized_intent_falls_back_to_help() {
        let h = harness();
        let response = h
            .skill
            .execute(intent_event("OrderPizzaIntent", json!({})))
            .await
            .unwrap();
        assert!(!response.ends_session());
        assert!(plain_text(&response).starts_with(narration::NOT_UNDERSTOOD));
        assert_eq!(h.traffic.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_bounding_box_rejected_at_construction() {
        let mut config = test_config(false);
        config.traffic.bounding_box = "nowhere".to_string();
        let h = harness();
        let result = PlanMyTripSkill::with_providers(
            &config,
            h.traffic.clone(),
            h.routing.clone(),
            h.messaging.clone(),
        );
        assert!(matches!(
            result,
            Err(SkillError::Config(ConfigError::InvalidValue(_)))
        ));
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let mut config = test_config(false);
        config.traffic.api_key.clear();
        let err = PlanMyTripSkill::from_config(&config).err().unwrap();
        assert!(matches!(
            err,
            SkillError::Config(ConfigError::MissingValue(ref key)) if key == "traffic.api_key"
        ));
        assert_eq!(err.code(), crate::error::code::INTERNAL);
        assert!(PlanMyTripSkill::from_config(&test_config(false)).is_ok());
    }
}
