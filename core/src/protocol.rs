//! Host platform wire format
//!
//! Inbound events and outbound response envelopes, shaped after the
//! Alexa Skills Kit JSON interface.

pub mod request;
pub mod response;

pub use request::{
    Application, Context, Intent, Request, RequestEnvelope, RequestMeta, Session, Slot,
};
pub use response::{Card, OutputSpeech, Reprompt, ResponseBody, ResponseEnvelope, SpeechOutput};
