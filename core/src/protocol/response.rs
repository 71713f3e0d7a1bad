use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Speech as produced by a handler, before it is put on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutput {
    /// Read literally
    PlainText(String),
    /// A single `<speak>` document
    Ssml(String),
}

impl SpeechOutput {
    pub fn plain(text: impl Into<String>) -> Self {
        SpeechOutput::PlainText(text.into())
    }

    /// Wrap markup in one top-level `<speak>` element unless it already is one.
    ///
    /// The caller is responsible for escaping any untrusted text inside
    /// `markup` (see [`escape_text`]).
    pub fn ssml(markup: impl AsRef<str>) -> Self {
        let body = markup.as_ref().trim();
        if body.starts_with("<speak>") && body.ends_with("</speak>") {
            SpeechOutput::Ssml(body.to_string())
        } else {
            SpeechOutput::Ssml(format!("<speak>{}</speak>", body))
        }
    }

    pub fn text(&self) -> &str {
        match self {
            SpeechOutput::PlainText(text) | SpeechOutput::Ssml(text) => text,
        }
    }
}

/// Escape text for inclusion in an SSML document
pub fn escape_text(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Wire form of a speech string
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum OutputSpeech {
    PlainText { text: String },
    #[serde(rename = "SSML")]
    Ssml { ssml: String },
}

impl From<SpeechOutput> for OutputSpeech {
    fn from(speech: SpeechOutput) -> Self {
        match speech {
            SpeechOutput::PlainText(text) => OutputSpeech::PlainText { text },
            SpeechOutput::Ssml(ssml) => OutputSpeech::Ssml { ssml },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

/// Visual card shown on devices with a screen
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Card {
    Simple { title: String, content: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    pub should_end_session: bool,
}

/// Reply handed back to the host platform
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub version: String,
    #[serde(default)]
    pub session_attributes: HashMap<String, serde_json::Value>,
    pub response: ResponseBody,
}

impl ResponseEnvelope {
    fn with_body(response: ResponseBody) -> Self {
        Self {
            version: "1.0".to_string(),
            session_attributes: HashMap::new(),
            response,
        }
    }

    /// Terminal reply carrying no speech
    pub fn empty() -> Self {
        Self::with_body(ResponseBody {
            should_end_session: true,
            ..ResponseBody::default()
        })
    }

    /// Speak and end the session
    pub fn tell(speech: SpeechOutput) -> Self {
        Self::with_body(ResponseBody {
            output_speech: Some(speech.into()),
            should_end_session: true,
            ..ResponseBody::default()
        })
    }

    /// Speak and keep the session open, re-prompting if the user is silent
    pub fn ask(speech: SpeechOutput, reprompt: SpeechOutput) -> Self {
        Self::with_body(ResponseBody {
            output_speech: Some(speech.into()),
            reprompt: Some(Reprompt {
                output_speech: reprompt.into(),
            }),
            should_end_session: false,
            ..ResponseBody::default()
        })
    }

    pub fn ask_with_card(
        speech: SpeechOutput,
        reprompt: SpeechOutput,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::ask(speech, reprompt).with_card(title, content)
    }

    pub fn with_card(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.response.card = Some(Card::Simple {
            title: title.into(),
            content: content.into(),
        });
        self
    }

    pub fn with_session_attributes(
        mut self,
        attributes: HashMap<String, serde_json::Value>,
    ) -> Self {
        self.session_attributes = attributes;
        self
    }

    pub fn ends_session(&self) -> bool {
        self.response.should_end_session
    }

    /// Primary speech text, if any
    pub fn speech_text(&self) -> Option<&str> {
        self.response.output_speech.as_ref().map(|s| match s {
            OutputSpeech::PlainText { text } => text.as_str(),
            OutputSpeech::Ssml { ssml } => ssml.as_str(),
        })
    }
}
