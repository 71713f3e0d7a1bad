//! Spoken text for the Plan My Trip skill

use crate::protocol::response::escape_text;
use crate::protocol::SpeechOutput;
use crate::providers::{RouteEstimate, TrafficIncident};

pub const SKILL_TITLE: &str = "Plan My Trip";

pub const APOLOGY: &str =
    "There is a problem connecting to the map service at this time. Please try again later.";

pub const FAREWELL: &str = "Goodbye";

pub const WELCOME_SSML: &str = "<p>Plan My Trip.</p> <p>With Plan My Trip, you can get the traffic updates near you. \
For example, you could say traffic update, or are the roads bad. \
Now, would you like to know how the traffic is?</p>";
pub const WELCOME_REPROMPT: &str = "Would you like to know how the traffic is?";
pub const WELCOME_CARD: &str = "Plan My Trip. Would you like to know how the traffic is?";

pub const HELP: &str = "With Plan My Trip, you can get traffic updates, find out distance and time to your chosen location, \
remind yourself to leave, and let your friends know of your E T A. \
For example, you could say hows the traffic, what is my e t a to Levis Stadium, or you can say exit. \
Now, what would you like to do?";
pub const HELP_REPROMPT: &str = "What would you like to do?";

pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that.";

pub const TRAFFIC_PREFIX: &str = "The issues on the roads are these... ";
pub const TRAFFIC_REPROMPT: &str = "Would you like to know the traffic again?";
pub const TRAFFIC_CARD_TITLE: &str = "Traffic Update";

pub const ETA_PREFIX: &str = "The time taken to the destination through current traffic conditions is... ";
pub const ETA_REPROMPT: &str = "Would you like to know the traffic again?";
pub const ETA_CARD_TITLE: &str = "Plan this route";

pub const DESTINATION_PROMPT: &str = "Where would you like to go? For example, you could say Levis Stadium.";
pub const DESTINATION_REPROMPT: &str = "Where would you like to go?";

/// How many incidents get read out
pub const MAX_SPOKEN_INCIDENTS: usize = 3;

/// Ordinal lead-ins for `count` spoken incidents
fn ordinals(count: usize) -> &'static [&'static str] {
    match count {
        0 | 1 => &[],
        2 => &["Firstly", "Lastly"],
        _ => &["Firstly", "Secondly", "Lastly"],
    }
}

/// Spoken and card renditions of the first few incidents.
///
/// Fewer than three incidents shortens the ordinal sequence instead of
/// reading placeholders.
pub fn traffic_report(incidents: &[TrafficIncident]) -> (SpeechOutput, String) {
    let spoken: Vec<&TrafficIncident> = incidents.iter().take(MAX_SPOKEN_INCIDENTS).collect();
    let leads = ordinals(spoken.len());

    let mut markup = String::from(TRAFFIC_PREFIX);
    let mut card = Vec::with_capacity(spoken.len());
    for (idx, incident) in spoken.iter().enumerate() {
        let description = incident.short_description.trim_end_matches('.');
        match leads.get(idx) {
            Some(lead) => {
                markup.push_str(&format!("<p>{}, </p>{}. ", lead, escape_text(description)));
                card.push(format!("{}, {}.", lead, description));
            }
            None => {
                markup.push_str(&format!("<p>{}.</p> ", escape_text(description)));
                card.push(format!("{}.", description));
            }
        }
    }

    (SpeechOutput::ssml(markup), card.join("\n"))
}

/// Spoken and card renditions of a travel-time estimate
pub fn eta_report(estimate: &RouteEstimate, destination: &str) -> (SpeechOutput, String) {
    let minutes = estimate.minutes();
    let unit = if minutes == 1 { "minute" } else { "minutes" };
    let speech = SpeechOutput::ssml(format!("{}{} {}. ", ETA_PREFIX, minutes, unit));
    let card = format!("About {} {} to {}", minutes, unit, destination);
    (speech, card)
}
