//! Intent dispatch table

use crate::error::SkillError;

/// Every intent this skill answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripIntent {
    TrafficUpdates,
    TimeToArrival,
    RemindMe,
    TellFriends,
    Help,
    Stop,
    Cancel,
}

impl TripIntent {
    /// Name -> intent. Exact, case-sensitive.
    pub const TABLE: [(&'static str, TripIntent); 7] = [
        ("GetTrafficUpdatesIntent", TripIntent::TrafficUpdates),
        ("GetTimeToArrivalIntent", TripIntent::TimeToArrival),
        ("GetRemindMeIntent", TripIntent::RemindMe),
        ("GetTellFriendsIntent", TripIntent::TellFriends),
        ("AMAZON.HelpIntent", TripIntent::Help),
        ("AMAZON.StopIntent", TripIntent::Stop),
        ("AMAZON.CancelIntent", TripIntent::Cancel),
    ];

    pub fn lookup(name: &str) -> Result<Self, SkillError> {
        Self::TABLE
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, intent)| *intent)
            .ok_or_else(|| SkillError::UnrecognizedIntent {
                name: name.to_string(),
            })
    }
}
