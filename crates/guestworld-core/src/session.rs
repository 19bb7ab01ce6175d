use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::store::ChallengeCategory;

const CURRENT_SESSION_VERSION: u32 = 1;

/// Which kind of question the session last answered, for "after that" routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LastContext {
    World,
    Challenge,
}

/// Ephemeral per-conversation state, owned by the calling voice platform and
/// passed by value into and out of every query.
///
/// Unknown or missing fields deserialize to defaults so payloads written by
/// older versions remain readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default = "default_session_version")]
    pub version: u32,
    #[serde(default)]
    pub last_context: Option<LastContext>,
    #[serde(default)]
    pub last_answered_day: Option<u32>,
    #[serde(default)]
    pub last_challenge_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_challenge_categories: Option<Vec<ChallengeCategory>>,
}

fn default_session_version() -> u32 {
    CURRENT_SESSION_VERSION
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            version: CURRENT_SESSION_VERSION,
            last_context: None,
            last_answered_day: None,
            last_challenge_date: None,
            last_challenge_categories: None,
        }
    }
}

impl SessionContext {
    pub fn note_world_answer(&mut self, day: u32) {
        self.last_context = Some(LastContext::World);
        self.last_answered_day = Some(day);
    }

    pub fn note_challenge_answer(&mut self, date: NaiveDate, categories: Vec<ChallengeCategory>) {
        self.last_context = Some(LastContext::Challenge);
        self.last_challenge_date = Some(date);
        self.last_challenge_categories = Some(categories);
    }
}
