use chrono::NaiveDateTime;
use clap::{Parser, ValueEnum, ValueHint};
use guestworld_core::{Intent, Slots};

/// Top-level CLI entrypoint.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Answer guest world schedule questions from local artifacts")]
pub struct Cli {
    /// Question to answer.
    #[arg(long = "intent", value_enum, default_value_t = IntentArg::Today)]
    pub intent: IntentArg,

    /// World name slot, e.g. "Yorkshire".
    #[arg(long = "world")]
    pub world: Option<String>,

    /// Date slot in platform form: YYYY-MM-DD, XXXX-XX-DD, or YYYY-Www-WE.
    #[arg(long = "date")]
    pub date: Option<String>,

    /// Challenge type slot: "route of the week" or "climb of the week".
    #[arg(long = "challenge-type")]
    pub challenge_type: Option<String>,

    /// Challenge detail slot: XP, distance, or elevation.
    #[arg(long = "challenge-detail")]
    pub challenge_detail: Option<String>,

    /// Challenge timeframe slot: "next week", "this month", or "next month".
    #[arg(long = "timeframe")]
    pub timeframe: Option<String>,

    /// BCP 47 locale tag controlling the unit system.
    #[arg(long = "locale")]
    pub locale: Option<String>,

    /// Path to the guest world CSV artifact (defaults to config, then cwd).
    #[arg(long = "worlds-csv", value_hint = ValueHint::FilePath)]
    pub worlds_csv: Option<String>,

    /// Path to the weekly challenge JSON artifact (defaults to config, then cwd).
    #[arg(long = "challenges-json", value_hint = ValueHint::FilePath)]
    pub challenges_json: Option<String>,

    /// Session state file carried between invocations.
    #[arg(long = "session-file", value_hint = ValueHint::FilePath)]
    pub session_file: Option<String>,

    /// Fixed reference time (naive ISO 8601, e.g. 2026-08-12T09:00:00)
    /// instead of the current Eastern wall clock.
    #[arg(long = "at", value_name = "DATETIME")]
    pub at: Option<String>,
}

/// CLI spelling of each supported intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IntentArg {
    Launch,
    Today,
    Tomorrow,
    WhenWorld,
    WorldOnDate,
    NextWorld,
    WeeklyChallenge,
    AfterThat,
    Help,
    Stop,
}

impl IntentArg {
    pub fn to_intent(self) -> Intent {
        match self {
            IntentArg::Launch => Intent::Launch,
            IntentArg::Today => Intent::Today,
            IntentArg::Tomorrow => Intent::Tomorrow,
            IntentArg::WhenWorld => Intent::WhenWorld,
            IntentArg::WorldOnDate => Intent::WorldOnDate,
            IntentArg::NextWorld => Intent::NextWorld,
            IntentArg::WeeklyChallenge => Intent::WeeklyChallenge,
            IntentArg::AfterThat => Intent::AfterThat,
            IntentArg::Help => Intent::Help,
            IntentArg::Stop => Intent::Stop,
        }
    }
}

impl Cli {
    pub fn to_slots(&self) -> Slots {
        Slots {
            world: self.world.clone(),
            date: self.date.clone(),
            challenge_type: self.challenge_type.clone(),
            challenge_detail: self.challenge_detail.clone(),
            challenge_timeframe: self.timeframe.clone(),
        }
    }

    /// Parse the `--at` override, if given.
    pub fn reference_time(&self) -> Result<Option<NaiveDateTime>, String> {
        let Some(raw) = self.at.as_deref() else {
            return Ok(None);
        };
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
            .map(Some)
            .map_err(|err| format!("Invalid --at value {raw:?}: {err}"))
    }
}
