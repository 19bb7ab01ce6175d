use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::dates::last_day_of_month;

/// Errors raised while loading persisted schedule artifacts.
///
/// A load failure is non-fatal to the process: callers convert it into the
/// [`Dataset::Unavailable`] marker and every query degrades to an apology.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact is empty")]
    Empty,
    #[error("invalid month key {0:?}")]
    InvalidMonthKey(String),
    #[error("invalid day key {0:?}")]
    InvalidDayKey(String),
    #[error("day {day} out of range for month {month}")]
    DayOutOfRange { month: String, day: u32 },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A dataset that either loaded or is known to be unavailable.
///
/// "Unavailable" is distinct from "loaded but sparse": the former yields a
/// fixed apology before any lookup, the latter answers day by day.
#[derive(Debug, Clone)]
pub enum Dataset<T> {
    Loaded(T),
    Unavailable,
}

impl<T> Dataset<T> {
    pub fn as_loaded(&self) -> Option<&T> {
        match self {
            Dataset::Loaded(data) => Some(data),
            Dataset::Unavailable => None,
        }
    }

    pub fn from_load(label: &str, result: Result<T, StoreError>) -> Self {
        match result {
            Ok(data) => Dataset::Loaded(data),
            Err(err) => {
                error!(artifact = label, error = %err, "Failed to load artifact");
                Dataset::Unavailable
            }
        }
    }
}

/// Day-indexed guest world names, 1-indexed with a sentinel in slot 0 so
/// natural day numbers index directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldList {
    days: Vec<String>,
}

const INDEX_ZERO_SENTINEL: &str = "IndexZero";

impl WorldList {
    /// Parse the GuestWorlds.csv artifact: one line per day,
    /// `"<worlds joined by and>,<day>"`. The day column is informational;
    /// position is re-derived from line order.
    pub fn from_csv(csv: &str) -> Result<Self, StoreError> {
        let mut days = vec![INDEX_ZERO_SENTINEL.to_string()];
        for line in csv.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let worlds = line.split(',').next().unwrap_or(line);
            // Known source-data quirk: one world arrives as an all-caps token.
            days.push(worlds.replace("NEWYORK", "New York"));
        }
        if days.len() == 1 {
            return Err(StoreError::Empty);
        }
        info!(days = days.len() - 1, "Loaded guest world calendar");
        Ok(Self { days })
    }

    /// The spoken world names for a 1-indexed day, if the calendar covers it.
    pub fn world_on(&self, day: u32) -> Option<&str> {
        if day == 0 {
            return None;
        }
        self.days.get(day as usize).map(String::as_str)
    }

    pub fn day_count(&self) -> u32 {
        (self.days.len() - 1) as u32
    }
}

/// Challenge category keys used in the persisted JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeCategory {
    Route,
    Climb,
}

impl ChallengeCategory {
    pub const BOTH: [ChallengeCategory; 2] = [ChallengeCategory::Route, ChallengeCategory::Climb];
}

/// One route or climb of the week, as persisted by the snapshot job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeEntry {
    pub name: String,
    pub xp: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_ssml: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_mi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_ft: Option<f64>,
}

/// The challenges starting on one day. Either category may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeDay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<ChallengeEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climb: Option<ChallengeEntry>,
}

impl ChallengeDay {
    pub fn get(&self, category: ChallengeCategory) -> Option<&ChallengeEntry> {
        match category {
            ChallengeCategory::Route => self.route.as_ref(),
            ChallengeCategory::Climb => self.climb.as_ref(),
        }
    }
}

/// An active challenge span: `start` through `end` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeSpan {
    pub start: u32,
    pub end: u32,
}

/// One month of challenges, run-length encoded by start day: an entry is
/// active from its start day until the next start day (or month end).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChallengeMonth {
    days: BTreeMap<u32, ChallengeDay>,
}

impl ChallengeMonth {
    /// The entry active on `day`: the one with the greatest start day <= `day`.
    pub fn active_on(&self, day: u32) -> Option<(u32, &ChallengeDay)> {
        self.days
            .range(..=day)
            .next_back()
            .map(|(start, entry)| (*start, entry))
    }

    /// All spans in start order, with each end derived from the next start
    /// (or `last_day` for the final entry).
    pub fn spans(&self, last_day: u32) -> Vec<(ChallengeSpan, &ChallengeDay)> {
        let starts: Vec<u32> = self.days.keys().copied().collect();
        starts
            .iter()
            .enumerate()
            .map(|(index, &start)| {
                let end = starts
                    .get(index + 1)
                    .map(|next| next - 1)
                    .unwrap_or(last_day);
                (ChallengeSpan { start, end }, &self.days[&start])
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// All loaded challenge months, keyed `"YYYY-MM"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChallengeData {
    months: BTreeMap<String, ChallengeMonth>,
}

impl ChallengeData {
    /// Parse the WeeklyChallenges.json artifact. Day keys are strings in the
    /// persisted form; a non-numeric or out-of-range key fails the whole load,
    /// so every start day downstream is known to fit its month.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let raw: BTreeMap<String, BTreeMap<String, ChallengeDay>> = serde_json::from_str(json)?;
        let mut months = BTreeMap::new();
        for (month_key, raw_days) in raw {
            let Some(last_day) = month_length(&month_key) else {
                return Err(StoreError::InvalidMonthKey(month_key));
            };
            let mut days = BTreeMap::new();
            for (day_key, entry) in raw_days {
                let day: u32 = day_key
                    .parse()
                    .map_err(|_| StoreError::InvalidDayKey(day_key.clone()))?;
                if day < 1 || day > last_day {
                    return Err(StoreError::DayOutOfRange {
                        month: month_key.clone(),
                        day,
                    });
                }
                days.insert(day, entry);
            }
            months.insert(month_key, ChallengeMonth { days });
        }
        info!(months = months.len(), "Loaded weekly challenge data");
        Ok(Self { months })
    }

    pub fn month(&self, key: &str) -> Option<&ChallengeMonth> {
        self.months.get(key)
    }
}

/// Number of days in a `"YYYY-MM"` month key, or `None` for a malformed key.
fn month_length(key: &str) -> Option<u32> {
    let (year, month) = key.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(last_day_of_month(first))
}

/// Immutable per-process snapshot of both schedule datasets, constructed once
/// at cold start and passed into the query engine by reference.
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    pub worlds: Dataset<WorldList>,
    pub challenges: Dataset<ChallengeData>,
}

impl ScheduleStore {
    /// Build a store from already-fetched artifact text. `None` inputs and
    /// parse failures both become the unavailable marker.
    pub fn load(world_csv: Option<&str>, challenge_json: Option<&str>) -> Self {
        let worlds = match world_csv {
            Some(csv) => Dataset::from_load("GuestWorlds.csv", WorldList::from_csv(csv)),
            None => Dataset::Unavailable,
        };
        let challenges = match challenge_json {
            Some(json) => {
                Dataset::from_load("WeeklyChallenges.json", ChallengeData::from_json(json))
            }
            None => Dataset::Unavailable,
        };
        Self { worlds, challenges }
    }

    pub fn unavailable() -> Self {
        Self {
            worlds: Dataset::Unavailable,
            challenges: Dataset::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_load_is_one_indexed_with_sentinel() {
        let worlds = WorldList::from_csv("Yorkshire and Innsbruck,1\nParis,2\n").unwrap();
        assert_eq!(worlds.day_count(), 2);
        assert_eq!(worlds.world_on(0), None);
        assert_eq!(worlds.world_on(1), Some("Yorkshire and Innsbruck"));
        assert_eq!(worlds.world_on(2), Some("Paris"));
        assert_eq!(worlds.world_on(3), None);
    }

    #[test]
    fn csv_load_applies_display_name_correction() {
        let worlds = WorldList::from_csv("NEWYORK and France,1\n").unwrap();
        assert_eq!(worlds.world_on(1), Some("New York and France"));
    }

    #[test]
    fn empty_csv_is_a_load_failure() {
        assert!(matches!(WorldList::from_csv(""), Err(StoreError::Empty)));
        assert!(matches!(WorldList::from_csv("\n\n"), Err(StoreError::Empty)));
    }

    #[test]
    fn active_entry_uses_greatest_start_at_or_before_day() {
        let json = r#"{"2026-08": {
            "1": {"route": {"name": "A", "xp": 100}},
            "8": {"route": {"name": "B", "xp": 200}},
            "15": {"route": {"name": "C", "xp": 300}},
            "22": {"route": {"name": "D", "xp": 400}}
        }}"#;
        let data = ChallengeData::from_json(json).unwrap();
        let month = data.month("2026-08").unwrap();

        let (start, entry) = month.active_on(10).unwrap();
        assert_eq!(start, 8);
        assert_eq!(entry.route.as_ref().unwrap().name, "B");

        assert_eq!(month.active_on(22).unwrap().0, 22);
        assert_eq!(month.active_on(31).unwrap().0, 22);
        assert!(month.active_on(0).is_none());
    }

    #[test]
    fn spans_derive_ends_from_next_start() {
        let json = r#"{"2026-08": {
            "1": {"route": {"name": "A", "xp": 100}},
            "15": {"route": {"name": "B", "xp": 200}}
        }}"#;
        let data = ChallengeData::from_json(json).unwrap();
        let spans = data.month("2026-08").unwrap().spans(31);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].0, ChallengeSpan { start: 1, end: 14 });
        assert_eq!(spans[1].0, ChallengeSpan { start: 15, end: 31 });
    }

    #[test]
    fn day_keys_must_fit_their_month() {
        // February 2026 has 28 days; a start day of 30 is corrupt data.
        let json = r#"{"2026-02": {
            "10": {"route": {"name": "A", "xp": 100}},
            "30": {"route": {"name": "B", "xp": 200}}
        }}"#;
        assert!(matches!(
            ChallengeData::from_json(json),
            Err(StoreError::DayOutOfRange { day: 30, .. })
        ));

        let zero = r#"{"2026-02": {"0": {"route": {"name": "A", "xp": 100}}}}"#;
        assert!(matches!(
            ChallengeData::from_json(zero),
            Err(StoreError::DayOutOfRange { day: 0, .. })
        ));

        let bad_month = r#"{"February": {"1": {"route": {"name": "A", "xp": 100}}}}"#;
        assert!(matches!(
            ChallengeData::from_json(bad_month),
            Err(StoreError::InvalidMonthKey(_))
        ));

        let leap = r#"{"2028-02": {"29": {"route": {"name": "A", "xp": 100}}}}"#;
        assert!(ChallengeData::from_json(leap).is_ok());
    }

    #[test]
    fn store_load_marks_bad_artifacts_unavailable() {
        let store = ScheduleStore::load(Some(""), Some("not json"));
        assert!(store.worlds.as_loaded().is_none());
        assert!(store.challenges.as_loaded().is_none());

        let store = ScheduleStore::load(Some("Paris,1\n"), None);
        assert!(store.worlds.as_loaded().is_some());
        assert!(store.challenges.as_loaded().is_none());
    }
}
