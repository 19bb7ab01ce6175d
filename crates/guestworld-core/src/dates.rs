use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc, Weekday};
use chrono_tz::Tz;
use regex::Regex;

/// The reference timezone the schedule rolls over in.
pub const SCHEDULE_TZ: Tz = chrono_tz::America::New_York;

/// A date-slot value resolved to a concrete day in the reference month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub day: u32,
    pub date: NaiveDate,
}

/// Reference time for one query invocation, supplied by the caller so the
/// engine itself stays clock-free and deterministic under test.
#[derive(Debug, Clone, Copy)]
pub struct QueryClock {
    now: NaiveDateTime,
}

impl QueryClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Current wall-clock time in the given timezone.
    pub fn now_in(tz: Tz) -> Self {
        Self::new(Utc::now().with_timezone(&tz).naive_local())
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }

    pub fn day(&self) -> u32 {
        self.now.day()
    }

    pub fn last_day(&self) -> u32 {
        last_day_of_month(self.today())
    }

    /// Whole hours and leftover minutes until the next midnight boundary.
    pub fn until_midnight(&self) -> (i64, i64) {
        let midnight = self
            .today()
            .succ_opt()
            .unwrap_or(self.today())
            .and_hms_opt(0, 0, 0)
            .expect("midnight is a valid time");
        let delta = midnight - self.now;
        (delta.num_hours(), delta.num_minutes() % 60)
    }
}

pub fn last_day_of_month(date: NaiveDate) -> u32 {
    first_of_next_month(date)
        .pred_opt()
        .map(|last| last.day())
        .expect("month arithmetic stays in range")
}

pub fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).expect("month arithmetic stays in range")
}

fn weekend_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{4})-W(\d{1,2})-WE$").expect("weekend pattern"))
}

fn recurring_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^XXXX-XX-(\d{2})$").expect("recurring pattern"))
}

/// Resolve a voice-platform date slot into concrete days, bounded to the
/// reference month.
///
/// Recognized encodings, in precedence order: ISO weekend (`YYYY-Www-WE`),
/// recurring day-of-month (`XXXX-XX-DD`), exact date (`YYYY-MM-DD`). Returns
/// at most two entries (a weekend); anything unparseable resolves to an empty
/// vec, which callers distinguish from "parsed but out of this month" by also
/// checking whether the raw slot was present.
pub fn resolve_date_slot(slot: Option<&str>, reference: NaiveDate) -> Vec<ResolvedDate> {
    let Some(raw) = slot.map(str::trim).filter(|value| !value.is_empty()) else {
        return Vec::new();
    };

    if let Some(captures) = weekend_pattern().captures(raw) {
        let Ok(year) = captures[1].parse::<i32>() else {
            return Vec::new();
        };
        let Ok(week) = captures[2].parse::<u32>() else {
            return Vec::new();
        };
        return [Weekday::Sat, Weekday::Sun]
            .into_iter()
            .filter_map(|weekday| NaiveDate::from_isoywd_opt(year, week, weekday))
            .filter(|date| date.year() == reference.year() && date.month() == reference.month())
            .map(|date| ResolvedDate {
                day: date.day(),
                date,
            })
            .collect();
    }

    if let Some(captures) = recurring_pattern().captures(raw) {
        let Ok(day) = captures[1].parse::<u32>() else {
            return Vec::new();
        };
        if day >= 1 && day <= last_day_of_month(reference) {
            if let Some(date) = reference.with_day(day) {
                return vec![ResolvedDate { day, date }];
            }
        }
        return Vec::new();
    }

    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) if date.year() == reference.year() && date.month() == reference.month() => {
            vec![ResolvedDate {
                day: date.day(),
                date,
            }]
        }
        _ => Vec::new(),
    }
}

/// Ordinal suffix for a day number: 1 -> "st", 12 -> "th", 23 -> "rd".
pub fn ordinal_suffix(day: u32) -> &'static str {
    match day {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

/// A day number with its suffix: "17th".
pub fn ordinal_day(day: u32) -> String {
    format!("{}{}", day, ordinal_suffix(day))
}

/// A spoken date like "February the 17th".
pub fn ordinal_date(date: NaiveDate) -> String {
    format!("{} the {}", date.format("%B"), ordinal_day(date.day()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn exact_date_resolves_only_within_reference_month() {
        let reference = reference(2026, 2, 10);
        let resolved = resolve_date_slot(Some("2026-02-17"), reference);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].day, 17);

        assert!(resolve_date_slot(Some("2026-03-01"), reference).is_empty());
        assert!(resolve_date_slot(Some("2025-02-17"), reference).is_empty());
    }

    #[test]
    fn recurring_day_respects_month_length() {
        let february = reference(2026, 2, 10);
        let resolved = resolve_date_slot(Some("XXXX-XX-27"), february);
        assert_eq!(resolved, vec![ResolvedDate {
            day: 27,
            date: reference(2026, 2, 27)
        }]);

        // February 2026 has 28 days.
        assert!(resolve_date_slot(Some("XXXX-XX-30"), february).is_empty());
    }

    #[test]
    fn weekend_resolves_to_saturday_and_sunday_of_iso_week() {
        // ISO week 33 of 2026: Saturday Aug 15, Sunday Aug 16.
        let august = reference(2026, 8, 10);
        let resolved = resolve_date_slot(Some("2026-W33-WE"), august);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].day, 15);
        assert_eq!(resolved[1].day, 16);

        // Unpadded week numbers are accepted too.
        let january = reference(2026, 1, 2);
        let resolved = resolve_date_slot(Some("2026-W1-WE"), january);
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn weekend_straddling_months_drops_outside_days() {
        // ISO week 31 of 2026: Saturday Aug 1, Sunday Aug 2. Seen from July,
        // both days fall outside the reference month.
        let july = reference(2026, 7, 28);
        assert!(resolve_date_slot(Some("2026-W31-WE"), july).is_empty());

        // ISO week 40 of 2026: Saturday Oct 3, Sunday Oct 4 — but week 44
        // spans Oct 31 / Nov 1, so only the Saturday survives from October.
        let october = reference(2026, 10, 20);
        let resolved = resolve_date_slot(Some("2026-W44-WE"), october);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].day, 31);
    }

    #[test]
    fn unparseable_slots_resolve_to_empty() {
        let reference = reference(2026, 8, 10);
        assert!(resolve_date_slot(None, reference).is_empty());
        assert!(resolve_date_slot(Some(""), reference).is_empty());
        assert!(resolve_date_slot(Some("next tuesday"), reference).is_empty());
        assert!(resolve_date_slot(Some("2026-W99-WE"), reference).is_empty());
    }

    #[test]
    fn ordinal_formatting_matches_spoken_style() {
        assert_eq!(ordinal_day(1), "1st");
        assert_eq!(ordinal_day(2), "2nd");
        assert_eq!(ordinal_day(3), "3rd");
        assert_eq!(ordinal_day(11), "11th");
        assert_eq!(ordinal_day(13), "13th");
        assert_eq!(ordinal_day(21), "21st");
        assert_eq!(ordinal_day(22), "22nd");
        assert_eq!(ordinal_date(reference(2026, 2, 17)), "February the 17th");
    }

    #[test]
    fn clock_reports_month_shape_and_midnight_distance() {
        let clock = QueryClock::new(
            reference(2026, 2, 28).and_hms_opt(21, 35, 0).unwrap(),
        );
        assert_eq!(clock.day(), 28);
        assert_eq!(clock.last_day(), 28);
        assert_eq!(clock.until_midnight(), (2, 25));

        let leap = QueryClock::new(reference(2028, 2, 1).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(leap.last_day(), 29);
    }
}
