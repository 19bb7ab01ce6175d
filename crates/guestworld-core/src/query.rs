use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::dates::{QueryClock, ResolvedDate, last_day_of_month, ordinal_date, ordinal_day, resolve_date_slot};
use crate::session::{LastContext, SessionContext};
use crate::speech::{
    CHALLENGES_UNAVAILABLE, GENERIC_APOLOGY, GOODBYE, HELP_PROMPT, LAUNCH_PROMPT,
    WORLDS_UNAVAILABLE, category_label, finalize_ssml, format_distance, format_elevation,
    overview_tail, spoken_name, use_imperial,
};
use crate::store::{ChallengeCategory, ChallengeData, ChallengeDay, ScheduleStore, WorldList};

/// Closed set of recognized intents. Adding one is a compile-checked change
/// everywhere `handle_query` matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
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

/// Raw slot values as delivered by the voice platform. Absent and empty are
/// both modeled as `None` by the resolution helpers.
#[derive(Debug, Clone, Default)]
pub struct Slots {
    pub world: Option<String>,
    pub date: Option<String>,
    pub challenge_type: Option<String>,
    pub challenge_detail: Option<String>,
    pub challenge_timeframe: Option<String>,
}

/// One normalized voice query.
#[derive(Debug, Clone)]
pub struct Query {
    pub intent: Intent,
    pub slots: Slots,
    pub locale: String,
    pub session: SessionContext,
}

/// What the adapter speaks back, plus the session to carry forward.
#[derive(Debug, Clone)]
pub struct SpokenAnswer {
    pub text: String,
    pub reprompt: Option<String>,
    pub session: SessionContext,
    pub should_end_session: bool,
}

fn open(text: impl Into<String>, session: SessionContext) -> SpokenAnswer {
    SpokenAnswer {
        text: text.into(),
        reprompt: None,
        session,
        should_end_session: false,
    }
}

fn reprompting(text: impl Into<String>, session: SessionContext) -> SpokenAnswer {
    let text = text.into();
    SpokenAnswer {
        reprompt: Some(text.clone()),
        text,
        session,
        should_end_session: false,
    }
}

fn closing(text: impl Into<String>, session: SessionContext) -> SpokenAnswer {
    SpokenAnswer {
        text: text.into(),
        reprompt: None,
        session,
        should_end_session: true,
    }
}

/// Answer one query against an immutable store snapshot.
///
/// Every failure mode is recovered into spoken text here; nothing propagates
/// past this boundary.
pub fn handle_query(store: &ScheduleStore, clock: &QueryClock, query: Query) -> SpokenAnswer {
    let Query {
        intent,
        slots,
        locale,
        session,
    } = query;

    match intent {
        Intent::Launch => reprompting(LAUNCH_PROMPT, session),
        Intent::Help => reprompting(HELP_PROMPT, session),
        Intent::Stop => closing(GOODBYE, session),
        Intent::Today => todays_worlds(store, clock, session),
        Intent::Tomorrow => tomorrows_worlds(store, clock, session),
        Intent::WhenWorld => when_world(store, clock, slots.world.as_deref(), session),
        Intent::WorldOnDate => world_on_date(store, clock, slots.date.as_deref(), session),
        Intent::NextWorld => next_world_change(store, clock, session),
        Intent::WeeklyChallenge => weekly_challenge(store, clock, &slots, &locale, session),
        Intent::AfterThat => after_that(store, clock, &locale, session),
    }
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn todays_worlds(
    store: &ScheduleStore,
    clock: &QueryClock,
    mut session: SessionContext,
) -> SpokenAnswer {
    let Some(worlds) = store.worlds.as_loaded() else {
        return closing(WORLDS_UNAVAILABLE, session);
    };
    let day = clock.day();
    let Some(value) = worlds.world_on(day) else {
        return open(GENERIC_APOLOGY, session);
    };
    let text = format!("Todays Guest Worlds are {value}");
    session.note_world_answer(day);
    open(text, session)
}

fn tomorrows_worlds(
    store: &ScheduleStore,
    clock: &QueryClock,
    mut session: SessionContext,
) -> SpokenAnswer {
    let Some(worlds) = store.worlds.as_loaded() else {
        return closing(WORLDS_UNAVAILABLE, session);
    };
    let day = clock.day();

    if day < clock.last_day() {
        let Some(value) = worlds.world_on(day + 1) else {
            return open(GENERIC_APOLOGY, session);
        };
        let text = format!("Tomorrow's Guest Worlds are {value}");
        session.note_world_answer(day + 1);
        open(text, session)
    } else {
        let Some(value) = worlds.world_on(day) else {
            return open(GENERIC_APOLOGY, session);
        };
        open(
            format!(
                "I don't know next month's schedule yet. {value} are available today. \
                 Ask me again tomorrow."
            ),
            session,
        )
    }
}

fn when_world(
    store: &ScheduleStore,
    clock: &QueryClock,
    world_slot: Option<&str>,
    mut session: SessionContext,
) -> SpokenAnswer {
    let Some(worlds) = store.worlds.as_loaded() else {
        return closing(WORLDS_UNAVAILABLE, session);
    };
    let Some(world_name) = world_slot.map(str::trim).filter(|name| !name.is_empty()) else {
        return reprompting(
            "I didn't catch which world you asked about. Could you try again?",
            session,
        );
    };

    // Watopia is the permanent world; no calendar scan needed.
    if world_name == "Watopia" {
        return open("Watopia is available today and every day.", session);
    }

    let day = clock.day();
    let last_day = clock.last_day();
    // Compare casefolded and space-stripped: the source data spells some
    // worlds as a single all-caps token. Substring matching can false-positive
    // when one world's name embeds another's; that matches the original skill.
    let needle = normalize_world(world_name);
    let mut lookup = day;
    while lookup <= last_day {
        if let Some(value) = worlds.world_on(lookup) {
            if normalize_world(value).contains(&needle) {
                break;
            }
        }
        lookup += 1;
    }

    let text = if lookup == day {
        format!("{world_name} is available now.")
    } else if lookup > last_day {
        format!("{world_name} won't be available until sometime next month.")
    } else if lookup - day == 1 {
        format!("{world_name} will be available tomorrow.")
    } else {
        let date = clock
            .today()
            .with_day(lookup)
            .expect("scan stays within the month");
        format!(
            "{} will be available {} days from now on {}.",
            world_name,
            lookup - day,
            ordinal_date(date)
        )
    };

    if lookup <= last_day {
        session.note_world_answer(lookup);
    }
    open(text, session)
}

fn world_on_date(
    store: &ScheduleStore,
    clock: &QueryClock,
    date_slot: Option<&str>,
    mut session: SessionContext,
) -> SpokenAnswer {
    let Some(worlds) = store.worlds.as_loaded() else {
        return closing(WORLDS_UNAVAILABLE, session);
    };

    let raw = date_slot.map(str::trim).filter(|value| !value.is_empty());
    let resolved = resolve_date_slot(raw, clock.today());

    if resolved.is_empty() {
        // A non-empty slot that resolved to nothing means another month or an
        // encoding we don't understand; an empty slot means we never heard one.
        return if raw.is_some() {
            open(
                "I don't have the schedule for that date. I only have this month's calendar.",
                session,
            )
        } else {
            reprompting(
                "I didn't catch which date you asked about. Could you try again?",
                session,
            )
        };
    }

    let day = clock.day();
    let (past, future): (Vec<ResolvedDate>, Vec<ResolvedDate>) =
        resolved.into_iter().partition(|entry| entry.day < day);

    if future.is_empty() {
        let Some(today_value) = worlds.world_on(day) else {
            return open(GENERIC_APOLOGY, session);
        };
        let text = format!(
            "The {} has already passed and I don't have next month's calendar yet. \
             {} are available today.",
            ordinal_day(past[0].day),
            today_value
        );
        return open(text, session);
    }

    if future.len() == 1 {
        let target = future[0];
        let Some(value) = worlds.world_on(target.day) else {
            return open(GENERIC_APOLOGY, session);
        };
        let text = format!(
            "On {}, the guest worlds will be {}.",
            ordinal_date(target.date),
            value
        );
        session.note_world_answer(target.day);
        return open(text, session);
    }

    weekend_answer(worlds, clock, future[0], future[1], session)
}

fn weekend_answer(
    worlds: &WorldList,
    clock: &QueryClock,
    saturday: ResolvedDate,
    sunday: ResolvedDate,
    mut session: SessionContext,
) -> SpokenAnswer {
    let (Some(saturday_value), Some(sunday_value)) =
        (worlds.world_on(saturday.day), worlds.world_on(sunday.day))
    else {
        return open(GENERIC_APOLOGY, session);
    };

    // When asked about a weekend *on* a weekend, "this Saturday" would be
    // ambiguous unless the requested days are the current weekend.
    let day = clock.day();
    let last_day = clock.last_day();
    let today_weekday = clock.today().weekday();
    let this_weekend: Vec<u32> = match today_weekday {
        Weekday::Sat => {
            if day + 1 <= last_day {
                vec![day, day + 1]
            } else {
                vec![day]
            }
        }
        Weekday::Sun => {
            if day > 1 {
                vec![day - 1, day]
            } else {
                vec![day]
            }
        }
        _ => Vec::new(),
    };
    let requested = vec![saturday.day, sunday.day];
    let needs_disambiguation = !this_weekend.is_empty() && requested != this_weekend;

    let text = if saturday_value == sunday_value {
        if needs_disambiguation {
            format!(
                "On Saturday and Sunday, {} and {}, the guest worlds will be {}.",
                ordinal_date(saturday.date),
                ordinal_day(sunday.day),
                saturday_value
            )
        } else {
            format!(
                "This Saturday and Sunday, the guest worlds will be {}.",
                saturday_value
            )
        }
    } else if needs_disambiguation {
        format!(
            "On Saturday {}, the guest worlds will be {}. On Sunday {}, they will be {}.",
            ordinal_date(saturday.date),
            saturday_value,
            ordinal_date(sunday.date),
            sunday_value
        )
    } else {
        format!(
            "On Saturday, the guest worlds will be {}. On Sunday, they will be {}.",
            saturday_value, sunday_value
        )
    };

    session.note_world_answer(sunday.day);
    open(text, session)
}

fn next_world_change(
    store: &ScheduleStore,
    clock: &QueryClock,
    session: SessionContext,
) -> SpokenAnswer {
    let Some(worlds) = store.worlds.as_loaded() else {
        return closing(WORLDS_UNAVAILABLE, session);
    };
    let day = clock.day();
    let last_day = clock.last_day();
    let Some(today_value) = worlds.world_on(day) else {
        return open(GENERIC_APOLOGY, session);
    };

    let mut next = day + 1;
    while next <= last_day && worlds.world_on(next) == Some(today_value) {
        next += 1;
    }

    if next > last_day {
        return open(
            format!(
                "I don't know next month's schedule yet. {today_value} are available today."
            ),
            session,
        );
    }
    let Some(next_value) = worlds.world_on(next) else {
        return open(GENERIC_APOLOGY, session);
    };

    let availability = match next - day {
        1 => {
            // The schedule flips at midnight, so "tomorrow" becomes a real
            // countdown from the caller's reference time.
            let (hours, minutes) = clock.until_midnight();
            format!("in {hours} hours and {minutes} minutes.")
        }
        2 => "in two days.".to_string(),
        gap => format!("{gap} days from now."),
    };

    open(
        format!("The next worlds will be {next_value}. They will be available {availability}"),
        session,
    )
}

/// Which categories a challenge question covers.
fn resolve_categories(slot: Option<&str>) -> Vec<ChallengeCategory> {
    match slot.map(str::trim) {
        Some("route of the week") | Some("route") => vec![ChallengeCategory::Route],
        Some("climb of the week") | Some("climb") => vec![ChallengeCategory::Climb],
        _ => ChallengeCategory::BOTH.to_vec(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChallengeDetailKind {
    Xp,
    Distance,
    Elevation,
}

fn resolve_detail(slot: Option<&str>) -> Option<ChallengeDetailKind> {
    match slot.map(str::trim) {
        Some("XP") | Some("xp") => Some(ChallengeDetailKind::Xp),
        Some("distance") => Some(ChallengeDetailKind::Distance),
        Some("elevation") => Some(ChallengeDetailKind::Elevation),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChallengeTimeframe {
    ThisWeek,
    NextWeek,
    ThisMonth,
    NextMonth,
}

fn resolve_timeframe(slot: Option<&str>) -> ChallengeTimeframe {
    match slot.map(str::trim) {
        Some("next week") => ChallengeTimeframe::NextWeek,
        Some("this month") => ChallengeTimeframe::ThisMonth,
        Some("next month") => ChallengeTimeframe::NextMonth,
        _ => ChallengeTimeframe::ThisWeek,
    }
}

fn weekly_challenge(
    store: &ScheduleStore,
    clock: &QueryClock,
    slots: &Slots,
    locale: &str,
    mut session: SessionContext,
) -> SpokenAnswer {
    let Some(data) = store.challenges.as_loaded() else {
        return closing(CHALLENGES_UNAVAILABLE, session);
    };

    let categories = resolve_categories(slots.challenge_type.as_deref());
    let detail = resolve_detail(slots.challenge_detail.as_deref());
    let imperial = use_imperial(locale);

    match resolve_timeframe(slots.challenge_timeframe.as_deref()) {
        ChallengeTimeframe::ThisMonth => {
            this_month_remaining(data, clock, &categories, session)
        }
        ChallengeTimeframe::NextMonth => next_month_listing(data, clock, &categories, session),
        timeframe => {
            let (target, label, missing_month, missing_entry) =
                if timeframe == ChallengeTimeframe::NextWeek {
                    (
                        clock.today() + Days::new(7),
                        "Next week",
                        "I don't have next week's challenge schedule yet.",
                        "I don't have challenge data for next week.",
                    )
                } else {
                    (
                        clock.today(),
                        "This week",
                        "I don't have challenge data for this month.",
                        "I don't have challenge data for this week.",
                    )
                };

            let Some(month) = data.month(&month_key(target)) else {
                return open(missing_month, session);
            };
            let Some((_, entry)) = month.active_on(target.day()) else {
                return open(missing_entry, session);
            };

            session.note_challenge_answer(target, categories.clone());
            let text = format_challenge_answer(entry, &categories, detail, label, imperial);
            open(finalize_ssml(text), session)
        }
    }
}

fn format_challenge_answer(
    entry: &ChallengeDay,
    categories: &[ChallengeCategory],
    detail: Option<ChallengeDetailKind>,
    timeframe_label: &str,
    imperial: bool,
) -> String {
    let mut parts = Vec::new();

    for &category in categories {
        let Some(challenge) = entry.get(category) else {
            continue;
        };
        let label = category_label(category, false);
        let name = spoken_name(challenge);

        match detail {
            Some(ChallengeDetailKind::Xp) => {
                parts.push(format!(
                    "The {} is worth {} experience points.",
                    label, challenge.xp
                ));
            }
            Some(ChallengeDetailKind::Distance) => match format_distance(challenge, imperial) {
                Some(distance) => {
                    parts.push(format!("The {label}, {name}, is {distance} long."));
                }
                None => parts.push(format!("I don't have the distance for {name}.")),
            },
            Some(ChallengeDetailKind::Elevation) => match format_elevation(challenge, imperial) {
                Some(elevation) => {
                    parts.push(format!(
                        "The {label}, {name}, has {elevation} of elevation gain."
                    ));
                }
                None => parts.push(format!("I don't have the elevation for {name}.")),
            },
            None => {
                let short = category_label(category, true);
                let mut overview = format!(
                    "{}'s {} is {}, worth {} XP.",
                    timeframe_label, short, name, challenge.xp
                );
                overview.push_str(&overview_tail(challenge, imperial));
                parts.push(overview);
            }
        }
    }

    if parts.is_empty() {
        "I don't have challenge data for that.".to_string()
    } else {
        parts.join(" ")
    }
}

/// List the spans still running or yet to start this month.
fn this_month_remaining(
    data: &ChallengeData,
    clock: &QueryClock,
    categories: &[ChallengeCategory],
    session: SessionContext,
) -> SpokenAnswer {
    let day = clock.day();
    let Some(month) = data.month(&month_key(clock.today())) else {
        return open("I don't have challenge data for this month.", session);
    };

    let remaining: Vec<_> = month
        .spans(clock.last_day())
        .into_iter()
        .filter(|(span, _)| span.end >= day)
        .collect();
    if remaining.is_empty() {
        return open("There are no more challenge routes this month.", session);
    }

    for &category in categories {
        let mut names = Vec::new();
        for (span, entry) in &remaining {
            let Some(challenge) = entry.get(category) else {
                continue;
            };
            let name = spoken_name(challenge);
            // Load validation bounds spans to the month, but a span that
            // still fails to land on a date is dropped, never spoken.
            let phrase = if span.start <= day {
                match clock.today().with_day(span.end) {
                    Some(end_date) => format!("{} through {}", name, ordinal_date(end_date)),
                    None => continue,
                }
            } else {
                match clock.today().with_day(span.start) {
                    Some(start_date) => {
                        format!("{} starting {}", name, ordinal_date(start_date))
                    }
                    None => continue,
                }
            };
            names.push(phrase);
        }

        if !names.is_empty() {
            let label = category_label(category, true);
            let text = format!(
                "The remaining {}s this month are: {}.",
                label,
                names.join(", then ")
            );
            return open(finalize_ssml(text), session);
        }
    }

    open("I don't have challenge data for this month.", session)
}

fn next_month_listing(
    data: &ChallengeData,
    clock: &QueryClock,
    categories: &[ChallengeCategory],
    session: SessionContext,
) -> SpokenAnswer {
    let next_month = crate::dates::first_of_next_month(clock.today());
    let Some(month) = data.month(&month_key(next_month)) else {
        return open("I don't have next month's challenge schedule yet.", session);
    };

    for &category in categories {
        let mut names = Vec::new();
        for (span, entry) in month.spans(last_day_of_month(next_month)) {
            let Some(challenge) = entry.get(category) else {
                continue;
            };
            names.push(format!(
                "{} starting the {}",
                spoken_name(challenge),
                ordinal_day(span.start)
            ));
        }

        if !names.is_empty() {
            let label = category_label(category, true);
            let text = format!("Next month's {}s are: {}.", label, names.join(", then "));
            return open(finalize_ssml(text), session);
        }
    }

    open("I don't have next month's challenge schedule yet.", session)
}

/// "After that" routes purely on the stored context, never on a new slot.
fn after_that(
    store: &ScheduleStore,
    clock: &QueryClock,
    locale: &str,
    session: SessionContext,
) -> SpokenAnswer {
    match session.last_context {
        Some(LastContext::Challenge) => challenge_followup(store, locale, session),
        _ => world_followup(store, clock, session),
    }
}

fn world_followup(
    store: &ScheduleStore,
    clock: &QueryClock,
    mut session: SessionContext,
) -> SpokenAnswer {
    let Some(worlds) = store.worlds.as_loaded() else {
        return closing(WORLDS_UNAVAILABLE, session);
    };
    let Some(last_answered) = session.last_answered_day else {
        return reprompting(
            "After what? Try asking what worlds are available today first.",
            session,
        );
    };

    let last_day = clock.last_day();
    let Some(anchor) = worlds.world_on(last_answered) else {
        return open(GENERIC_APOLOGY, session);
    };

    // Collapse a run of identical days to the first day with a different value.
    let mut next = last_answered + 1;
    while next <= last_day && worlds.world_on(next) == Some(anchor) {
        next += 1;
    }

    if next > last_day {
        return open("I don't have next month's schedule yet.", session);
    }
    let Some(value) = worlds.world_on(next) else {
        return open(GENERIC_APOLOGY, session);
    };

    let date = clock
        .today()
        .with_day(next)
        .expect("scan stays within the month");
    let text = format!(
        "On {}, the guest worlds will be {}.",
        ordinal_date(date),
        value
    );
    session.last_answered_day = Some(next);
    open(text, session)
}

fn challenge_followup(
    store: &ScheduleStore,
    locale: &str,
    mut session: SessionContext,
) -> SpokenAnswer {
    let Some(data) = store.challenges.as_loaded() else {
        return closing(CHALLENGES_UNAVAILABLE, session);
    };
    let Some(last_date) = session.last_challenge_date else {
        return reprompting(
            "After what? Try asking about the route or climb of the week first.",
            session,
        );
    };

    let next_date = last_date + Days::new(7);
    let Some(entry) = data
        .month(&month_key(next_date))
        .and_then(|month| month.active_on(next_date.day()))
        .map(|(_, entry)| entry)
    else {
        return open("I don't have challenge data that far out.", session);
    };

    let categories = session
        .last_challenge_categories
        .clone()
        .unwrap_or_else(|| ChallengeCategory::BOTH.to_vec());
    let imperial = use_imperial(locale);

    let mut parts = Vec::new();
    for &category in &categories {
        let Some(challenge) = entry.get(category) else {
            continue;
        };
        let mut overview = format!(
            "The following week's {} is {}, worth {} XP.",
            category_label(category, true),
            spoken_name(challenge),
            challenge.xp
        );
        overview.push_str(&overview_tail(challenge, imperial));
        parts.push(overview);
    }

    if parts.is_empty() {
        return open("I don't have challenge data for that week.", session);
    }

    session.last_challenge_date = Some(next_date);
    open(finalize_ssml(parts.join(" ")), session)
}

fn normalize_world(name: &str) -> String {
    name.to_lowercase().replace(' ', "")
}
