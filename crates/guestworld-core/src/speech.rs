use crate::store::{ChallengeCategory, ChallengeEntry};

pub const WORLDS_UNAVAILABLE: &str =
    "Sorry, the Guest World calendar is temporarily unavailable. Please try again later.";
pub const CHALLENGES_UNAVAILABLE: &str =
    "Sorry, the weekly challenge data is temporarily unavailable. Please try again later.";
pub const GENERIC_APOLOGY: &str = "Sorry, I had trouble doing what you asked. Please try again.";
pub const LAUNCH_PROMPT: &str = "Welcome, you can say. What are todays guest worlds? \
     Where can I ride tomorrow? What's available this weekend? What's Next? \
     Or, when can I run in London?";
pub const HELP_PROMPT: &str = "You can say, what are today's guest worlds? \
     Where can I ride tomorrow? What's available this weekend? What's Next? \
     Or, when can I run in London?";
pub const GOODBYE: &str = "Goodbye!";

/// Imperial units for US English, metric for everyone else.
pub fn use_imperial(locale: &str) -> bool {
    locale.starts_with("en-US")
}

/// The entry's name with its phonetic override applied when one exists.
pub fn spoken_name(entry: &ChallengeEntry) -> &str {
    entry.name_ssml.as_deref().unwrap_or(&entry.name)
}

/// Spoken distance, or `None` when the entry has no figure for the unit system.
pub fn format_distance(entry: &ChallengeEntry, imperial: bool) -> Option<String> {
    if imperial {
        entry.distance_mi.map(|miles| format!("{:.1} miles", miles))
    } else {
        entry
            .distance_km
            .map(|km| format!("{:.1} kilometers", km))
    }
}

/// Spoken elevation with thousands separators, or `None` when absent.
pub fn format_elevation(entry: &ChallengeEntry, imperial: bool) -> Option<String> {
    if imperial {
        entry
            .elevation_ft
            .map(|feet| format!("{} feet", group_thousands(feet.round() as i64)))
    } else {
        entry
            .elevation_m
            .map(|meters| format!("{} meters", group_thousands(meters.round() as i64)))
    }
}

/// "route of the week" / "climb of the week", or the short form for phrases
/// like "This week's route" where the long label would repeat "week".
pub fn category_label(category: ChallengeCategory, short: bool) -> &'static str {
    match (category, short) {
        (ChallengeCategory::Route, true) => "route",
        (ChallengeCategory::Climb, true) => "climb",
        (ChallengeCategory::Route, false) => "route of the week",
        (ChallengeCategory::Climb, false) => "climb of the week",
    }
}

/// The "It's ... long with ... of elevation gain." tail shared by every
/// challenge overview sentence. Empty when neither figure is known.
pub fn overview_tail(entry: &ChallengeEntry, imperial: bool) -> String {
    let distance = format_distance(entry, imperial);
    let elevation = format_elevation(entry, imperial);
    match (distance, elevation) {
        (Some(dist), Some(elev)) => {
            format!(" It's {} long with {} of elevation gain.", dist, elev)
        }
        (Some(dist), None) => format!(" It's {} long.", dist),
        (None, Some(elev)) => format!(" It has {} of elevation gain.", elev),
        (None, None) => String::new(),
    }
}

/// Wrap in `<speak>` when the text carries SSML phoneme tags.
pub fn finalize_ssml(text: String) -> String {
    if text.contains("<phoneme") {
        format!("<speak>{}</speak>", text)
    } else {
        text
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ChallengeEntry {
        ChallengeEntry {
            name: "Three Sisters".to_string(),
            xp: 600,
            name_ssml: None,
            distance_km: Some(47.5),
            distance_mi: Some(29.5),
            elevation_m: Some(900.0),
            elevation_ft: Some(2953.0),
        }
    }

    #[test]
    fn locale_selects_unit_system() {
        assert!(use_imperial("en-US"));
        assert!(!use_imperial("en-GB"));
        assert!(!use_imperial("de-DE"));

        let entry = entry();
        assert_eq!(
            format_distance(&entry, true).as_deref(),
            Some("29.5 miles")
        );
        assert_eq!(
            format_distance(&entry, false).as_deref(),
            Some("47.5 kilometers")
        );
        assert_eq!(
            format_elevation(&entry, true).as_deref(),
            Some("2,953 feet")
        );
        assert_eq!(
            format_elevation(&entry, false).as_deref(),
            Some("900 meters")
        );
    }

    #[test]
    fn missing_figures_format_to_none() {
        let mut entry = entry();
        entry.distance_mi = None;
        entry.elevation_ft = None;
        assert_eq!(format_distance(&entry, true), None);
        assert_eq!(format_elevation(&entry, true), None);
        assert_eq!(overview_tail(&entry, true), "");
    }

    #[test]
    fn ssml_wrapping_only_when_phonemes_present() {
        let plain = finalize_ssml("The route is Three Sisters.".to_string());
        assert_eq!(plain, "The route is Three Sisters.");

        let ssml = finalize_ssml(r#"The climb is <phoneme alphabet="ipa" ph="pɥi">Puy</phoneme>."#.to_string());
        assert!(ssml.starts_with("<speak>"));
        assert!(ssml.ends_with("</speak>"));
    }

    #[test]
    fn spoken_name_prefers_override() {
        let mut entry = entry();
        assert_eq!(spoken_name(&entry), "Three Sisters");
        entry.name_ssml = Some("<phoneme>Three Sisters</phoneme>".to_string());
        assert_eq!(spoken_name(&entry), "<phoneme>Three Sisters</phoneme>");
    }
}
