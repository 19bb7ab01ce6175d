use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::calendar::{Category, ChallengeDayRaw, WorldDay};
use crate::detail::RouteDetail;

/// SSML phonetic overrides for names the default voice synthesis mispronounces.
/// Keys must match the scraped name exactly.
const PHONETIC_OVERRIDES: &[(&str, &str)] = &[
    (
        "Cote de la Redoute",
        r#"<phoneme alphabet="ipa" ph="koʊt də la ʁəˈdut">Cote de la Redoute</phoneme>"#,
    ),
    (
        "Côte de la Redoute",
        r#"<phoneme alphabet="ipa" ph="koʊt də la ʁəˈdut">Côte de la Redoute</phoneme>"#,
    ),
    (
        "Côte de Pike",
        r#"<phoneme alphabet="ipa" ph="koʊt də paɪk">Côte de Pike</phoneme>"#,
    ),
    (
        "Bealach na Bà",
        r#"<phoneme alphabet="ipa" ph="ˈbjaləx nə ˈbɑː">Bealach na Bà</phoneme>"#,
    ),
    (
        "La Laguna Negra",
        r#"<phoneme alphabet="ipa" ph="la laˈɡuna ˈneɡɾa">La Laguna Negra</phoneme>"#,
    ),
    (
        "Côte de Domancy",
        r#"<phoneme alphabet="ipa" ph="koʊt də doˈmɑ̃si">Côte de Domancy</phoneme>"#,
    ),
    (
        "Puy de Dôme",
        r#"<phoneme alphabet="ipa" ph="pɥi də doʊm">Puy de Dôme</phoneme>"#,
    ),
    (
        "L'Alpe du Zwift",
        r#"<phoneme alphabet="ipa" ph="lalp dy zwɪft">L'Alpe du Zwift</phoneme>"#,
    ),
    (
        "Lagunas de Fuente de Piedra",
        r#"<phoneme alphabet="ipa" ph="laˈɡunas de ˈfwente de ˈpjedɾa">Lagunas de Fuente de Piedra</phoneme>"#,
    ),
];

fn phonetic_override(name: &str) -> Option<&'static str> {
    PHONETIC_OVERRIDES
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, ssml)| *ssml)
}

/// Serialized form of one challenge entry in WeeklyChallenges.json.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArtifactEntry {
    pub name: String,
    pub xp: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_ssml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_mi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_ft: Option<f64>,
}

/// One start-day's worth of challenge data in the artifact.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ArtifactDay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<ArtifactEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub climb: Option<ArtifactEntry>,
}

/// Full WeeklyChallenges.json structure: month key -> start day -> entries.
pub type ChallengeArtifact = BTreeMap<String, BTreeMap<String, ArtifactDay>>;

/// Format parsed world days as the GuestWorlds.csv artifact.
///
/// The day column is a 1-based line counter, not the source day number; the
/// consumer re-derives position from line order.
pub fn format_csv(days: &[WorldDay]) -> String {
    if days.is_empty() {
        return String::new();
    }
    let mut lines = String::new();
    for (index, entry) in days.iter().enumerate() {
        lines.push_str(&entry.worlds.join(" and "));
        lines.push(',');
        lines.push_str(&(index + 1).to_string());
        lines.push('\n');
    }
    lines
}

/// Merge parsed challenge days with detail-page data into the persisted
/// monthly structure. Months with no usable days and days with no entries
/// are omitted entirely.
pub fn build_challenge_json(
    days_by_month: &BTreeMap<String, Vec<ChallengeDayRaw>>,
    route_details: &HashMap<String, Option<RouteDetail>>,
) -> ChallengeArtifact {
    let mut artifact = ChallengeArtifact::new();

    for (month_key, days) in days_by_month {
        let mut month = BTreeMap::new();
        for day in days {
            let mut entry = ArtifactDay::default();
            for category in [Category::Route, Category::Climb] {
                let Some(event) = day.get(category) else {
                    continue;
                };
                let mut built = ArtifactEntry {
                    name: event.name.clone(),
                    xp: event.xp,
                    name_ssml: phonetic_override(&event.name).map(str::to_string),
                    distance_km: None,
                    distance_mi: None,
                    elevation_m: None,
                    elevation_ft: None,
                };
                if let Some(detail) = event
                    .detail_url
                    .as_ref()
                    .and_then(|url| route_details.get(url))
                    .and_then(|parsed| parsed.as_ref())
                {
                    built.distance_km = detail.distance_km;
                    built.distance_mi = detail.distance_mi;
                    built.elevation_m = detail.elevation_m;
                    built.elevation_ft = detail.elevation_ft;
                }
                match category {
                    Category::Route => entry.route = Some(built),
                    Category::Climb => entry.climb = Some(built),
                }
            }
            if entry.route.is_some() || entry.climb.is_some() {
                month.insert(day.day.to_string(), entry);
            }
        }
        if !month.is_empty() {
            artifact.insert(month_key.clone(), month);
        }
    }

    artifact
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ChallengeEvent;

    fn raw_day(day: u32, route: Option<ChallengeEvent>, climb: Option<ChallengeEvent>) -> ChallengeDayRaw {
        ChallengeDayRaw { day, route, climb }
    }

    fn event(name: &str, xp: u32, url: Option<&str>) -> ChallengeEvent {
        ChallengeEvent {
            name: name.to_string(),
            xp,
            detail_url: url.map(str::to_string),
        }
    }

    #[test]
    fn csv_uses_line_order_not_source_days() {
        let days = vec![
            WorldDay {
                day: 3,
                worlds: vec!["Yorkshire".to_string(), "Innsbruck".to_string()],
            },
            WorldDay {
                day: 4,
                worlds: vec!["Paris".to_string()],
            },
        ];
        assert_eq!(format_csv(&days), "Yorkshire and Innsbruck,1\nParis,2\n");
        assert_eq!(format_csv(&[]), "");
    }

    #[test]
    fn builder_preserves_name_xp_and_applies_ssml_overrides() {
        let mut by_month = BTreeMap::new();
        by_month.insert(
            "2026-08".to_string(),
            vec![raw_day(
                1,
                Some(event("Three Sisters", 600, None)),
                Some(event("Puy de Dôme", 400, None)),
            )],
        );

        let artifact = build_challenge_json(&by_month, &HashMap::new());
        let day = &artifact["2026-08"]["1"];
        let route = day.route.as_ref().unwrap();
        assert_eq!((route.name.as_str(), route.xp), ("Three Sisters", 600));
        assert!(route.name_ssml.is_none());

        let climb = day.climb.as_ref().unwrap();
        assert_eq!((climb.name.as_str(), climb.xp), ("Puy de Dôme", 400));
        assert!(climb.name_ssml.as_deref().unwrap().contains("<phoneme"));
    }

    #[test]
    fn builder_merges_details_and_tolerates_missing_ones() {
        let mut by_month = BTreeMap::new();
        by_month.insert(
            "2026-08".to_string(),
            vec![raw_day(
                8,
                Some(event("Three Sisters", 600, Some("/route/three-sisters"))),
                Some(event("Old Willunga Hill", 250, Some("/portal/willunga"))),
            )],
        );

        let mut details = HashMap::new();
        details.insert(
            "/route/three-sisters".to_string(),
            Some(RouteDetail {
                distance_km: Some(47.5),
                distance_mi: Some(29.5),
                elevation_m: Some(900.0),
                elevation_ft: Some(2953.0),
            }),
        );
        // Detail fetch failed for the climb; fields simply stay absent.
        details.insert("/portal/willunga".to_string(), None);

        let artifact = build_challenge_json(&by_month, &details);
        let day = &artifact["2026-08"]["8"];
        assert_eq!(day.route.as_ref().unwrap().distance_km, Some(47.5));
        assert_eq!(day.climb.as_ref().unwrap().distance_km, None);
    }

    #[test]
    fn builder_omits_empty_days_and_months() {
        let mut by_month = BTreeMap::new();
        by_month.insert("2026-08".to_string(), vec![raw_day(1, None, None)]);
        by_month.insert("2026-09".to_string(), Vec::new());

        let artifact = build_challenge_json(&by_month, &HashMap::new());
        assert!(artifact.is_empty());
    }
}
