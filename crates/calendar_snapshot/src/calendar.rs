use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// One parsed day of the guest world calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldDay {
    pub day: u32,
    pub worlds: Vec<String>,
}

/// Challenge category, derived from the event's CSS category or URL path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Route,
    Climb,
}

/// One event extracted from the challenge calendar, before detail merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeEvent {
    pub name: String,
    pub xp: u32,
    pub detail_url: Option<String>,
}

/// One parsed day of the challenge calendar (either category may be absent).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengeDayRaw {
    pub day: u32,
    pub route: Option<ChallengeEvent>,
    pub climb: Option<ChallengeEvent>,
}

impl ChallengeDayRaw {
    pub fn is_empty(&self) -> bool {
        self.route.is_none() && self.climb.is_none()
    }

    pub fn get(&self, category: Category) -> Option<&ChallengeEvent> {
        match category {
            Category::Route => self.route.as_ref(),
            Category::Climb => self.climb.as_ref(),
        }
    }
}

fn selector(css: &str) -> Selector {
    // All selectors used here are literals; a parse failure is a programmer error.
    Selector::parse(css).unwrap_or_else(|err| panic!("invalid selector {css:?}: {err}"))
}

fn xp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.+?)\s*\((\d+)\s*XP\)$").expect("xp pattern"))
}

/// Parse the guest world schedule page into `(day, worlds)` entries.
///
/// Returns an empty vec when no calendar table is present; an empty fetch is
/// not an error at this layer.
pub fn parse_world_calendar(html: &str) -> Vec<WorldDay> {
    let document = Html::parse_document(html);
    let table_sel = selector(r#"table[class*="calendar-table"]"#);
    let cell_sel = selector(r#"td[class*="day-with-date"]"#);
    let day_sel = selector(r#"span[class*="day-number"]"#);
    let title_sel = selector("span.spiffy-title");

    let Some(table) = document.select(&table_sel).next() else {
        return Vec::new();
    };

    let mut days = Vec::new();
    for cell in table.select(&cell_sel) {
        let Some(day) = extract_day_number(cell, &day_sel) else {
            continue;
        };
        let worlds: Vec<String> = cell
            .select(&title_sel)
            .map(|span| span.text().collect::<String>().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        if !worlds.is_empty() {
            days.push(WorldDay { day, worlds });
        }
    }

    days.sort_by_key(|entry| entry.day);
    days
}

/// Parse the weekly challenge calendar page into per-day route/climb events.
///
/// Events whose title does not match `"<name> (<n>XP)"` and events that
/// cannot be classified are skipped; bad rows are a data-quality problem,
/// not a parse failure.
pub fn parse_challenge_calendar(html: &str) -> Vec<ChallengeDayRaw> {
    let document = Html::parse_document(html);
    let table_sel = selector(r#"table[class*="calendar-table"]"#);
    let cell_sel = selector(r#"td[class*="day-with-date"]"#);
    let day_sel = selector(r#"span[class*="day-number"]"#);
    let event_sel = selector("span.calnk");
    let title_sel = selector("span.spiffy-title");
    let link_sel = selector("a[href]");

    let Some(table) = document.select(&table_sel).next() else {
        return Vec::new();
    };

    let mut days = Vec::new();
    for cell in table.select(&cell_sel) {
        let Some(day) = extract_day_number(cell, &day_sel) else {
            continue;
        };

        let mut parsed = ChallengeDayRaw {
            day,
            ..ChallengeDayRaw::default()
        };
        for event in cell.select(&event_sel) {
            let Some(title) = event.select(&title_sel).next() else {
                continue;
            };
            let title_text = title.text().collect::<String>().trim().to_string();
            let Some(captures) = xp_pattern().captures(&title_text) else {
                continue;
            };
            let name = captures[1].trim().to_string();
            let Ok(xp) = captures[2].parse::<u32>() else {
                continue;
            };

            let detail_url = event
                .select(&link_sel)
                .next()
                .and_then(|link| link.value().attr("href"))
                .map(|href| href.to_string());

            let Some(category) = classify_event(event, detail_url.as_deref()) else {
                continue;
            };

            let entry = ChallengeEvent {
                name,
                xp,
                detail_url,
            };
            match category {
                Category::Route => parsed.route = Some(entry),
                Category::Climb => parsed.climb = Some(entry),
            }
        }

        if !parsed.is_empty() {
            days.push(parsed);
        }
    }

    days.sort_by_key(|entry| entry.day);
    days
}

fn extract_day_number(cell: ElementRef<'_>, day_sel: &Selector) -> Option<u32> {
    let span = cell.select(day_sel).next()?;
    span.text().collect::<String>().trim().parse::<u32>().ok()
}

/// Decide whether an event is a route or a climb.
///
/// Checks ancestor classes first, then the event element and its descendants,
/// then falls back to the detail URL path.
fn classify_event(event: ElementRef<'_>, detail_url: Option<&str>) -> Option<Category> {
    for ancestor in event.ancestors() {
        if let Some(element) = ElementRef::wrap(ancestor) {
            if let Some(category) = category_from_classes(element) {
                return Some(category);
            }
        }
    }

    if let Some(category) = category_from_classes(event) {
        return Some(category);
    }
    for node in event.descendants() {
        if let Some(element) = ElementRef::wrap(node) {
            if let Some(category) = category_from_classes(element) {
                return Some(category);
            }
        }
    }

    if let Some(url) = detail_url {
        if url.contains("/route/") {
            return Some(Category::Route);
        }
        if url.contains("/portal/") {
            return Some(Category::Climb);
        }
    }

    None
}

fn category_from_classes(element: ElementRef<'_>) -> Option<Category> {
    for class in element.value().classes() {
        if class.contains("category_367") {
            return Some(Category::Route);
        }
        if class.contains("category_370") {
            return Some(Category::Climb);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD_CALENDAR: &str = r#"
        <html><body>
        <table class="calendar-table wide">
          <tr>
            <td class="day-without-date"></td>
            <td class="day-with-date">
              <span class="day-number">2</span>
              <span class="spiffy-title">Makuri Islands</span>
            </td>
            <td class="day-with-date weekend">
              <span class="day-number weekend">1</span>
              <span class="spiffy-title">Yorkshire</span>
              <span class="spiffy-title">Innsbruck</span>
            </td>
          </tr>
        </table>
        </body></html>"#;

    #[test]
    fn world_calendar_sorts_days_and_collects_titles() {
        let days = parse_world_calendar(WORLD_CALENDAR);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day, 1);
        assert_eq!(days[0].worlds, vec!["Yorkshire", "Innsbruck"]);
        assert_eq!(days[1].day, 2);
        assert_eq!(days[1].worlds, vec!["Makuri Islands"]);
    }

    #[test]
    fn world_calendar_without_marker_table_is_empty() {
        let days = parse_world_calendar("<html><body><table></table></body></html>");
        assert!(days.is_empty());
    }

    #[test]
    fn world_calendar_reparse_is_identical() {
        assert_eq!(
            parse_world_calendar(WORLD_CALENDAR),
            parse_world_calendar(WORLD_CALENDAR)
        );
    }

    const CHALLENGE_CALENDAR: &str = r#"
        <html><body>
        <table class="calendar-table">
          <tr>
            <td class="day-with-date">
              <span class="day-number">8</span>
              <div class="event category_367">
                <span class="calnk">
                  <a href="https://example.com/route/three-sisters"></a>
                  <span class="spiffy-title">Three Sisters (600XP)</span>
                </span>
              </div>
              <span class="calnk">
                <a href="https://example.com/portal/old-willunga"></a>
                <span class="spiffy-title">Old Willunga Hill (250 XP)</span>
              </span>
            </td>
            <td class="day-with-date">
              <span class="day-number">15</span>
              <span class="calnk">
                <span class="spiffy-title">Not A Challenge</span>
              </span>
            </td>
          </tr>
        </table>
        </body></html>"#;

    #[test]
    fn challenge_calendar_classifies_by_ancestor_then_url() {
        let days = parse_challenge_calendar(CHALLENGE_CALENDAR);
        assert_eq!(days.len(), 1, "day 15 has no matching events");
        let day = &days[0];
        assert_eq!(day.day, 8);

        let route = day.route.as_ref().expect("route classified via ancestor");
        assert_eq!(route.name, "Three Sisters");
        assert_eq!(route.xp, 600);

        let climb = day.climb.as_ref().expect("climb classified via url");
        assert_eq!(climb.name, "Old Willunga Hill");
        assert_eq!(climb.xp, 250);
        assert_eq!(
            climb.detail_url.as_deref(),
            Some("https://example.com/portal/old-willunga")
        );
    }

    #[test]
    fn xp_pattern_requires_trailing_xp_marker() {
        assert!(xp_pattern().captures("Alpe du Zwift (1000XP)").is_some());
        assert!(xp_pattern().captures("Alpe du Zwift (1000 XP)").is_some());
        assert!(xp_pattern().captures("Alpe du Zwift").is_none());
        assert!(xp_pattern().captures("Alpe du Zwift (fast)").is_none());
    }
}
