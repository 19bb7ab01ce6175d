use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;

/// Distance and elevation figures pulled from a route/climb detail page.
///
/// Either pair may be absent; a page with neither parses to `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteDetail {
    pub distance_km: Option<f64>,
    pub distance_mi: Option<f64>,
    pub elevation_m: Option<f64>,
    pub elevation_ft: Option<f64>,
}

fn distance_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)([\d.]+)\s*km\s*\(\s*([\d.]+)\s*mi(?:les?)?\s*\)").expect("distance pattern")
    })
}

fn elevation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)([\d,]+)\s*m\s*\(\s*([\d,]+)\s*(?:ft|'|feet)\s*\)").expect("elevation pattern")
    })
}

/// Extract distance ("22.5 km (14.0 miles)") and elevation ("350 m (1,148 ft)")
/// from a detail page. Returns `None` when neither figure is present; the
/// caller records that as missing data rather than failing the batch.
pub fn parse_route_detail(html: &str) -> Option<RouteDetail> {
    if html.trim().is_empty() {
        return None;
    }

    let document = Html::parse_document(html);
    let text = document.root_element().text().collect::<String>();

    let mut detail = RouteDetail {
        distance_km: None,
        distance_mi: None,
        elevation_m: None,
        elevation_ft: None,
    };

    if let Some(captures) = distance_pattern().captures(&text) {
        detail.distance_km = parse_float(&captures[1]);
        detail.distance_mi = parse_float(&captures[2]);
    }
    if let Some(captures) = elevation_pattern().captures(&text) {
        detail.elevation_m = parse_float(&captures[1]);
        detail.elevation_ft = parse_float(&captures[2]);
    }

    if detail.distance_km.is_none() && detail.elevation_m.is_none() {
        return None;
    }
    Some(detail)
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_distance_and_elevation() {
        let html = "<html><body><p>Distance: 22.5 km (14.0 miles)</p>\
                    <p>Elevation: 350 m (1,148 ft)</p></body></html>";
        let detail = parse_route_detail(html).expect("both figures present");
        assert_eq!(detail.distance_km, Some(22.5));
        assert_eq!(detail.distance_mi, Some(14.0));
        assert_eq!(detail.elevation_m, Some(350.0));
        assert_eq!(detail.elevation_ft, Some(1148.0));
    }

    #[test]
    fn tolerates_apostrophe_elevation_and_missing_distance() {
        let html = "<html><body>Climbs 1,050 m (3,445') total</body></html>";
        let detail = parse_route_detail(html).expect("elevation present");
        assert_eq!(detail.distance_km, None);
        assert_eq!(detail.elevation_m, Some(1050.0));
        assert_eq!(detail.elevation_ft, Some(3445.0));
    }

    #[test]
    fn empty_or_unmatched_pages_yield_none() {
        assert!(parse_route_detail("").is_none());
        assert!(parse_route_detail("<html><body>A lovely ride.</body></html>").is_none());
    }
}
