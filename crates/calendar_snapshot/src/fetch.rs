use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::{info, warn};
use url::Url;

use crate::config::Tunables;
use crate::detail::{RouteDetail, parse_route_detail};
use crate::error::SnapshotError;

const MONTH_ABBRS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

pub fn build_client(tunables: &Tunables) -> Result<Client, SnapshotError> {
    let client = Client::builder()
        .user_agent("calendar-snapshot/0.1")
        .timeout(Duration::from_secs(tunables.request_timeout_secs))
        .build()?;
    Ok(client)
}

/// Calendar URL for a month other than the default page, using the site's
/// `?month=<abbr>&yr=<year>` query parameters.
pub fn month_offset_url(base: &str, year: i32, month: u32) -> String {
    let abbr = MONTH_ABBRS[(month as usize - 1).min(11)];
    format!("{base}?month={abbr}&yr={year}")
}

/// Fetch one calendar page as decoded text. Upstream failures propagate so
/// the scheduler can alert and retry the whole run.
pub async fn fetch_page(
    client: &Client,
    tunables: &Tunables,
    label: &str,
    url: &str,
) -> Result<String, SnapshotError> {
    let request = || async { client.get(url).send().await };
    let response = fetch_with_retries(label, tunables, request).await?;
    if !response.status().is_success() {
        return Err(SnapshotError::Message(format!(
            "{} responded with {}",
            label,
            response.status()
        )));
    }
    Ok(response.text().await?)
}

/// Fetch and parse every route detail page, sequentially.
///
/// One failing URL must not abort the batch: failures are recorded as `None`
/// so the builder simply omits distance/elevation for that entry.
pub async fn fetch_route_details(
    client: &Client,
    tunables: &Tunables,
    base_url: &str,
    detail_urls: &BTreeSet<String>,
) -> HashMap<String, Option<RouteDetail>> {
    let mut details = HashMap::new();
    for url in detail_urls {
        let parsed = match fetch_one_detail(client, tunables, base_url, url).await {
            Ok(detail) => detail,
            Err(err) => {
                warn!(url = %url, error = %err, "Failed to fetch detail page");
                None
            }
        };
        details.insert(url.clone(), parsed);
    }
    details
}

async fn fetch_one_detail(
    client: &Client,
    tunables: &Tunables,
    base_url: &str,
    detail_url: &str,
) -> Result<Option<RouteDetail>, SnapshotError> {
    let full_url = resolve_detail_url(base_url, detail_url)?;
    info!(url = %full_url, "Fetching detail page");

    let request = || async {
        client
            .get(full_url.as_str())
            .timeout(Duration::from_secs(tunables.detail_timeout_secs))
            .send()
            .await
    };
    let response = fetch_with_retries("route-detail", tunables, request).await?;
    if !response.status().is_success() {
        return Err(SnapshotError::Message(format!(
            "detail page responded with {}",
            response.status()
        )));
    }

    let body = response.text().await?;
    Ok(parse_route_detail(&body))
}

/// Detail links may be relative; resolve them against the calendar base URL.
pub fn resolve_detail_url(base_url: &str, detail_url: &str) -> Result<Url, SnapshotError> {
    match Url::parse(detail_url) {
        Ok(absolute) => Ok(absolute),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(base_url)?;
            Ok(base.join(detail_url)?)
        }
        Err(err) => Err(err.into()),
    }
}

async fn fetch_with_retries<F, Fut>(
    label: &str,
    tunables: &Tunables,
    mut op: F,
) -> Result<reqwest::Response, SnapshotError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let max = tunables.max_retries.max(1);
    let backoff = Duration::from_millis(tunables.retry_backoff_ms);
    let mut attempt = 0usize;

    loop {
        match op().await {
            Ok(response) => return Ok(response),
            Err(err) => {
                attempt += 1;
                let should_retry = match err.status() {
                    Some(status) => {
                        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
                    }
                    None => err.is_timeout() || err.is_connect() || err.is_request(),
                };

                if attempt >= max || !should_retry {
                    return Err(SnapshotError::Message(format!(
                        "{} request failed after {} attempts: {}",
                        label, attempt, err
                    )));
                }

                sleep(backoff).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_offset_url_uses_abbreviated_month() {
        assert_eq!(
            month_offset_url("https://example.com/challenges/", 2026, 9),
            "https://example.com/challenges/?month=sep&yr=2026"
        );
        assert_eq!(
            month_offset_url("https://example.com/challenges/", 2027, 1),
            "https://example.com/challenges/?month=jan&yr=2027"
        );
    }

    #[test]
    fn detail_urls_resolve_relative_against_base() {
        let resolved =
            resolve_detail_url("https://example.com/challenges/", "/route/three-sisters").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/route/three-sisters");

        let absolute =
            resolve_detail_url("https://example.com/challenges/", "https://other.com/portal/x")
                .unwrap();
        assert_eq!(absolute.as_str(), "https://other.com/portal/x");
    }
}
