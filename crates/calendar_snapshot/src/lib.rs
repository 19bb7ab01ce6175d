pub mod artifact;
pub mod assemble;
pub mod calendar;
pub mod config;
pub mod detail;
pub mod error;
pub mod fetch;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate, Utc};
use reqwest::Client;
use tracing::info;

use artifact::{
    CHALLENGE_ARTIFACT, WORLD_ARTIFACT, challenge_archive_name, first_of_next_month,
    world_archive_name, write_with_archive,
};
use assemble::{build_challenge_json, format_csv};
use calendar::{Category, parse_challenge_calendar, parse_world_calendar};
use config::{AppConfig, CliArgs, Tunables};
use error::SnapshotError;
use fetch::{build_client, fetch_page, fetch_route_details, month_offset_url};

/// What a snapshot run produced, for logging and job-result reporting.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub world_days: usize,
    pub challenge_months: Vec<String>,
    pub detail_pages: usize,
    pub archives: Vec<PathBuf>,
}

pub async fn run(cli: CliArgs) -> Result<RunSummary, SnapshotError> {
    let AppConfig {
        paths,
        tunables,
        worlds,
        challenges,
    } = cli.resolve()?;

    let client = build_client(&tunables)?;
    let today = Utc::now().date_naive();
    let mut summary = RunSummary::default();

    if worlds {
        scrape_worlds(&client, &tunables, &paths.out_dir, today, &mut summary).await?;
    }
    if challenges {
        scrape_challenges(&client, &tunables, &paths.out_dir, today, &mut summary).await?;
    }

    Ok(summary)
}

async fn scrape_worlds(
    client: &Client,
    tunables: &Tunables,
    out_dir: &std::path::Path,
    today: NaiveDate,
    summary: &mut RunSummary,
) -> Result<(), SnapshotError> {
    info!(url = %tunables.world_calendar_url, "Fetching guest world calendar");
    let html = fetch_page(client, tunables, "world-calendar", &tunables.world_calendar_url).await?;

    let days = parse_world_calendar(&html);
    if days.is_empty() {
        return Err(SnapshotError::EmptyExtraction(
            "no guest world days on the schedule page".to_string(),
        ));
    }

    let csv = format_csv(&days);
    let archive = write_with_archive(out_dir, WORLD_ARTIFACT, &world_archive_name(today), &csv)?;

    info!(days = days.len(), archive = %archive.display(), "Wrote guest world artifacts");
    summary.world_days = days.len();
    summary.archives.push(archive);
    Ok(())
}

/// Challenges span month boundaries, so each run scrapes the current and the
/// following month in one pass.
async fn scrape_challenges(
    client: &Client,
    tunables: &Tunables,
    out_dir: &std::path::Path,
    today: NaiveDate,
    summary: &mut RunSummary,
) -> Result<(), SnapshotError> {
    let base = &tunables.challenge_calendar_url;
    info!(url = %base, "Fetching current month challenge calendar");
    let current_html = fetch_page(client, tunables, "challenge-calendar", base).await?;
    let current_days = parse_challenge_calendar(&current_html);

    let next = first_of_next_month(today);
    let next_url = month_offset_url(base, next.year(), next.month());
    info!(url = %next_url, "Fetching next month challenge calendar");
    let next_html = fetch_page(client, tunables, "challenge-calendar", &next_url).await?;
    let next_days = parse_challenge_calendar(&next_html);

    if current_days.is_empty() && next_days.is_empty() {
        return Err(SnapshotError::EmptyExtraction(
            "no challenge days found for either month".to_string(),
        ));
    }

    let mut detail_urls = BTreeSet::new();
    for day in current_days.iter().chain(next_days.iter()) {
        for category in [Category::Route, Category::Climb] {
            if let Some(url) = day.get(category).and_then(|event| event.detail_url.clone()) {
                detail_urls.insert(url);
            }
        }
    }
    let details = fetch_route_details(client, tunables, base, &detail_urls).await;

    let mut days_by_month = BTreeMap::new();
    if !current_days.is_empty() {
        days_by_month.insert(month_key(today), current_days);
    }
    if !next_days.is_empty() {
        days_by_month.insert(month_key(next), next_days);
    }

    let challenge_json = build_challenge_json(&days_by_month, &details);
    let serialized = serde_json::to_string(&challenge_json)?;
    let archive = write_with_archive(
        out_dir,
        CHALLENGE_ARTIFACT,
        &challenge_archive_name(today),
        &serialized,
    )?;

    info!(
        months = ?days_by_month.keys().collect::<Vec<_>>(),
        details = detail_urls.len(),
        archive = %archive.display(),
        "Wrote challenge artifacts"
    );
    summary.challenge_months = days_by_month.keys().cloned().collect();
    summary.detail_pages = detail_urls.len();
    summary.archives.push(archive);
    Ok(())
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}
