use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::SnapshotError;

/// CLI surface for the calendar snapshot job.
#[derive(Debug, Parser, Clone)]
#[command(author, version, about = "Scrape the guest world and weekly challenge calendars")]
pub struct CliArgs {
    /// Output directory for the snapshot artifacts (CSV + JSON + archives).
    #[arg(long = "out-dir", value_name = "DIR", default_value = "artifacts")]
    pub out_dir: PathBuf,

    /// Skip the weekly challenge scrape and only refresh the world CSV.
    #[arg(long = "worlds-only")]
    pub worlds_only: bool,

    /// Skip the world CSV scrape and only refresh the challenge JSON.
    #[arg(long = "challenges-only")]
    pub challenges_only: bool,
}

#[derive(Debug, Clone)]
pub struct Paths {
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Tunables {
    pub world_calendar_url: String,
    pub challenge_calendar_url: String,
    pub request_timeout_secs: u64,
    pub detail_timeout_secs: u64,
    pub max_retries: usize,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paths: Paths,
    pub tunables: Tunables,
    pub worlds: bool,
    pub challenges: bool,
}

impl CliArgs {
    pub fn resolve(self) -> Result<AppConfig, SnapshotError> {
        if self.worlds_only && self.challenges_only {
            return Err(SnapshotError::Config(
                "--worlds-only and --challenges-only are mutually exclusive".to_string(),
            ));
        }

        let out_dir = resolve_path(&self.out_dir)?;
        ensure_directory(&out_dir)?;

        let tunables = Tunables::from_env()?;

        Ok(AppConfig {
            paths: Paths { out_dir },
            tunables,
            worlds: !self.challenges_only,
            challenges: !self.worlds_only,
        })
    }
}

impl Tunables {
    pub fn from_env() -> Result<Self, SnapshotError> {
        let world_calendar_url = env::var("GUESTWORLD_CALENDAR_URL").map_err(|_| {
            SnapshotError::Config("GUESTWORLD_CALENDAR_URL must be set".to_string())
        })?;
        let challenge_calendar_url = env::var("GUESTWORLD_CHALLENGES_URL").map_err(|_| {
            SnapshotError::Config("GUESTWORLD_CHALLENGES_URL must be set".to_string())
        })?;

        let request_timeout_secs = parse_u64_env("SNAPSHOT_REQUEST_TIMEOUT_SECS", 30)?;
        let detail_timeout_secs = parse_u64_env("SNAPSHOT_DETAIL_TIMEOUT_SECS", 15)?;
        let max_retries = parse_usize_env("SNAPSHOT_MAX_RETRIES", 3)?;
        let retry_backoff_ms = parse_u64_env("SNAPSHOT_RETRY_BACKOFF_MS", 1_000)?;

        Ok(Self {
            world_calendar_url,
            challenge_calendar_url,
            request_timeout_secs,
            detail_timeout_secs,
            max_retries,
            retry_backoff_ms,
        })
    }
}

fn parse_u64_env(var: &str, default: u64) -> Result<u64, SnapshotError> {
    parse_env(var, default, |s| s.parse::<u64>())
}

fn parse_usize_env(var: &str, default: usize) -> Result<usize, SnapshotError> {
    parse_env(var, default, |s| s.parse::<usize>())
}

fn parse_env<T, F, E>(var: &str, default: T, mut parser: F) -> Result<T, SnapshotError>
where
    F: FnMut(&str) -> Result<T, E>,
    T: Copy,
    E: std::fmt::Display,
{
    match env::var(var) {
        Ok(value) => match parser(&value) {
            Ok(parsed) => Ok(parsed),
            Err(err) => Err(SnapshotError::Config(format!(
                "invalid value for {}: {}",
                var, err
            ))),
        },
        Err(_) => Ok(default),
    }
}

fn resolve_path(path: &Path) -> Result<PathBuf, SnapshotError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

fn ensure_directory(path: &Path) -> Result<(), SnapshotError> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
