use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};

use crate::error::SnapshotError;

pub const WORLD_ARTIFACT: &str = "GuestWorlds.csv";
pub const CHALLENGE_ARTIFACT: &str = "WeeklyChallenges.json";

/// Archive name for the world CSV. The schedule page publishes the upcoming
/// month, so the archive is stamped one month ahead of the scrape date.
pub fn world_archive_name(today: NaiveDate) -> String {
    let stamped = first_of_next_month(today);
    format!("GuestWorlds{:04}{:02}.csv", stamped.year(), stamped.month())
}

/// Archive name for the challenge JSON, stamped with the scrape month.
pub fn challenge_archive_name(today: NaiveDate) -> String {
    format!(
        "WeeklyChallenges{:04}{:02}.json",
        today.year(),
        today.month()
    )
}

pub fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).expect("first of month is always valid")
}

/// Write the current artifact and its archive copy.
pub fn write_with_archive(
    out_dir: &Path,
    current_name: &str,
    archive_name: &str,
    contents: &str,
) -> Result<PathBuf, SnapshotError> {
    write_artifact(&out_dir.join(current_name), contents)?;
    let archive_path = out_dir.join(archive_name);
    write_artifact(&archive_path, contents)?;
    Ok(archive_path)
}

/// Atomic write via temp file + rename, so readers never observe a torn file.
pub fn write_artifact(path: &Path, contents: &str) -> Result<(), SnapshotError> {
    let temp_path = build_temp_path(path);
    fs::write(&temp_path, contents)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

fn build_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => {
            temp_path.set_extension(format!("{ext}.tmp"));
        }
        _ => {
            temp_path.set_extension("tmp");
        }
    }
    temp_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn world_archive_is_stamped_for_next_month() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert_eq!(world_archive_name(today), "GuestWorlds202609.csv");

        let december = NaiveDate::from_ymd_opt(2026, 12, 5).unwrap();
        assert_eq!(world_archive_name(december), "GuestWorlds202701.csv");
    }

    #[test]
    fn challenge_archive_is_stamped_for_current_month() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert_eq!(challenge_archive_name(today), "WeeklyChallenges202608.json");
    }

    #[test]
    fn write_with_archive_produces_both_files() {
        let temp = tempdir().expect("tempdir");
        let archive = write_with_archive(
            temp.path(),
            WORLD_ARTIFACT,
            "GuestWorlds202609.csv",
            "Paris,1\n",
        )
        .expect("write artifacts");

        let current = fs::read_to_string(temp.path().join(WORLD_ARTIFACT)).unwrap();
        assert_eq!(current, "Paris,1\n");
        assert_eq!(fs::read_to_string(archive).unwrap(), "Paris,1\n");
    }
}
