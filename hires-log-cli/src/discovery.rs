//! Hourly log file discovery
//!
//! Controller logs are stored as `{dir}/{site}/TRAF_{site}_{YYYY_MM_DD}_{HHMM}.csv`,
//! one file per hour.

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use hires_log_engine::types::normalize_site_id;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the hourly log for a site, date and start time
pub fn file_name(site: &str, date: &str, time: Option<&str>) -> String {
    let date = date.replace(['-', '/'], "_");
    format!(
        "TRAF_{}_{}_{}.csv",
        normalize_site_id(site),
        date,
        time.unwrap_or("0000")
    )
}

/// Select the file for the start hour plus the following files, in name order
///
/// `hours` counts files including the first; `None` selects every file from
/// the start hour on.
pub fn select_files(
    dir: &Path,
    site: &str,
    date: &str,
    time: Option<&str>,
    hours: Option<usize>,
) -> Result<Vec<PathBuf>> {
    let site_dir = dir.join(normalize_site_id(site));
    let mut names: Vec<String> = fs::read_dir(&site_dir)
        .with_context(|| format!("Failed to list site directory: {:?}", site_dir))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();

    let target = file_name(site, date, time);
    let Some(start) = names.iter().position(|n| *n == target) else {
        bail!("Log file {} not found in {:?}", target, site_dir);
    };

    let end = match hours {
        Some(h) => (start + h).min(names.len()),
        None => names.len(),
    };

    log::debug!("Selected {} files starting at {}", end - start, target);
    Ok(names[start..end].iter().map(|n| site_dir.join(n)).collect())
}

/// Query window covered by the selected hourly files
///
/// The end is only known when a number of hours is given.
pub fn hour_window(
    date: &str,
    time: Option<&str>,
    hours: Option<usize>,
) -> Result<(NaiveDateTime, Option<NaiveDateTime>)> {
    let day = NaiveDate::parse_from_str(&date.replace('/', "-"), "%Y-%m-%d")
        .with_context(|| format!("Invalid date: {:?}", date))?;
    let time = time.unwrap_or("0000");
    let clock = NaiveTime::parse_from_str(time, "%H%M")
        .with_context(|| format!("Invalid start time: {:?}", time))?;

    let start = day.and_time(clock);
    let end = hours.map(|h| start + Duration::hours(h as i64));
    Ok((start, end))
}
