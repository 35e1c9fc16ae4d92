//! Controller hi-res log file parsing
//!
//! Each hourly file starts with a short header block, followed by one event per
//! line: `m/d/Y H:M:S.fff, event_code, parameter`. Fields may be padded with
//! spaces.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use hires_log_engine::RawEvent;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Number of header lines before the first event row
pub const HEADER_LINES: usize = 6;

const TIMESTAMP_FORMATS: [&str; 2] = ["%m/%d/%Y %H:%M:%S%.f", "%m/%d/%Y %H:%M:%S"];

/// Errors for a single malformed event row
#[derive(Debug, thiserror::Error)]
pub enum LogLineError {
    #[error("expected 3 fields, found {0}")]
    FieldCount(usize),

    #[error("invalid timestamp {0:?}")]
    Timestamp(String),

    #[error("invalid integer {value:?}: {source}")]
    Integer {
        value: String,
        source: std::num::ParseIntError,
    },
}

/// Parse one event row
pub fn parse_line(line: &str) -> std::result::Result<RawEvent, LogLineError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 3 {
        return Err(LogLineError::FieldCount(fields.len()));
    }

    let timestamp = parse_timestamp(fields[0])?;
    let event_code = parse_int(fields[1])?;
    let parameter = parse_int(fields[2])?;

    Ok(RawEvent::new(timestamp, event_code, parameter))
}

fn parse_timestamp(text: &str) -> std::result::Result<NaiveDateTime, LogLineError> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(|| LogLineError::Timestamp(text.to_string()))
}

fn parse_int(text: &str) -> std::result::Result<i32, LogLineError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.parse::<i32>().map_err(|source| LogLineError::Integer {
        value: text.to_string(),
        source,
    })
}

/// Parse the contents of one log file, skipping the header and bad rows
pub fn parse_log(content: &str, origin: &str) -> Vec<RawEvent> {
    let mut events = Vec::new();
    let mut skipped = 0usize;

    for (number, line) in content.lines().enumerate().skip(HEADER_LINES) {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(event) => events.push(event),
            Err(e) => {
                skipped += 1;
                log::warn!("{}:{}: skipping row: {}", origin, number + 1, e);
            }
        }
    }

    log::debug!("{}: {} events, {} rows skipped", origin, events.len(), skipped);
    events
}

/// Read and parse one log file
pub fn read_log_file(path: &Path) -> Result<Vec<RawEvent>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file: {:?}", path))?;
    Ok(parse_log(&content, &path.display().to_string()))
}

/// Read several log files in parallel and return their events sorted by time
pub fn read_log_files(paths: &[PathBuf]) -> Result<Vec<RawEvent>> {
    log::info!("Reading {} log files", paths.len());

    let per_file: Vec<Vec<RawEvent>> = paths
        .par_iter()
        .map(|path| read_log_file(path))
        .collect::<Result<_>>()?;

    let mut events: Vec<RawEvent> = per_file.into_iter().flatten().collect();
    events.sort_by_key(|e| (e.timestamp, e.event_code));
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    const HEADER: &str = "Signal Controller Log\nIntersection 00151\nIP 10.0.0.1\nModel\nVersion\nRows\n";

    #[test]
    fn test_parse_line_with_padding() {
        let event = parse_line("8/22/2024 06:00:01.300,  1 , 2 ").unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 8, 22)
            .unwrap()
            .and_hms_milli_opt(6, 0, 1, 300)
            .unwrap();
        assert_eq!(event, RawEvent::new(expected, 1, 2));
    }

    #[test]
    fn test_parse_line_without_fraction() {
        let event = parse_line("12/01/2024 23:59:59,173,2").unwrap();
        assert_eq!(event.event_code, 173);
        assert_eq!(event.timestamp.and_utc().timestamp_subsec_millis(), 0);
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(matches!(parse_line("8/22/2024 06:00:01.3,1"), Err(LogLineError::FieldCount(2))));
        assert!(matches!(parse_line("yesterday,1,2"), Err(LogLineError::Timestamp(_))));
        assert!(matches!(
            parse_line("8/22/2024 06:00:01.3,x,2"),
            Err(LogLineError::Integer { .. })
        ));
    }

    #[test]
    fn test_parse_log_skips_header_and_bad_rows() {
        let content = format!(
            "{}8/22/2024 06:00:00.100,1,2\nnot a row\n\n8/22/2024 06:00:05.000,7,2\n",
            HEADER
        );
        let events = parse_log(&content, "test");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_code, 7);
    }

    #[test]
    fn test_read_log_files_merges_and_sorts() {
        let mut second = tempfile::NamedTempFile::new().unwrap();
        write!(second, "{}8/22/2024 07:00:00.000,7,2\n", HEADER).unwrap();
        let mut first = tempfile::NamedTempFile::new().unwrap();
        write!(first, "{}8/22/2024 06:59:59.000,1,2\n8/22/2024 06:00:00.000,8,4\n", HEADER).unwrap();

        let events = read_log_files(&[second.path().to_path_buf(), first.path().to_path_buf()]).unwrap();
        let codes: Vec<i32> = events.iter().map(|e| e.event_code).collect();
        assert_eq!(codes, vec![8, 1, 7]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(read_log_files(&[PathBuf::from("/nonexistent/TRAF_00001.csv")]).is_err());
    }
}
