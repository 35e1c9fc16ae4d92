//! Report generation
//!
//! Serializes engine output as JSON, as a CSV interval table or as a short text
//! summary.

use crate::config::OutputFormat;
use anyhow::Result;
use hires_log_engine::{EngineOutput, Interval, StatusCategory};
use std::io::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const CSV_HEADER: &str = "loc_id,dt,event_code,parameter,event_descriptor,dt2,event_code2,parameter2,event_descriptor2,duration";

/// Write the output in the requested format
pub fn write_report<W: Write>(output: &EngineOutput, format: OutputFormat, writer: &mut W) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(output, writer),
        OutputFormat::Csv => write_csv(output, writer),
        OutputFormat::Txt => write_txt(output, writer),
    }
}

pub fn write_json<W: Write>(output: &EngineOutput, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, output)?;
    writeln!(writer)?;
    Ok(())
}

/// One row per interval or single event, sorted by start time
pub fn write_csv<W: Write>(output: &EngineOutput, writer: &mut W) -> Result<()> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for interval in output.export_rows() {
        writeln!(writer, "{}", csv_row(&output.site_id, interval))?;
    }
    Ok(())
}

fn csv_row(site_id: &str, interval: &Interval) -> String {
    [
        csv_field(site_id),
        interval.start_ts.format(TIMESTAMP_FORMAT).to_string(),
        interval.start_code.to_string(),
        interval.parameter.to_string(),
        csv_field(&interval.start_descriptor),
        interval.end_ts.format(TIMESTAMP_FORMAT).to_string(),
        interval.end_code.to_string(),
        interval.parameter.to_string(),
        csv_field(&interval.end_descriptor),
        format!("{:.3}", interval.duration_secs()),
    ]
    .join(",")
}

fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

pub fn write_txt<W: Write>(output: &EngineOutput, writer: &mut W) -> Result<()> {
    let stats = output.stats();
    writeln!(writer, "═══════════════════════════════════════════════")?;
    writeln!(writer, "  Site {}", output.site_id)?;
    writeln!(
        writer,
        "  {} → {}",
        output.window_start.format(TIMESTAMP_FORMAT),
        output.window_end.format(TIMESTAMP_FORMAT)
    )?;
    writeln!(writer, "═══════════════════════════════════════════════\n")?;

    writeln!(writer, "Records:          {}", stats.num_records)?;
    writeln!(writer, "Intervals:        {}", stats.num_intervals)?;
    for category in [StatusCategory::Phase, StatusCategory::Overlap, StatusCategory::Ops] {
        writeln!(writer, "  {:<15} {}", category.to_string(), output.intervals_in(category).count())?;
    }
    writeln!(writer, "Synthetic ends:   {}", stats.num_synthetic_endpoints)?;
    writeln!(writer, "Single events:    {}", stats.num_singles)?;
    writeln!(writer, "Flash periods:    {}", stats.num_flash_periods)?;

    for period in output.flash_periods.iter().filter(|p| p.is_flash) {
        writeln!(
            writer,
            "  flash {} → {}",
            period.start_ts.format(TIMESTAMP_FORMAT),
            period.end_ts.format(TIMESTAMP_FORMAT)
        )?;
    }
    Ok(())
}
