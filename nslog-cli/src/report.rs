//! Report generation
//!
//! Collects per-session results and renders them as TXT or JSON.

use crate::config::OutputFormat;
use anyhow::Result;
use nslog_extractor::{Annotation, ImpedanceInterval, Variant};
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::path::PathBuf;

/// Result of one extraction stage
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Stage<T> {
    Ok(T),
    Failed(String),
    Skipped,
}

impl<T> Stage<T> {
    pub fn from_result<E: std::fmt::Display>(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(value) => Stage::Ok(value),
            Err(e) => Stage::Failed(e.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Stage::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableCounts {
    pub umbrella: usize,
    pub practice: usize,
    pub trial: usize,
    pub sentence: usize,
    pub trial_onsets: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpedanceSummary {
    pub variant: Option<Variant>,
    pub intervals: Vec<ImpedanceInterval>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlignmentSummary {
    pub table: String,
    pub aligned: usize,
    pub onsets: usize,
    pub onset_samples: Vec<u64>,
}

/// Everything reported for one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub log: PathBuf,
    pub subject: Option<String>,
    pub tables: Stage<TableCounts>,
    pub impedances: Stage<ImpedanceSummary>,
    pub alignment: Stage<AlignmentSummary>,
}

impl SessionReport {
    pub fn has_failures(&self) -> bool {
        self.tables.is_failed() || self.impedances.is_failed() || self.alignment.is_failed()
    }
}

/// Render reports in the requested format
pub fn render(reports: &[SessionReport], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
        OutputFormat::Txt => Ok(render_txt(reports)?),
    }
}

fn render_txt(reports: &[SessionReport]) -> std::result::Result<String, fmt::Error> {
    let mut out = String::new();
    let rule = "═".repeat(47);

    for report in reports {
        writeln!(out, "{}", rule)?;
        writeln!(out, "  Session: {}", report.log.display())?;
        if let Some(subject) = &report.subject {
            writeln!(out, "  Subject: {}", subject)?;
        }
        writeln!(out, "{}", rule)?;

        match &report.tables {
            Stage::Ok(counts) => {
                writeln!(out, "Tables:")?;
                writeln!(out, "  Umbrella:  {}", counts.umbrella)?;
                writeln!(out, "  Practice:  {}", counts.practice)?;
                writeln!(
                    out,
                    "  Trials:    {} ({} onsets)",
                    counts.trial, counts.trial_onsets
                )?;
                writeln!(out, "  Sentences: {}", counts.sentence)?;
            }
            Stage::Failed(e) => writeln!(out, "Tables: FAILED - {}", e)?,
            Stage::Skipped => writeln!(out, "Tables: skipped")?,
        }

        match &report.impedances {
            Stage::Ok(summary) => {
                let variant = summary
                    .variant
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "?".to_string());
                writeln!(
                    out,
                    "Impedance periods ({} variant): {}",
                    variant,
                    summary.intervals.len()
                )?;
                for (i, interval) in summary.intervals.iter().enumerate() {
                    writeln!(
                        out,
                        "  {:>3}. {:>10.3}s - {:>10.3}s ({:.3}s)",
                        i + 1,
                        interval.onset_s,
                        interval.offset_s,
                        interval.duration_s
                    )?;
                }
            }
            Stage::Failed(e) => writeln!(out, "Impedance periods: FAILED - {}", e)?,
            Stage::Skipped => writeln!(out, "Impedance periods: skipped")?,
        }

        match &report.alignment {
            Stage::Ok(summary) => writeln!(
                out,
                "Alignment ({} table): {} events, {} onsets",
                summary.table, summary.aligned, summary.onsets
            )?,
            Stage::Failed(e) => writeln!(out, "Alignment: FAILED - {}", e)?,
            Stage::Skipped => writeln!(out, "Alignment: skipped (no device events)")?,
        }
        writeln!(out)?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SessionReport {
        SessionReport {
            log: PathBuf::from("sfv_eeg_011ts_nsevent"),
            subject: Some("011".to_string()),
            tables: Stage::Ok(TableCounts {
                umbrella: 1010,
                practice: 10,
                trial: 800,
                sentence: 200,
                trial_onsets: 400,
            }),
            impedances: Stage::Failed("Impedance count mismatch".to_string()),
            alignment: Stage::Skipped,
        }
    }

    #[test]
    fn test_render_txt() {
        let text = render(&[report()], OutputFormat::Txt).unwrap();
        assert!(text.contains("Subject: 011"));
        assert!(text.contains("Trials:    800 (400 onsets)"));
        assert!(text.contains("Impedance periods: FAILED"));
        assert!(text.contains("Alignment: skipped"));
    }

    #[test]
    fn test_render_json() {
        let json = render(&[report()], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["subject"], "011");
        assert_eq!(value[0]["tables"]["status"], "ok");
        assert_eq!(value[0]["tables"]["value"]["trial"], 800);
        assert_eq!(value[0]["impedances"]["status"], "failed");
        assert_eq!(value[0]["alignment"]["status"], "skipped");
    }

    #[test]
    fn test_has_failures() {
        assert!(report().has_failures());
    }
}
