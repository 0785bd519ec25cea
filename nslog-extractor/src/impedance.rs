//! Impedance-check interval extraction
//!
//! Impedance checks are bracketed by markers outside the umbrella code family:
//! an onset code (`cal+` by default) opens a check, and the first trial / block
//! marker afterwards closes it. Which markers close a check depends on the
//! experiment layout, detected once from the first line of the log.

use crate::config::{ExtractorConfig, OffsetRule};
use crate::parser::ParsedLog;
use crate::types::{ms_to_secs, ExtractorError, ImpedanceInterval, RawLogLine, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Experiment layout, named after the tail of the first record's code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    St,
    Ts,
}

impl Variant {
    /// Detect the layout from the first record's code
    ///
    /// Looks for "ts", then "st", within the last three characters.
    pub fn detect(code: &str) -> Result<Self> {
        let tail_start = code
            .char_indices()
            .rev()
            .nth(2)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let tail = &code[tail_start..];

        if tail.contains("ts") {
            Ok(Variant::Ts)
        } else if tail.contains("st") {
            Ok(Variant::St)
        } else {
            Err(ExtractorError::UnknownVariant {
                code: code.to_string(),
            })
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::St => write!(f, "st"),
            Variant::Ts => write!(f, "ts"),
        }
    }
}

/// Impedance intervals of one session, in log order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpedanceIntervals {
    pub variant: Option<Variant>,
    pub intervals: Vec<ImpedanceInterval>,
}

impl ImpedanceIntervals {
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImpedanceInterval> {
        self.intervals.iter()
    }

    pub fn onsets(&self) -> Vec<f64> {
        self.intervals.iter().map(|i| i.onset_s).collect()
    }

    pub fn offsets(&self) -> Vec<f64> {
        self.intervals.iter().map(|i| i.offset_s).collect()
    }

    pub fn durations(&self) -> Vec<f64> {
        self.intervals.iter().map(|i| i.duration_s).collect()
    }

    /// True if `t_s` falls inside any impedance interval
    pub fn contains(&self, t_s: f64) -> bool {
        self.intervals.iter().any(|i| i.contains(t_s))
    }

    /// Drop every time point that falls inside an impedance interval
    pub fn retain_outside(&self, times_s: &[f64]) -> Vec<f64> {
        times_s.iter().copied().filter(|t| !self.contains(*t)).collect()
    }
}

/// Find impedance-check intervals in a parsed log
///
/// Onsets and offsets are paired by position. Lines whose timestamp could not
/// be decoded never count as onsets or offsets.
///
/// # Errors
/// - [`ExtractorError::UnknownVariant`] if the first line's code names no layout
/// - [`ExtractorError::ImpedanceCountMismatch`] if onsets and offsets differ in number
/// - [`ExtractorError::ImpedanceOrder`] if a pair's offset precedes its onset
pub fn find_impedances(parsed: &ParsedLog, config: &ExtractorConfig) -> Result<ImpedanceIntervals> {
    log::info!("Finding impedance periods...");

    let variant = Variant::detect(parsed.first_code().unwrap_or_default())?;
    log::debug!("Detected experiment variant: {}", variant);

    let onset_code = config.impedance.onset_code.as_str();
    let rules = config.impedance.rules_for(variant);

    let mut onsets = Vec::new();
    let mut offsets = Vec::new();
    for line in parsed {
        if line.code() == Some(onset_code) {
            push_timestamp(&mut onsets, line, "onset");
        } else if is_offset(line, rules) {
            push_timestamp(&mut offsets, line, "offset");
        }
    }

    if onsets.len() != offsets.len() {
        log::error!(
            "Found {} impedance onsets but {} offsets",
            onsets.len(),
            offsets.len()
        );
        return Err(ExtractorError::ImpedanceCountMismatch {
            onsets: onsets.len(),
            offsets: offsets.len(),
        });
    }

    let intervals = onsets
        .into_iter()
        .zip(offsets)
        .enumerate()
        .map(|(index, (onset_s, offset_s))| {
            if offset_s < onset_s {
                return Err(ExtractorError::ImpedanceOrder {
                    index,
                    onset_s,
                    offset_s,
                });
            }
            Ok(ImpedanceInterval {
                onset_s,
                offset_s,
                duration_s: offset_s - onset_s,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    log::info!("Found {} impedance periods", intervals.len());

    Ok(ImpedanceIntervals {
        variant: Some(variant),
        intervals,
    })
}

fn is_offset(line: &RawLogLine, rules: &[OffsetRule]) -> bool {
    match (line.code(), line.label(), line.index()) {
        (Some(code), Some(label), Some(index)) => {
            rules.iter().any(|rule| rule.matches(code, label, index))
        }
        _ => false,
    }
}

fn push_timestamp(times: &mut Vec<f64>, line: &RawLogLine, kind: &str) {
    match line.onset_ms {
        Some(ms) => times.push(ms_to_secs(ms)),
        None => log::warn!(
            "Line {}: impedance {} marker without a usable timestamp, skipped",
            line.line_number,
            kind
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_log_str;

    fn line(code: &str, label: &str, ts: &str, index: &str) -> String {
        format!("{}\t{}\t\t\t_{}\t\t\t\t\t{}\t\n", code, label, ts, index)
    }

    #[test]
    fn test_variant_detection() {
        assert_eq!(Variant::detect("sfv_011st").unwrap(), Variant::St);
        assert_eq!(Variant::detect("011ts").unwrap(), Variant::Ts);
        assert_eq!(Variant::detect("ts").unwrap(), Variant::Ts);
        assert_eq!(Variant::detect("st").unwrap(), Variant::St);
        assert_eq!(Variant::detect("sta").unwrap(), Variant::St);
        assert_eq!(Variant::detect("tst").unwrap(), Variant::Ts);
        assert!(matches!(
            Variant::detect("tlst"),
            Ok(Variant::St)
        ));
        assert!(matches!(
            Variant::detect("cal+"),
            Err(ExtractorError::UnknownVariant { .. })
        ));
        assert!(matches!(
            Variant::detect("stab"),
            Err(ExtractorError::UnknownVariant { .. })
        ));
        assert!(Variant::detect("").is_err());
    }

    #[test]
    fn test_ts_variant_single_interval() {
        let mut text = line("s1ts", "", "00:00:00:000", "");
        text.push_str(&line("cal+", "cal ", "01:00:00:500", ""));
        text.push_str(&line("prac", "jitr", "01:00:02:000", "0"));
        text.push_str(&line("tral", "jitr", "01:00:05:500", "100"));

        let found = find_impedances(&parse_log_str(&text), &ExtractorConfig::new()).unwrap();
        assert_eq!(found.variant, Some(Variant::Ts));
        assert_eq!(found.len(), 1);
        assert_eq!(found.intervals[0].onset_s, 3600.5);
        assert_eq!(found.intervals[0].offset_s, 3605.5);
        assert_eq!(found.intervals[0].duration_s, 5.0);
    }

    #[test]
    fn test_st_variant_uses_practice_marker() {
        let mut text = line("s1st", "", "00:00:00:000", "");
        text.push_str(&line("cal+", "cal ", "00:01:00:000", ""));
        text.push_str(&line("sntn", "jitr", "00:01:30:000", "0"));
        text.push_str(&line("prac", "jitr", "00:02:00:000", "0"));
        text.push_str(&line("cal+", "cal ", "00:10:00:000", ""));
        text.push_str(&line("tral", "jitr", "00:10:10:000", "400"));
        text.push_str(&line("tral", "jitr", "00:11:00:000", "300"));

        let found = find_impedances(&parse_log_str(&text), &ExtractorConfig::new()).unwrap();
        assert_eq!(found.variant, Some(Variant::St));
        assert_eq!(found.onsets(), vec![60.0, 600.0]);
        assert_eq!(found.offsets(), vec![120.0, 660.0]);
        assert_eq!(found.durations(), vec![60.0, 60.0]);
        assert!(found.durations().iter().all(|d| *d >= 0.0));
    }

    #[test]
    fn test_count_mismatch() {
        let mut text = line("s1ts", "", "00:00:00:000", "");
        text.push_str(&line("cal+", "cal ", "00:01:00:000", ""));
        text.push_str(&line("cal+", "cal ", "00:02:00:000", ""));
        text.push_str(&line("tral", "jitr", "00:03:00:000", "100"));

        let err = find_impedances(&parse_log_str(&text), &ExtractorConfig::new()).unwrap_err();
        assert!(matches!(
            err,
            ExtractorError::ImpedanceCountMismatch {
                onsets: 2,
                offsets: 1
            }
        ));
    }

    #[test]
    fn test_offset_before_onset() {
        let mut text = line("s1ts", "", "00:00:00:000", "");
        text.push_str(&line("tral", "jitr", "00:00:30:000", "100"));
        text.push_str(&line("cal+", "cal ", "00:01:00:000", ""));

        let err = find_impedances(&parse_log_str(&text), &ExtractorConfig::new()).unwrap_err();
        assert!(matches!(err, ExtractorError::ImpedanceOrder { index: 0, .. }));
    }

    #[test]
    fn test_unknown_variant() {
        let text = line("cal+", "cal ", "00:01:00:000", "");
        let err = find_impedances(&parse_log_str(&text), &ExtractorConfig::new()).unwrap_err();
        assert!(matches!(err, ExtractorError::UnknownVariant { ref code } if code == "cal+"));

        let err = find_impedances(&parse_log_str(""), &ExtractorConfig::new()).unwrap_err();
        assert!(matches!(err, ExtractorError::UnknownVariant { ref code } if code.is_empty()));
    }

    #[test]
    fn test_retain_outside() {
        let found = ImpedanceIntervals {
            variant: Some(Variant::St),
            intervals: vec![
                ImpedanceInterval {
                    onset_s: 10.0,
                    offset_s: 20.0,
                    duration_s: 10.0,
                },
                ImpedanceInterval {
                    onset_s: 50.0,
                    offset_s: 55.0,
                    duration_s: 5.0,
                },
            ],
        };
        assert!(found.contains(10.0));
        assert!(found.contains(55.0));
        assert!(!found.contains(30.0));
        assert_eq!(
            found.retain_outside(&[5.0, 15.0, 20.0, 30.0, 52.0, 60.0]),
            vec![5.0, 30.0, 60.0]
        );
    }
}
