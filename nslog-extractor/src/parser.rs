//! Event log parser
//!
//! Splits a tab-delimited acquisition-device event log into [`RawLogLine`]s and
//! decodes each line's `[_]HH:MM:SS:MMM` timestamp into milliseconds.
//!
//! Parsing never fails on content: a line that is too short or carries a
//! malformed timestamp is kept with `onset_ms == None` and simply does not take
//! part in later stages that need a timestamp. Only IO errors are reported.

use crate::types::{RawLogLine, Result, TimestampMs};
use std::path::Path;

const FIELD_DELIMITER: char = '\t';

/// The tokenized contents of one event log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLog {
    pub lines: Vec<RawLogLine>,
}

impl ParsedLog {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawLogLine> {
        self.lines.iter()
    }

    /// Code of the very first line, used for variant detection
    pub fn first_code(&self) -> Option<&str> {
        self.lines.first().and_then(RawLogLine::code)
    }

    /// Number of lines whose timestamp could not be decoded
    pub fn undecoded_count(&self) -> usize {
        self.lines.iter().filter(|l| l.onset_ms.is_none()).count()
    }
}

impl<'a> IntoIterator for &'a ParsedLog {
    type Item = &'a RawLogLine;
    type IntoIter = std::slice::Iter<'a, RawLogLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// Read and tokenize an event log file
pub fn parse_log_file(path: &Path) -> Result<ParsedLog> {
    log::info!("Parsing event log: {:?}", path);

    let bytes = std::fs::read(path)?;

    // Event logs are ASCII-compatible single-byte text; fall back to Latin-1
    let content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Event log {:?} is not UTF-8, reading as Latin-1", path);
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    Ok(parse_log_str(&content))
}

/// Tokenize event log text
pub fn parse_log_str(content: &str) -> ParsedLog {
    let lines: Vec<RawLogLine> = content
        .lines()
        .enumerate()
        .map(|(i, line)| parse_line(i + 1, line))
        .collect();

    let parsed = ParsedLog { lines };
    log::debug!(
        "Tokenized {} lines ({} without a usable timestamp)",
        parsed.len(),
        parsed.undecoded_count()
    );
    parsed
}

fn parse_line(line_number: usize, line: &str) -> RawLogLine {
    let fields: Vec<String> = line.split(FIELD_DELIMITER).map(str::to_string).collect();

    let onset_ms = fields
        .get(RawLogLine::TIMESTAMP)
        .and_then(|field| decode_timestamp(field));

    if onset_ms.is_none() && fields.len() > RawLogLine::TIMESTAMP {
        log::trace!(
            "Line {}: undecodable timestamp {:?}",
            line_number,
            fields[RawLogLine::TIMESTAMP]
        );
    }

    RawLogLine {
        line_number,
        fields,
        onset_ms,
    }
}

/// Decode a `[_]HH:MM:SS:MMM` timestamp into milliseconds
///
/// A single leading non-digit filler character is dropped. Each sub-field must
/// be all ASCII digits with widths 2, 2, 2 and 3.
pub fn decode_timestamp(field: &str) -> Option<TimestampMs> {
    let trimmed = match field.chars().next() {
        Some(c) if !c.is_ascii_digit() => &field[c.len_utf8()..],
        _ => field,
    };

    let mut parts = trimmed.split(':');
    let hh = parse_fixed(parts.next()?, 2)?;
    let mm = parse_fixed(parts.next()?, 2)?;
    let ss = parse_fixed(parts.next()?, 2)?;
    let ms = parse_fixed(parts.next()?, 3)?;
    if parts.next().is_some() {
        return None;
    }

    Some(hh * 3_600_000 + mm * 60_000 + ss * 1_000 + ms)
}

fn parse_fixed(part: &str, width: usize) -> Option<u64> {
    if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Encode milliseconds as `HH:MM:SS:MMM`
///
/// Hours are zero-padded to two digits; values of 100 hours or more print wider
/// and will not decode again.
pub fn encode_timestamp(ms: TimestampMs) -> String {
    let hh = ms / 3_600_000;
    let mm = (ms / 60_000) % 60;
    let ss = (ms / 1_000) % 60;
    let mmm = ms % 1_000;
    format!("{:02}:{:02}:{:02}:{:03}", hh, mm, ss, mmm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_decode_timestamp() {
        assert_eq!(decode_timestamp("01:00:00:500"), Some(3_600_500));
        assert_eq!(decode_timestamp("_01:00:05:500"), Some(3_605_500));
        assert_eq!(decode_timestamp("00:00:00:000"), Some(0));
        assert_eq!(decode_timestamp("_99:59:59:999"), Some(359_999_999));
    }

    #[test]
    fn test_decode_timestamp_rejects_malformed() {
        assert_eq!(decode_timestamp(""), None);
        assert_eq!(decode_timestamp("_"), None);
        assert_eq!(decode_timestamp("01:00:00"), None);
        assert_eq!(decode_timestamp("01:00:00:5"), None);
        assert_eq!(decode_timestamp("01:0a:00:500"), None);
        assert_eq!(decode_timestamp("01:00:00:500:1"), None);
        assert_eq!(decode_timestamp("__01:00:00:500"), None);
        assert_eq!(decode_timestamp("+1:00:00:500"), None);
    }

    #[test]
    fn test_timestamp_round_trip() {
        for hh in [0u64, 1, 9, 23, 42, 99] {
            for mm in [0u64, 1, 30, 59] {
                for ss in [0u64, 7, 59] {
                    for mmm in [0u64, 1, 500, 999] {
                        let ms = hh * 3_600_000 + mm * 60_000 + ss * 1_000 + mmm;
                        let encoded = encode_timestamp(ms);
                        assert_eq!(decode_timestamp(&encoded), Some(ms), "{}", encoded);
                        assert_eq!(decode_timestamp(&format!("_{}", encoded)), Some(ms));
                    }
                }
            }
        }
    }

    #[test]
    fn test_parse_keeps_short_and_trailing_fields() {
        let text = "tlst\tlstS\t\t\t_00:00:01:000\t\t\tc1\t\t5\t\n\
                    short\tline\n\
                    \n";
        let parsed = parse_log_str(text);
        assert_eq!(parsed.len(), 3);

        let first = &parsed.lines[0];
        assert_eq!(first.fields.len(), 11);
        assert_eq!(first.fields[10], "");
        assert_eq!(first.onset_ms, Some(1_000));
        assert_eq!(first.condition(), Some("c1"));
        assert_eq!(first.index(), Some("5"));

        assert_eq!(parsed.lines[1].onset_ms, None);
        assert_eq!(parsed.lines[1].line_number, 2);
        assert_eq!(parsed.lines[2].fields, vec![String::new()]);
        assert_eq!(parsed.undecoded_count(), 2);
        assert_eq!(parsed.first_code(), Some("tlst"));
    }

    #[test]
    fn test_parse_handles_crlf() {
        let parsed = parse_log_str("a\tb\tc\td\t_00:00:00:010\r\nx\r\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.lines[0].onset_ms, Some(10));
        assert_eq!(parsed.lines[1].fields, vec!["x".to_string()]);
    }

    #[test]
    fn test_parse_log_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"cal+\tcal \t\t\t_01:00:00:500\t\t\t\t\t\t\n")
            .unwrap();
        temp_file.flush().unwrap();

        let parsed = parse_log_file(temp_file.path()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.lines[0].code(), Some("cal+"));
        assert_eq!(parsed.lines[0].onset_ms, Some(3_600_500));
    }

    #[test]
    fn test_parse_missing_file() {
        let result = parse_log_file(Path::new("/nonexistent/session_nsevent"));
        assert!(result.is_err());
    }
}
