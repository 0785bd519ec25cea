//! Device event file reading
//!
//! Reads the `sample prior code` triples exported by the recording side's
//! trigger detection. Fields may be separated by tabs, commas or spaces; blank
//! lines and `#` comments are ignored.

use nslog_extractor::SampleEvent;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum EventFileError {
    #[error("Failed to read event file {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Line {line}: expected `sample prior code`, got {content:?}")]
    Malformed { line: usize, content: String },
}

/// Load device events from a file
pub fn load_sample_events(path: &Path) -> Result<Vec<SampleEvent>, EventFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| EventFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let events = parse_sample_events(&content)?;
    log::info!("Loaded {} device events from {:?}", events.len(), path);
    Ok(events)
}

/// Parse device events from text
pub fn parse_sample_events(content: &str) -> Result<Vec<SampleEvent>, EventFileError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(i, line)| {
            parse_line(line).ok_or_else(|| EventFileError::Malformed {
                line: i + 1,
                content: line.to_string(),
            })
        })
        .collect()
}

fn parse_line(line: &str) -> Option<SampleEvent> {
    let mut tokens = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty());

    let sample = tokens.next()?.parse().ok()?;
    let prior = tokens.next()?.parse().ok()?;
    let code = tokens.next()?.parse().ok()?;
    if tokens.next().is_some() {
        return None;
    }

    Some(SampleEvent::new(sample, prior, code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_events() {
        let text = "# sample prior code\n200\t0\t11\n\n300, 0, 12\n  400 0 11  \n";
        let events = parse_sample_events(text).unwrap();
        assert_eq!(
            events,
            vec![
                SampleEvent::new(200, 0, 11),
                SampleEvent::new(300, 0, 12),
                SampleEvent::new(400, 0, 11),
            ]
        );
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let text = "200\t0\t11\n300\t0\n";
        let err = parse_sample_events(text).unwrap_err();
        assert!(matches!(err, EventFileError::Malformed { line: 2, .. }));

        let err = parse_sample_events("-5 0 1\n").unwrap_err();
        assert!(matches!(err, EventFileError::Malformed { line: 1, .. }));

        assert!(parse_sample_events("1 2 3 4\n").is_err());
    }
}
