//! Record classifier
//!
//! Builds the umbrella table (every record whose code ends in the configured
//! suffix) from a parsed log, partitions it into the practice / trial / sentence
//! subgroups, and enforces the configured record counts on every table.

use crate::config::ExtractorConfig;
use crate::parser::ParsedLog;
use crate::types::{Category, EventRecord, ExtractorError, RawLogLine, Result};
use serde::{Deserialize, Serialize};

/// The four classified tables of one event log, in original line order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTables {
    pub umbrella: Vec<EventRecord>,
    pub practice: Vec<EventRecord>,
    pub trial: Vec<EventRecord>,
    pub sentence: Vec<EventRecord>,
}

impl EventTables {
    /// Get a table by category
    pub fn table(&self, category: Category) -> &[EventRecord] {
        match category {
            Category::Umbrella => &self.umbrella,
            Category::Practice => &self.practice,
            Category::Trial => &self.trial,
            Category::Sentence => &self.sentence,
        }
    }
}

/// Classify a parsed log into umbrella and subgroup tables
///
/// # Errors
/// [`ExtractorError::EventLogSchema`] when any table's length differs from its
/// configured expectation. Subgroups are checked before the umbrella total so
/// the error names the table that is actually short.
pub fn classify(parsed: &ParsedLog, config: &ExtractorConfig) -> Result<EventTables> {
    let umbrella = umbrella_records(parsed, &config.umbrella_suffix);

    let mut practice = Vec::new();
    let mut trial = Vec::new();
    let mut sentence = Vec::new();
    for record in &umbrella {
        match config.subgroups.category_of(&record.code) {
            Some(Category::Practice) => practice.push(record.clone()),
            Some(Category::Trial) => trial.push(record.clone()),
            Some(Category::Sentence) => sentence.push(record.clone()),
            Some(Category::Umbrella) | None => {}
        }
    }

    let tables = EventTables {
        umbrella,
        practice,
        trial,
        sentence,
    };

    for category in Category::SUBGROUPS {
        let expected = config
            .subgroups
            .get(category)
            .map(|spec| spec.expected)
            .unwrap_or_default();
        check_count(category, expected, tables.table(category).len())?;
    }
    check_count(Category::Umbrella, config.subgroups.expected_total(), tables.umbrella.len())?;

    log::info!(
        "Classified {} records: {} practice, {} trials, {} sentences",
        tables.umbrella.len(),
        tables.practice.len(),
        tables.trial.len(),
        tables.sentence.len()
    );

    Ok(tables)
}

fn check_count(table: Category, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        log::error!("{} table has {} records, expected {}", table, actual, expected);
        return Err(ExtractorError::EventLogSchema {
            table,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Collect every line whose code, after its first character, equals `suffix`
fn umbrella_records(parsed: &ParsedLog, suffix: &str) -> Vec<EventRecord> {
    parsed
        .iter()
        .filter(|line| line.code().is_some_and(|code| code_tail(code) == suffix))
        .filter_map(to_record)
        .collect()
}

/// Everything after the first character of a code
fn code_tail(code: &str) -> &str {
    let mut chars = code.chars();
    chars.next();
    chars.as_str()
}

fn to_record(line: &RawLogLine) -> Option<EventRecord> {
    let (Some(code), Some(label), Some(condition), Some(index)) =
        (line.code(), line.label(), line.condition(), line.index())
    else {
        log::trace!("Line {}: too few fields for an event record, skipped", line.line_number);
        return None;
    };

    let Some(onset_ms) = line.onset_ms else {
        log::warn!(
            "Line {}: {} record without a usable timestamp, skipped",
            line.line_number,
            code
        );
        return None;
    };

    Some(EventRecord {
        code: code.to_string(),
        label: label.to_string(),
        onset_ms,
        condition: condition.to_string(),
        index: index.to_string(),
    })
}
