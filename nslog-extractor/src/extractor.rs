//! Main extractor API
//!
//! This module provides the primary interface for the library. The
//! [`EventLogExtractor`] holds one configuration and runs each extraction stage
//! against it. Stages fail independently: a failed impedance search or
//! alignment never invalidates the classified tables of the same session.

use crate::align;
use crate::annotation::{self, Annotation};
use crate::classifier::{self, EventTables};
use crate::config::ExtractorConfig;
use crate::impedance::{self, ImpedanceIntervals};
use crate::onsets;
use crate::parser::{self, ParsedLog};
use crate::types::{Category, EventRecord, Result, SampleEvent, Timestamp};
use std::path::Path;

/// Everything extracted from one session's event log
#[derive(Debug, Clone)]
pub struct SessionEvents {
    /// Subject id taken from the log file name, if any
    pub subject: Option<String>,
    /// Tokenized log lines
    pub log: ParsedLog,
    /// Classified record tables
    pub tables: EventTables,
}

impl SessionEvents {
    pub fn table(&self, category: Category) -> &[EventRecord] {
        self.tables.table(category)
    }
}

/// The main extractor struct - entry point for all extraction operations
#[derive(Debug, Clone, Default)]
pub struct EventLogExtractor {
    config: ExtractorConfig,
}

impl EventLogExtractor {
    /// Create an extractor, rejecting unusable configurations
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Parse and classify an event log file
    ///
    /// # Example
    /// ```no_run
    /// use nslog_extractor::{EventLogExtractor, ExtractorConfig};
    /// use std::path::Path;
    ///
    /// let extractor = EventLogExtractor::new(ExtractorConfig::new()).unwrap();
    /// let session = extractor.extract_file(Path::new("sfv_eeg_011ts_nsevent")).unwrap();
    /// println!("trials found: {}", session.tables.trial.len());
    /// ```
    pub fn extract_file(&self, path: &Path) -> Result<SessionEvents> {
        let log = parser::parse_log_file(path)?;
        let subject = subject_id_from_path(path);
        let session = self.extract_parsed(log, subject)?;

        log::info!(
            "Event tables created for subject {}",
            session.subject.as_deref().unwrap_or("<unknown>")
        );
        log::info!("Trials found: {}", session.tables.trial.len());
        log::info!("Sentences found: {}", session.tables.sentence.len());
        Ok(session)
    }

    /// Parse and classify event log text
    pub fn extract_str(&self, content: &str) -> Result<SessionEvents> {
        self.extract_parsed(parser::parse_log_str(content), None)
    }

    fn extract_parsed(&self, log: ParsedLog, subject: Option<String>) -> Result<SessionEvents> {
        let tables = classifier::classify(&log, &self.config)?;
        Ok(SessionEvents {
            subject,
            log,
            tables,
        })
    }

    /// Onset records of the trial table
    pub fn trial_onsets(&self, session: &SessionEvents) -> Vec<EventRecord> {
        onsets::onset_records(&session.tables.trial, &self.config)
    }

    /// Onset records of any table
    pub fn onsets(&self, session: &SessionEvents, category: Category) -> Vec<EventRecord> {
        onsets::onset_records(session.table(category), &self.config)
    }

    /// Offset records of any table
    pub fn offsets(&self, session: &SessionEvents, category: Category) -> Vec<EventRecord> {
        onsets::offset_records(session.table(category), &self.config)
    }

    /// Impedance-check intervals of a session
    pub fn impedances(&self, session: &SessionEvents) -> Result<ImpedanceIntervals> {
        impedance::find_impedances(&session.log, &self.config)
    }

    /// Relabel device events against a table of log records
    pub fn align(
        &self,
        records: &[EventRecord],
        events: &[SampleEvent],
    ) -> Result<Vec<SampleEvent>> {
        align::assign_event_ids(records, events, &self.config)
    }

    /// Impedance intervals as recording annotations
    pub fn impedance_annotations(
        &self,
        intervals: &ImpedanceIntervals,
        orig_time: Option<Timestamp>,
    ) -> Vec<Annotation> {
        annotation::impedance_annotations(intervals, orig_time)
    }
}

/// Subject id from a log file name: all of its digits, in order
///
/// `sfv_eeg_011ts_nsevent` yields `"011"`.
pub fn subject_id_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExtractorError;

    #[test]
    fn test_subject_id_from_path() {
        assert_eq!(
            subject_id_from_path(Path::new("/data/sfv_eeg_011ts_nsevent")),
            Some("011".to_string())
        );
        assert_eq!(subject_id_from_path(Path::new("run2/s4_b1.txt")), Some("41".to_string()));
        assert_eq!(subject_id_from_path(Path::new("events.txt")), None);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = EventLogExtractor::new(ExtractorConfig::new().with_sampling_rate(-1.0));
        assert!(matches!(result, Err(ExtractorError::InvalidConfig(_))));
    }

    #[test]
    fn test_impedance_failure_keeps_tables() {
        let config = ExtractorConfig::new().with_expected_counts(0, 1, 0);
        let extractor = EventLogExtractor::new(config).unwrap();
        let text = "x1ts\t\t\t\t_00:00:00:000\n\
                    cal+\tcal \t\t\t_00:00:01:000\t\t\t\t\t\t\n\
                    tlst\tlstS\t\t\t_00:00:02:000\t\t\tc\t\t1\t\n";

        let session = extractor.extract_str(text).unwrap();
        assert!(matches!(
            extractor.impedances(&session),
            Err(ExtractorError::ImpedanceCountMismatch { onsets: 1, offsets: 0 })
        ));
        assert_eq!(session.tables.trial.len(), 1);
        assert_eq!(extractor.trial_onsets(&session).len(), 1);
        assert!(extractor.offsets(&session, Category::Trial).is_empty());
    }
}
