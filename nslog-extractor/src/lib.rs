//! Event Log Extractor Library
//!
//! A stateless, reusable library for turning an acquisition-device event log
//! (tab-delimited text exported alongside an EEG recording) into a time-aligned
//! timeline of experimental events.
//!
//! # Architecture
//!
//! Data flows strictly forward through five stages:
//! - **Parser**: splits lines on tabs and decodes `[_]HH:MM:SS:MMM` timestamps
//! - **Classifier**: builds the umbrella / practice / trial / sentence tables and
//!   enforces the expected record counts
//! - **Onsets**: onset-only (or offset-only) views of a table
//! - **Impedance**: detects the experiment layout and pairs impedance-check
//!   onset and offset markers into intervals
//! - **Alignment**: checks log onsets against device-detected sample events and
//!   relabels those events as onsets (1) or offsets (2)
//!
//! The library does NOT:
//! - Read the physiological recording itself
//! - Detect device events or artifacts in the signal
//! - Persist anything
//!
//! # Example Usage
//!
//! ```no_run
//! use nslog_extractor::{EventLogExtractor, ExtractorConfig, SampleEvent};
//! use std::path::Path;
//!
//! let extractor = EventLogExtractor::new(ExtractorConfig::new()).unwrap();
//! let session = extractor.extract_file(Path::new("sfv_eeg_011ts_nsevent")).unwrap();
//!
//! match extractor.impedances(&session) {
//!     Ok(intervals) => println!("{} impedance periods", intervals.len()),
//!     Err(e) => eprintln!("Impedance extraction failed: {}", e),
//! }
//!
//! // Device events come from the recording reader's trigger detection
//! let device_events: Vec<SampleEvent> = Vec::new();
//! let trials = &session.tables.trial;
//! let relabeled = extractor.align(trials, &device_events);
//! ```

// Public modules
pub mod align;
pub mod annotation;
pub mod classifier;
pub mod config;
pub mod extractor;
pub mod impedance;
pub mod onsets;
pub mod parser;
pub mod types;

// Re-export main types for convenience
pub use align::{
    assign_event_ids, assign_event_ids_in_place, find_onsets, AlignedPairs, SampleClock,
};
pub use annotation::Annotation;
pub use classifier::{classify, EventTables};
pub use config::{ExtractorConfig, ImpedanceConfig, OffsetRule, SubgroupConfig, SubgroupSpec};
pub use extractor::{subject_id_from_path, EventLogExtractor, SessionEvents};
pub use impedance::{find_impedances, ImpedanceIntervals, Variant};
pub use onsets::{offset_records, onset_records};
pub use parser::{decode_timestamp, encode_timestamp, parse_log_file, parse_log_str, ParsedLog};
pub use types::{
    Category, EventRecord, ExtractorError, ImpedanceInterval, MarkerKind, RawLogLine,
    Result, SampleEvent, Timestamp, TimestampMs,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
