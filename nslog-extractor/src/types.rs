//! Core types for the event log extractor
//!
//! This module defines the records the extractor produces from an acquisition-device
//! event log, the sample-indexed events it consumes from the recording side, and the
//! error taxonomy shared by every extraction stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since session start, as decoded from a log timestamp
pub type TimestampMs = u64;

/// Wall-clock timestamp used for recording origins
pub type Timestamp = DateTime<Utc>;

/// Result type for extractor operations
pub type Result<T> = std::result::Result<T, ExtractorError>;

/// Errors that can occur during extraction
///
/// Line-level problems (short lines, undecodable timestamps) never show up here;
/// they are skipped during parsing. Every variant below is fatal to the stage
/// that raised it and to that stage only.
#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    #[error("Event log schema mismatch in {table} table: expected {expected} records, found {actual}")]
    EventLogSchema {
        table: Category,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown experiment variant: first record code {code:?} ends in neither \"st\" nor \"ts\"")]
    UnknownVariant { code: String },

    #[error(
        "Impedance count mismatch: {onsets} onsets but {offsets} offsets. \
         Check for pauses in the session"
    )]
    ImpedanceCountMismatch { onsets: usize, offsets: usize },

    #[error("Impedance period {index} ends before it starts: onset {onset_s}s, offset {offset_s}s")]
    ImpedanceOrder {
        index: usize,
        onset_s: f64,
        offset_s: f64,
    },

    #[error(
        "Streams out of sync at pair {index}: log onset maps to sample {log_sample:.3}, \
         device reports sample {device_sample}"
    )]
    StreamDesync {
        index: usize,
        log_sample: f64,
        device_sample: u64,
    },

    #[error("Cannot align {records} log records against {events} device events")]
    StreamLengthMismatch { records: usize, events: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One line of the raw event log, split on tabs
///
/// Field positions follow the acquisition software's export layout:
/// 0 = code, 1 = label, 4 = timestamp, 7 = condition, 9 = index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLogLine {
    /// 1-based line number in the source text
    pub line_number: usize,
    /// All tab-separated fields, trailing empties included
    pub fields: Vec<String>,
    /// Decoded timestamp of field 4 (None when absent or malformed)
    pub onset_ms: Option<TimestampMs>,
}

impl RawLogLine {
    pub const CODE: usize = 0;
    pub const LABEL: usize = 1;
    pub const TIMESTAMP: usize = 4;
    pub const CONDITION: usize = 7;
    pub const INDEX: usize = 9;

    /// Get a field by position, None if the line is too short
    pub fn field(&self, position: usize) -> Option<&str> {
        self.fields.get(position).map(String::as_str)
    }

    pub fn code(&self) -> Option<&str> {
        self.field(Self::CODE)
    }

    pub fn label(&self) -> Option<&str> {
        self.field(Self::LABEL)
    }

    pub fn condition(&self) -> Option<&str> {
        self.field(Self::CONDITION)
    }

    pub fn index(&self) -> Option<&str> {
        self.field(Self::INDEX)
    }
}

/// A structured event taken from a classified log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// 4-character event code (e.g. "tlst")
    pub code: String,
    /// Event label (e.g. "lstS", "lstE")
    pub label: String,
    /// Onset in milliseconds since session start
    pub onset_ms: TimestampMs,
    /// Condition column
    pub condition: String,
    /// Index column
    pub index: String,
}

impl EventRecord {
    /// Onset converted to seconds
    pub fn onset_secs(&self) -> f64 {
        ms_to_secs(self.onset_ms)
    }
}

/// Classification groups for event records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Every record whose code ends in the umbrella suffix
    Umbrella,
    /// Practice markers
    Practice,
    /// Trial markers
    Trial,
    /// Sentence markers
    Sentence,
}

impl Category {
    /// The three subgroups, in table order
    pub const SUBGROUPS: [Category; 3] = [Category::Practice, Category::Trial, Category::Sentence];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Umbrella => write!(f, "umbrella"),
            Category::Practice => write!(f, "practice"),
            Category::Trial => write!(f, "trial"),
            Category::Sentence => write!(f, "sentence"),
        }
    }
}

/// Whether a marker opens or closes an event of interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    Onset,
    Offset,
}

impl MarkerKind {
    /// Event id written into the device stream when relabeling
    pub fn event_id(&self) -> i32 {
        match self {
            MarkerKind::Onset => 1,
            MarkerKind::Offset => 2,
        }
    }
}

/// An event detected by the recording device, in sample units
///
/// Mirrors the `(sample, previous value, code)` triples produced by the
/// recording software's trigger detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleEvent {
    /// Sample index at the device's sampling rate
    pub sample: u64,
    /// Value of the trigger channel before the event (unused here)
    pub prior: i32,
    /// Event code, rewritten to 1/2 by alignment
    pub code: i32,
}

impl SampleEvent {
    pub fn new(sample: u64, prior: i32, code: i32) -> Self {
        Self {
            sample,
            prior,
            code,
        }
    }
}

/// A period during which electrode impedance was being checked
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpedanceInterval {
    pub onset_s: f64,
    pub offset_s: f64,
    pub duration_s: f64,
}

impl ImpedanceInterval {
    /// True if `t_s` lies within the interval, both ends included
    pub fn contains(&self, t_s: f64) -> bool {
        self.onset_s <= t_s && t_s <= self.offset_s
    }
}

/// Convert milliseconds to seconds
pub fn ms_to_secs(ms: TimestampMs) -> f64 {
    ms as f64 / 1000.0
}
