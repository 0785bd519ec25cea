//! Cross-stream alignment
//!
//! Reconciles log records (millisecond wall clock) with events detected by the
//! recording device (sample indices at a fixed rate) and relabels device events
//! as onsets (1) or offsets (2).
//!
//! The two streams are correlated purely by position: the i-th record is
//! expected to describe the i-th device event. [`AlignedPairs`] walks both
//! sequences together and checks every pair, so a desync is reported at the
//! first offending index instead of leaking into later pairs.
//!
//! # Contract
//! - [`assign_event_ids`] is pure: it returns a relabeled copy of the events.
//! - [`assign_event_ids_in_place`] rewrites the caller's slice. It checks every
//!   pair before touching anything, so on error the slice is unchanged. The
//!   caller must hold exclusive access to the slice for the duration of the call.

use crate::config::ExtractorConfig;
use crate::types::{EventRecord, ExtractorError, MarkerKind, Result, SampleEvent, TimestampMs};

/// Converts between the log's millisecond clock and the device's sample clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleClock {
    rate_hz: f64,
}

impl SampleClock {
    pub fn new(rate_hz: f64) -> Result<Self> {
        if !(rate_hz.is_finite() && rate_hz > 0.0) {
            return Err(ExtractorError::InvalidConfig(format!(
                "sampling rate must be positive, got {}",
                rate_hz
            )));
        }
        Ok(Self { rate_hz })
    }

    pub fn from_config(config: &ExtractorConfig) -> Result<Self> {
        Self::new(config.sampling_rate_hz)
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    /// Milliseconds to (fractional) sample index
    pub fn ms_to_samples(&self, ms: TimestampMs) -> f64 {
        ms as f64 * self.rate_hz / 1000.0
    }

    /// Sample index to seconds
    pub fn samples_to_secs(&self, sample: u64) -> f64 {
        sample as f64 / self.rate_hz
    }
}

/// True if a scaled log onset and a device sample differ by less than one sample
pub fn is_within_tolerance(log_sample: f64, device_sample: u64) -> bool {
    (log_sample - device_sample as f64).abs() < 1.0
}

/// One checked pair of the two streams
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPair<'a> {
    pub index: usize,
    pub record: &'a EventRecord,
    pub event: &'a SampleEvent,
    /// The record's onset in the device's sample domain
    pub log_sample: f64,
}

/// Paired iterator over log records and device events
///
/// Yields each pair that passes the tolerance check. The first failing pair is
/// yielded as [`ExtractorError::StreamDesync`] and iteration stops there.
pub struct AlignedPairs<'a> {
    records: std::slice::Iter<'a, EventRecord>,
    events: std::slice::Iter<'a, SampleEvent>,
    clock: SampleClock,
    index: usize,
    failed: bool,
}

impl<'a> AlignedPairs<'a> {
    /// Pair up two streams of equal length
    ///
    /// # Errors
    /// [`ExtractorError::StreamLengthMismatch`] when the lengths differ.
    pub fn new(
        records: &'a [EventRecord],
        events: &'a [SampleEvent],
        clock: SampleClock,
    ) -> Result<Self> {
        if records.len() != events.len() {
            log::error!(
                "Refusing to align {} log records against {} device events",
                records.len(),
                events.len()
            );
            return Err(ExtractorError::StreamLengthMismatch {
                records: records.len(),
                events: events.len(),
            });
        }

        Ok(Self {
            records: records.iter(),
            events: events.iter(),
            clock,
            index: 0,
            failed: false,
        })
    }
}

impl<'a> Iterator for AlignedPairs<'a> {
    type Item = Result<AlignedPair<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let record = self.records.next()?;
        let event = self.events.next()?;
        let index = self.index;
        self.index += 1;

        let log_sample = self.clock.ms_to_samples(record.onset_ms);
        if !is_within_tolerance(log_sample, event.sample) {
            self.failed = true;
            log::error!(
                "Sample mismatch at pair {}: log {:.3}, device {}",
                index,
                log_sample,
                event.sample
            );
            return Some(Err(ExtractorError::StreamDesync {
                index,
                log_sample,
                device_sample: event.sample,
            }));
        }

        Some(Ok(AlignedPair {
            index,
            record,
            event,
            log_sample,
        }))
    }
}

/// Relabel device events as onset / offset from the matching log records
///
/// Returns a new event sequence; `events` is left untouched. A record whose
/// label ends in neither marker suffix keeps its event's original code.
pub fn assign_event_ids(
    records: &[EventRecord],
    events: &[SampleEvent],
    config: &ExtractorConfig,
) -> Result<Vec<SampleEvent>> {
    log::info!("Aligning {} log records against device events...", records.len());

    let clock = SampleClock::from_config(config)?;
    let relabeled = AlignedPairs::new(records, events, clock)?
        .map(|pair| pair.map(|pair| relabel(pair.record, *pair.event, config)))
        .collect::<Result<Vec<_>>>()?;

    log::info!("Aligned {} events", relabeled.len());
    Ok(relabeled)
}

/// Relabel device events in place
///
/// All pairs are checked first; the slice is only rewritten once every pair
/// is known to be in sync.
pub fn assign_event_ids_in_place(
    records: &[EventRecord],
    events: &mut [SampleEvent],
    config: &ExtractorConfig,
) -> Result<()> {
    let clock = SampleClock::from_config(config)?;
    for pair in AlignedPairs::new(records, events, clock)? {
        pair?;
    }

    for (record, event) in records.iter().zip(events.iter_mut()) {
        *event = relabel(record, *event, config);
    }

    log::info!("Aligned {} events in place", events.len());
    Ok(())
}

fn relabel(record: &EventRecord, mut event: SampleEvent, config: &ExtractorConfig) -> SampleEvent {
    match config.marker_kind(&record.label) {
        Some(kind) => event.code = kind.event_id(),
        None => log::debug!(
            "Label {:?} is neither onset nor offset, keeping code {}",
            record.label,
            event.code
        ),
    }
    event
}

/// Keep only events relabeled as onsets, in order
pub fn find_onsets(events: &[SampleEvent]) -> Vec<SampleEvent> {
    let onset_id = MarkerKind::Onset.event_id();
    events.iter().copied().filter(|e| e.code == onset_id).collect()
}
