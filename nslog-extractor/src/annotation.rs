//! Annotations for the continuous recording
//!
//! Turns impedance intervals and detected artifact samples into annotation
//! records relative to the recording's origin time, ready to be attached to
//! the signal by the recording reader.

use crate::align::SampleClock;
use crate::impedance::ImpedanceIntervals;
use crate::types::Timestamp;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Description used for impedance-check annotations
pub const BAD_IMPEDANCE: &str = "bad imp";

/// Description used for eye-blink annotations
pub const BAD_EYE: &str = "bad eye";

/// Default length of a point annotation in seconds
pub const DEFAULT_POINT_DURATION_S: f64 = 0.1;

/// A labelled span of the recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Seconds from the recording origin
    pub onset_s: f64,
    pub duration_s: f64,
    pub description: String,
    /// Recording origin, when known
    pub orig_time: Option<Timestamp>,
}

impl Annotation {
    /// Wall-clock time at which the annotation starts
    pub fn absolute_onset(&self) -> Option<Timestamp> {
        let origin = self.orig_time?;
        let offset = Duration::microseconds((self.onset_s * 1_000_000.0).round() as i64);
        origin.checked_add_signed(offset)
    }

    /// Wall-clock time at which the annotation ends
    pub fn absolute_offset(&self) -> Option<Timestamp> {
        let onset = self.absolute_onset()?;
        let length = Duration::microseconds((self.duration_s * 1_000_000.0).round() as i64);
        onset.checked_add_signed(length)
    }
}

/// One annotation per impedance interval
pub fn impedance_annotations(
    intervals: &ImpedanceIntervals,
    orig_time: Option<Timestamp>,
) -> Vec<Annotation> {
    intervals
        .iter()
        .map(|interval| Annotation {
            onset_s: interval.onset_s,
            duration_s: interval.duration_s,
            description: BAD_IMPEDANCE.to_string(),
            orig_time,
        })
        .collect()
}

/// Fixed-length annotations at detected artifact samples
///
/// Samples are converted to seconds with `clock`; samples falling inside an
/// impedance interval are dropped, since artifacts there are expected.
pub fn point_annotations(
    samples: &[u64],
    clock: SampleClock,
    impedances: &ImpedanceIntervals,
    description: &str,
    duration_s: f64,
    orig_time: Option<Timestamp>,
) -> Vec<Annotation> {
    let times: Vec<f64> = samples.iter().map(|s| clock.samples_to_secs(*s)).collect();
    let kept = impedances.retain_outside(&times);

    log::debug!(
        "Kept {} of {} {:?} points outside impedance periods",
        kept.len(),
        times.len(),
        description
    );

    kept.into_iter()
        .map(|onset_s| Annotation {
            onset_s,
            duration_s,
            description: description.to_string(),
            orig_time,
        })
        .collect()
}
