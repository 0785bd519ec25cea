//! Extractor configuration types
//!
//! Every experiment-specific constant (expected record counts, marker labels,
//! impedance marker rules, sampling rate) lives here so the same engine can be
//! reused across experiment designs. Defaults match the reference experiment.

use crate::impedance::Variant;
use crate::types::{Category, ExtractorError, MarkerKind, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the extractor library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Characters following the first one in an umbrella record's code
    #[serde(default = "default_umbrella_suffix")]
    pub umbrella_suffix: String,

    /// Subgroup codes and their expected record counts
    #[serde(default)]
    pub subgroups: SubgroupConfig,

    /// Label marking the start of an event of interest
    #[serde(default = "default_onset_label")]
    pub onset_marker_label: String,

    /// Label marking the end of an event of interest
    #[serde(default = "default_offset_label")]
    pub offset_marker_label: String,

    /// Sampling rate of the recording device in Hz
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate_hz: f64,

    /// Impedance-check marker rules
    #[serde(default)]
    pub impedance: ImpedanceConfig,
}

fn default_umbrella_suffix() -> String {
    "lst".to_string()
}

fn default_onset_label() -> String {
    "lstS".to_string()
}

fn default_offset_label() -> String {
    "lstE".to_string()
}

fn default_sampling_rate() -> f64 {
    200.0
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            umbrella_suffix: default_umbrella_suffix(),
            subgroups: SubgroupConfig::default(),
            onset_marker_label: default_onset_label(),
            offset_marker_label: default_offset_label(),
            sampling_rate_hz: default_sampling_rate(),
            impedance: ImpedanceConfig::default(),
        }
    }
}

/// A subgroup's code and how many records it must contain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgroupSpec {
    pub code: String,
    pub expected: usize,
}

impl SubgroupSpec {
    pub fn new(code: impl Into<String>, expected: usize) -> Self {
        Self {
            code: code.into(),
            expected,
        }
    }
}

/// Practice / trial / sentence subgroup definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgroupConfig {
    #[serde(default = "default_practice")]
    pub practice: SubgroupSpec,
    #[serde(default = "default_trial")]
    pub trial: SubgroupSpec,
    #[serde(default = "default_sentence")]
    pub sentence: SubgroupSpec,
}

fn default_practice() -> SubgroupSpec {
    SubgroupSpec::new("plst", 10)
}

fn default_trial() -> SubgroupSpec {
    SubgroupSpec::new("tlst", 800)
}

fn default_sentence() -> SubgroupSpec {
    SubgroupSpec::new("slst", 200)
}

impl Default for SubgroupConfig {
    fn default() -> Self {
        Self {
            practice: default_practice(),
            trial: default_trial(),
            sentence: default_sentence(),
        }
    }
}

impl SubgroupConfig {
    /// Look up the spec for a subgroup (None for the umbrella table)
    pub fn get(&self, category: Category) -> Option<&SubgroupSpec> {
        match category {
            Category::Practice => Some(&self.practice),
            Category::Trial => Some(&self.trial),
            Category::Sentence => Some(&self.sentence),
            Category::Umbrella => None,
        }
    }

    /// Which subgroup a code belongs to, if any
    pub fn category_of(&self, code: &str) -> Option<Category> {
        Category::SUBGROUPS
            .into_iter()
            .find(|category| self.get(*category).is_some_and(|spec| spec.code == code))
    }

    /// Expected size of the umbrella table
    pub fn expected_total(&self) -> usize {
        self.practice.expected + self.trial.expected + self.sentence.expected
    }
}

/// One way a log line can close an impedance check
///
/// A line matches when its code and label are equal to the rule's and its
/// index column is one of `indices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetRule {
    pub code: String,
    pub label: String,
    pub indices: Vec<String>,
}

impl OffsetRule {
    pub fn new(code: impl Into<String>, label: impl Into<String>, indices: &[&str]) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            indices: indices.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Check a line's code / label / index columns against this rule
    pub fn matches(&self, code: &str, label: &str, index: &str) -> bool {
        self.code == code && self.label == label && self.indices.iter().any(|i| i == index)
    }
}

/// Impedance-check marker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpedanceConfig {
    /// Code of the line that starts an impedance check
    #[serde(default = "default_impedance_onset_code")]
    pub onset_code: String,

    /// Offset rules for the "st" layout
    #[serde(default = "default_st_rules")]
    pub st_rules: Vec<OffsetRule>,

    /// Offset rules for the "ts" layout
    #[serde(default = "default_ts_rules")]
    pub ts_rules: Vec<OffsetRule>,
}

fn default_impedance_onset_code() -> String {
    "cal+".to_string()
}

const TRIAL_BLOCK_INDICES: [&str; 3] = ["100", "200", "300"];

fn default_st_rules() -> Vec<OffsetRule> {
    vec![
        OffsetRule::new("prac", "jitr", &["0"]),
        OffsetRule::new("tral", "jitr", &TRIAL_BLOCK_INDICES),
    ]
}

fn default_ts_rules() -> Vec<OffsetRule> {
    vec![
        OffsetRule::new("sntn", "jitr", &["0"]),
        OffsetRule::new("tral", "jitr", &TRIAL_BLOCK_INDICES),
    ]
}

impl Default for ImpedanceConfig {
    fn default() -> Self {
        Self {
            onset_code: default_impedance_onset_code(),
            st_rules: default_st_rules(),
            ts_rules: default_ts_rules(),
        }
    }
}

impl ImpedanceConfig {
    /// Offset rules to apply for a detected variant
    pub fn rules_for(&self, variant: Variant) -> &[OffsetRule] {
        match variant {
            Variant::St => &self.st_rules,
            Variant::Ts => &self.ts_rules,
        }
    }
}

impl ExtractorConfig {
    /// Create a new extractor configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set expected practice / trial / sentence counts
    pub fn with_expected_counts(mut self, practice: usize, trial: usize, sentence: usize) -> Self {
        self.subgroups.practice.expected = practice;
        self.subgroups.trial.expected = trial;
        self.subgroups.sentence.expected = sentence;
        self
    }

    /// Builder method: set the onset / offset marker labels
    pub fn with_marker_labels(
        mut self,
        onset: impl Into<String>,
        offset: impl Into<String>,
    ) -> Self {
        self.onset_marker_label = onset.into();
        self.offset_marker_label = offset.into();
        self
    }

    /// Builder method: set the device sampling rate
    pub fn with_sampling_rate(mut self, rate_hz: f64) -> Self {
        self.sampling_rate_hz = rate_hz;
        self
    }

    /// Builder method: set the impedance onset code
    pub fn with_impedance_onset_code(mut self, code: impl Into<String>) -> Self {
        self.impedance.onset_code = code.into();
        self
    }

    /// Classify a label as onset or offset by its final character
    ///
    /// The suffixes are the last characters of the configured marker labels.
    pub fn marker_kind(&self, label: &str) -> Option<MarkerKind> {
        let last = label.chars().last()?;
        if self.onset_marker_label.chars().last() == Some(last) {
            Some(MarkerKind::Onset)
        } else if self.offset_marker_label.chars().last() == Some(last) {
            Some(MarkerKind::Offset)
        } else {
            None
        }
    }

    /// Reject configurations the extractor cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.sampling_rate_hz.is_finite() && self.sampling_rate_hz > 0.0) {
            return Err(ExtractorError::InvalidConfig(format!(
                "sampling rate must be positive, got {}",
                self.sampling_rate_hz
            )));
        }

        if self.onset_marker_label.is_empty() || self.offset_marker_label.is_empty() {
            return Err(ExtractorError::InvalidConfig(
                "marker labels must not be empty".to_string(),
            ));
        }

        if self.onset_marker_label.chars().last() == self.offset_marker_label.chars().last() {
            return Err(ExtractorError::InvalidConfig(format!(
                "onset label {:?} and offset label {:?} share a final character",
                self.onset_marker_label, self.offset_marker_label
            )));
        }

        let codes = [
            &self.subgroups.practice.code,
            &self.subgroups.trial.code,
            &self.subgroups.sentence.code,
        ];
        for (i, code) in codes.iter().enumerate() {
            if codes[i + 1..].contains(code) {
                return Err(ExtractorError::InvalidConfig(format!(
                    "subgroup code {:?} is used more than once",
                    code
                )));
            }
        }

        Ok(())
    }
}
