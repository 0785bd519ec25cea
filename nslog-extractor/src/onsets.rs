//! Onset / offset sub-views of a classified table

use crate::config::ExtractorConfig;
use crate::types::EventRecord;

/// Records whose label equals the configured onset marker label
pub fn onset_records(table: &[EventRecord], config: &ExtractorConfig) -> Vec<EventRecord> {
    records_with_label(table, &config.onset_marker_label)
}

/// Records whose label equals the configured offset marker label
pub fn offset_records(table: &[EventRecord], config: &ExtractorConfig) -> Vec<EventRecord> {
    records_with_label(table, &config.offset_marker_label)
}

fn records_with_label(table: &[EventRecord], label: &str) -> Vec<EventRecord> {
    let selected: Vec<EventRecord> = table.iter().filter(|r| r.label == label).cloned().collect();
    log::debug!("Selected {} of {} records labelled {:?}", selected.len(), table.len(), label);
    selected
}
