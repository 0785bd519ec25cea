//! Configuration loading and parsing

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use nslog_extractor::ExtractorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sessions: Vec<SessionConfig>,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// One recording session to process
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Event log exported by the acquisition software
    pub log: PathBuf,
    /// Device-detected events (sample, prior, code) to align against
    pub events: Option<PathBuf>,
    /// Which table the device events correspond to
    #[serde(default = "default_align_table")]
    pub align_table: TableName,
    /// Recording origin, for absolute annotation times
    pub orig_time: Option<DateTime<Utc>>,
}

fn default_align_table() -> TableName {
    TableName::Trial
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TableName {
    Umbrella,
    Practice,
    Trial,
    Sentence,
}

impl From<TableName> for nslog_extractor::Category {
    fn from(name: TableName) -> Self {
        use nslog_extractor::Category;
        match name {
            TableName::Umbrella => Category::Umbrella,
            TableName::Practice => Category::Practice,
            TableName::Trial => Category::Trial,
            TableName::Sentence => Category::Sentence,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate(&config).with_context(|| format!("Invalid config file: {:?}", path))?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<()> {
    config.extractor.validate()?;
    for session in &config.sessions {
        if session.log.as_os_str().is_empty() {
            bail!("session with an empty log path");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [[sessions]]
            log = "sfv_eeg_011ts_nsevent"
            events = "sfv_eeg_011ts_events.tsv"
            orig_time = "2020-03-01T09:00:00Z"

            [[sessions]]
            log = "sfv_eeg_012st_nsevent"
            align_table = "sentence"

            [extractor]
            sampling_rate_hz = 250.0

            [extractor.subgroups.trial]
            code = "tlst"
            expected = 400

            [output]
            format = "json"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.sessions.len(), 2);
        assert_eq!(config.sessions[0].align_table, TableName::Trial);
        assert!(config.sessions[0].orig_time.is_some());
        assert_eq!(config.sessions[1].align_table, TableName::Sentence);
        assert!(config.sessions[1].events.is_none());
        assert_eq!(config.extractor.sampling_rate_hz, 250.0);
        assert_eq!(config.extractor.subgroups.trial.expected, 400);
        assert_eq!(config.extractor.subgroups.practice.expected, 10);
        assert_eq!(config.extractor.onset_marker_label, "lstS");
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_load_config_rejects_invalid_extractor() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[extractor]\nsampling_rate_hz = 0.0\n").unwrap();
        file.flush().unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.sessions.is_empty());
        assert_eq!(config.extractor, ExtractorConfig::default());
        assert_eq!(config.output.format, OutputFormat::Txt);
    }
}
