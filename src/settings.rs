use std::path::PathBuf;

use anyhow::{Context, Result};
use config::Config;
use serde::Deserialize;

const CONFIG_FILE: &str = "patterns";
const ENV_PREFIX: &str = "PATTERNS";

/// Run settings: defaults, then `patterns.toml`, then `PATTERNS_*` env vars.
/// CLI flags are applied on top by the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub aggregate_path: PathBuf,
    pub report_path: PathBuf,
    pub base_url: String,
    pub target_language: String,
    pub translate: bool,
    pub jobs: usize,
    pub translate_endpoint: String,
    pub translate_timeout_secs: u64,
    pub translate_retries: u32,
    pub translate_backoff_ms: u64,
    pub translate_max_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            input_dir: "downloaded_patterns".into(),
            output_dir: "json_patterns_full".into(),
            aggregate_path: "patterns_dataset.json".into(),
            report_path: "patterns_report.json".into(),
            base_url: "https://www.ravelry.com".into(),
            target_language: "en".into(),
            translate: true,
            jobs: 1,
            translate_endpoint: "https://translate.googleapis.com/translate_a/single".into(),
            translate_timeout_secs: 15,
            translate_retries: 2,
            translate_backoff_ms: 1000,
            translate_max_chars: 4500,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")
    }
}
