use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::error::PageError;
use crate::model::PatternRecord;

/// `<out_dir>/<file stem>.json`
pub fn record_path(out_dir: &Path, file: &str) -> PathBuf {
    out_dir.join(Path::new(file).with_extension("json"))
}

/// Write one page's record. Errors stay typed so the batch can record them.
pub fn write_record(out_dir: &Path, file: &str, record: &PatternRecord) -> Result<PathBuf, PageError> {
    let path = record_path(out_dir, file);
    let data = serde_json::to_vec_pretty(record).map_err(|source| PageError::Serialize {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, data).map_err(|source| PageError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;

    Ok(())
}
