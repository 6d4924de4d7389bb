use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::PageError;

const PAGE_EXTENSIONS: &[&str] = &["html", "htm"];

/// One raw page handed over by the downloader.
#[derive(Debug, Clone)]
pub struct SourcePage {
    pub file: String,
    pub path: PathBuf,
}

/// Page files in `dir`, sorted by file name. An unreadable directory aborts the run.
pub fn list_pages(dir: &Path, limit: Option<usize>) -> Result<Vec<SourcePage>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read input directory: {}", dir.display()))?;

    let mut pages = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() || !has_page_extension(&path) {
            continue;
        }
        let Some(file) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        pages.push(SourcePage {
            file: file.to_string(),
            path: path.clone(),
        });
    }

    pages.sort_by(|a, b| a.file.cmp(&b.file));
    if let Some(n) = limit {
        pages.truncate(n);
    }
    Ok(pages)
}

/// Read a page, substituting U+FFFD for bytes that are not valid UTF-8.
pub fn read_page(path: &Path) -> Result<String, PageError> {
    let bytes = fs::read(path).map_err(|source| PageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn has_page_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| PAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_sorted_html_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["0003.html", "0001.html", "notes.txt", "0002.HTM"] {
            fs::write(dir.path().join(name), "<html></html>").unwrap();
        }
        fs::create_dir(dir.path().join("sub.html")).unwrap();

        let files: Vec<String> = list_pages(dir.path(), None)
            .unwrap()
            .into_iter()
            .map(|p| p.file)
            .collect();
        assert_eq!(files, vec!["0001.html", "0002.HTM", "0003.html"]);

        let limited = list_pages(dir.path(), Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].file, "0001.html");
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_pages(&dir.path().join("nope"), None).is_err());
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.html");
        fs::write(&path, b"<p>caf\xe9</p>").unwrap();
        assert_eq!(read_page(&path).unwrap(), "<p>caf\u{fffd}</p>");
    }
}
