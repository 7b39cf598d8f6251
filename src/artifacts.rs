//! On-disk artifacts: plan and result documents, and per-attempt logs.

use std::fs;
use std::path::Path;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{AnvilError, Result};

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUT_DIR: &str = ".foundry/out";

/// File name of the plan document inside the output directory.
pub const PLAN_FILE: &str = "plan.json";

/// File name of the result document inside the output directory.
pub const RESULTS_FILE: &str = "results.json";

/// Current time in UTC, truncated to whole seconds.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Create a directory and its parents if missing.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(AnvilError::Io)
}

/// Write `value` as pretty JSON with a trailing newline.
///
/// The document is written to a sibling temp file and renamed into place,
/// so readers never observe a partial file.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut content = serde_json::to_vec_pretty(value)?;
    content.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, &content)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

/// Read a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read(path)?;
    serde_json::from_slice(&content).map_err(|e| AnvilError::Serialization {
        message: format!("{}: {}", path.display(), e),
    })
}

/// Destination for captured attempt output.
pub trait LogSink: Send + Sync {
    /// Persist `contents` at `path`.
    fn write_log(&self, path: &Path, contents: &[u8]) -> std::io::Result<()>;
}

/// Writes each log to its own file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLogSink;

impl LogSink for FileLogSink {
    fn write_log(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        fs::write(path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[test]
    fn write_json_creates_parents_and_trailing_newline() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a/b/doc.json");
        let doc = Doc {
            name: "x".into(),
            count: 2,
        };

        write_json(&path, &doc).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with("}\n"));
        assert!(raw.contains("  \"name\": \"x\""));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn read_json_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.json");
        let doc = Doc {
            name: "y".into(),
            count: 7,
        };
        write_json(&path, &doc).unwrap();

        let loaded: Doc = read_json(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn read_json_reports_path_on_bad_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();

        let err = read_json::<Doc>(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn now_utc_has_no_fraction() {
        let now = now_utc();
        assert_eq!(now.timestamp_subsec_nanos(), 0);
        assert!(now.to_rfc3339().ends_with("+00:00"));
    }

    #[test]
    fn file_log_sink_writes_bytes_verbatim() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("step.1.log");
        FileLogSink.write_log(&path, b"line one\nline two\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"line one\nline two\n");
    }
}
