//! Parallel snapshot runner.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::{check_expected, parse_snapshot, regenerate};

/// Result of running a snapshot directory.
#[derive(Debug, Default)]
pub struct SnapshotSummary {
    pub passed: usize,
    /// `(path, reason)` per failure.
    pub failed: Vec<(PathBuf, String)>,
    /// Files rewritten in update mode.
    pub updated: Vec<PathBuf>,
}

impl SnapshotSummary {
    /// Whether every snapshot passed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run (or update) every `*.snap` file under `dir`.
///
/// A snapshot passes when the regenerated file text is byte-identical to
/// the file on disk and its `EXPECTED` assertion holds. With `update`,
/// stale files are rewritten instead of failing.
pub fn run_snapshots(dir: &Path, update: bool, filter: Option<&str>) -> SnapshotSummary {
    let mut paths: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "snap"))
            .filter(|path| {
                filter.is_none_or(|f| {
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.contains(f))
                })
            })
            .collect(),
        Err(e) => {
            return SnapshotSummary {
                passed: 0,
                failed: vec![(dir.to_path_buf(), format!("cannot read directory: {e}"))],
                updated: Vec::new(),
            }
        }
    };
    paths.sort();

    let results: Vec<(PathBuf, Result<bool, String>)> = paths
        .par_iter()
        .map(|path| (path.clone(), run_one(path, update)))
        .collect();

    let mut summary = SnapshotSummary::default();
    for (path, result) in results {
        match result {
            Ok(false) => summary.passed += 1,
            Ok(true) => {
                summary.updated.push(path);
                summary.passed += 1;
            }
            Err(reason) => summary.failed.push((path, reason)),
        }
    }
    summary
}

/// Run one snapshot. `Ok(true)` means the file was rewritten.
fn run_one(path: &Path, update: bool) -> Result<bool, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read: {e}"))?;
    let snapshot = parse_snapshot(&text).map_err(|e| e.to_string())?;
    let expected_text = regenerate(&snapshot);

    check_expected(&snapshot)?;

    if expected_text == text {
        return Ok(false);
    }
    if update {
        std::fs::write(path, expected_text).map_err(|e| format!("cannot write: {e}"))?;
        return Ok(true);
    }
    Err("generated sections are stale (run with --update to rewrite)".to_owned())
}
