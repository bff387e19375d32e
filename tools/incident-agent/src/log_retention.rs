use crate::errors::IncidentError;
use std::fs;
use std::path::{Path, PathBuf};

/// Deletes the oldest run logs in `dir` until their total size fits `budget_bytes`.
///
/// Only `.jsonl` files named after the active log (`run.jsonl`, `run-1.jsonl`,
/// `run.2024-01-01.jsonl`) count as run logs; anything else in the directory is
/// neither measured nor removed. The active log file is never removed.
pub fn enforce_total_budget(
    dir: &Path,
    budget_bytes: u64,
    active: &Path,
) -> Result<Vec<PathBuf>, IncidentError> {
    let Some(prefix) = active.file_stem().and_then(|stem| stem.to_str()) else {
        return Ok(Vec::new());
    };
    let mut files = fs::read_dir(dir)
        .map_err(|e| IncidentError::Io(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| is_run_log(path, prefix))
        .collect::<Vec<_>>();

    files.sort_by(|a, b| {
        let ma = fs::metadata(a).ok().and_then(|m| m.modified().ok());
        let mb = fs::metadata(b).ok().and_then(|m| m.modified().ok());
        ma.cmp(&mb)
    });

    let mut total = files
        .iter()
        .filter_map(|path| fs::metadata(path).ok().map(|meta| meta.len()))
        .sum::<u64>();

    let mut deleted = Vec::new();
    for path in files {
        if total <= budget_bytes {
            break;
        }
        if path == active {
            continue;
        }
        let len = fs::metadata(&path)
            .map_err(|e| IncidentError::Io(e.to_string()))?
            .len();
        fs::remove_file(&path).map_err(|e| IncidentError::Io(e.to_string()))?;
        total = total.saturating_sub(len);
        deleted.push(path);
    }

    Ok(deleted)
}

fn is_run_log(path: &Path, prefix: &str) -> bool {
    path.extension().is_some_and(|ext| ext == "jsonl")
        && path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.strip_prefix(prefix))
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['-', '.', '_']))
}
