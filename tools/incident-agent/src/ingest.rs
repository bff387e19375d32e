use crate::errors::IncidentError;
use crate::runtime::FileSystem;
use std::path::Path;

pub const SAMPLE_LOGS: [&str; 5] = [
    "2025-02-22 10:00:01 - Server crashed due to overload.",
    "2025-02-22 10:05:43 - Database timeout on user request.",
    "2025-02-22 10:15:12 - Memory leak detected in process X.",
    "2025-02-22 10:30:00 - Web server experienced high latency.",
    "2025-02-22 10:45:00 - Another database timeout detected.",
];

pub fn sample_logs() -> Vec<String> {
    SAMPLE_LOGS.iter().map(|line| line.to_string()).collect()
}

/// One entry per non-blank line, in file order. Trailing `\r` is dropped.
pub fn parse_log_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_logs(fs: &dyn FileSystem, path: Option<&Path>) -> Result<Vec<String>, IncidentError> {
    match path {
        Some(path) => Ok(parse_log_lines(&fs.read_to_string(path)?)),
        None => Ok(sample_logs()),
    }
}
