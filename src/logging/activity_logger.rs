// Activity logger: one JSONL record per transliteration, plus a file that
// always holds the latest output

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single logged transliteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Local time, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,

    #[serde(rename = "tamil_input")]
    pub input_text: String,

    /// Data source selector the examples came from
    #[serde(rename = "data_source")]
    pub source_id: String,

    #[serde(rename = "arwi_output", default, skip_serializing_if = "Option::is_none")]
    pub output_text: Option<String>,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogEntry {
    pub fn success(input: &str, source: &str, output: &str) -> Self {
        Self {
            timestamp: now(),
            input_text: input.to_string(),
            source_id: source.to_string(),
            output_text: Some(output.to_string()),
            success: true,
            error: None,
        }
    }

    pub fn failure(input: &str, source: &str, error: &str) -> Self {
        Self {
            timestamp: now(),
            input_text: input.to_string(),
            source_id: source.to_string(),
            output_text: None,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

fn now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Writes activity records. Never fails the caller: problems are reported
/// through `tracing` and, where possible, as an error record in the log.
#[derive(Debug, Clone)]
pub struct ActivityLogger {
    log_path: PathBuf,
    output_path: Option<PathBuf>,
}

impl ActivityLogger {
    pub fn new(log_path: impl Into<PathBuf>, output_path: Option<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            output_path,
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Log a successful transliteration and overwrite the latest-output file
    pub fn record_success(&self, input: &str, source: &str, output: &str) {
        let entry = LogEntry::success(input, source, output);
        if let Err(e) = self.append(&entry) {
            warn!("Error logging data: {:#}", e);
            self.append_best_effort(LogEntry::failure(input, source, &format!("{:#}", e)));
            return;
        }

        if let Some(path) = &self.output_path {
            if let Err(e) = write_output(path, output) {
                warn!("Error writing to output file: {:#}", e);
            }
        }

        debug!("Logged transliteration: {} -> {}", input, output);
    }

    /// Log a failed transliteration. The latest-output file is left alone.
    pub fn record_failure(&self, input: &str, source: &str, error: &str) {
        self.append_best_effort(LogEntry::failure(input, source, error));
    }

    /// Most recent `limit` entries, oldest first. Unparseable lines are skipped.
    ///
    /// Only the tail of the file is read, so cost tracks `limit` rather than
    /// the size of the log.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        if limit == 0 {
            return Vec::new();
        }

        let lines = match tail_lines(&self.log_path, limit) {
            Ok(lines) => lines,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Error reading logs from {}: {}", self.log_path.display(), e);
                return Vec::new();
            }
        };

        lines
            .iter()
            .filter_map(|line| serde_json::from_str(line.trim()).ok())
            .collect()
    }

    fn append(&self, entry: &LogEntry) -> Result<()> {
        ensure_parent(&self.log_path)?;

        let mut line = serde_json::to_string(entry).context("Failed to serialize log entry")?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open log file: {}", self.log_path.display()))?;

        // One write per record keeps concurrent appends line-atomic.
        file.write_all(line.as_bytes())
            .context("Failed to write log entry")?;
        Ok(())
    }

    fn append_best_effort(&self, entry: LogEntry) {
        if let Err(e) = self.append(&entry) {
            debug!("Dropping log entry, log file unwritable: {:#}", e);
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

const TAIL_BLOCK: u64 = 8 * 1024;

/// Last `limit` non-blank lines of `path`, read backwards in blocks
fn tail_lines(path: &Path, limit: usize) -> std::io::Result<Vec<String>> {
    let mut file = File::open(path)?;
    let mut pos = file.metadata()?.len();
    let mut buf: Vec<u8> = Vec::new();

    while pos > 0 && complete_lines(&buf) < limit {
        let step = TAIL_BLOCK.min(pos);
        pos -= step;
        file.seek(SeekFrom::Start(pos))?;
        let mut block = vec![0u8; step as usize];
        file.read_exact(&mut block)?;
        block.extend_from_slice(&buf);
        buf = block;
    }

    // Unless we reached the start of the file, the first line may be cut.
    let body = if pos == 0 {
        &buf[..]
    } else {
        after_first_newline(&buf)
    };

    let text = String::from_utf8_lossy(body);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(limit);
    Ok(lines[start..].iter().map(|l| l.to_string()).collect())
}

/// Non-blank lines in `buf` after its (possibly partial) first line
fn complete_lines(buf: &[u8]) -> usize {
    after_first_newline(buf)
        .split(|&b| b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .count()
}

fn after_first_newline(buf: &[u8]) -> &[u8] {
    match buf.iter().position(|&b| b == b'\n') {
        Some(i) => &buf[i + 1..],
        None => &[],
    }
}

fn write_output(path: &Path, output: &str) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, output)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger_in_tempdir() -> (ActivityLogger, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let logger = ActivityLogger::new(
            dir.path().join("logs").join("output.log"),
            Some(dir.path().join("out").join("temp_output.txt")),
        );
        (logger, dir)
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        if !path.exists() {
            return Vec::new();
        }
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).expect("valid JSON line"))
            .collect()
    }

    // ── success records ───────────────────────────────────────────────────────

    #[test]
    fn test_success_creates_dirs_and_appends_one_line() {
        let (logger, _dir) = logger_in_tempdir();
        logger.record_success("வணக்கம்", "csv", "وَنَكَّمْ");

        let lines = read_lines(logger.log_path());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["tamil_input"], "வணக்கம்");
        assert_eq!(lines[0]["data_source"], "csv");
        assert_eq!(lines[0]["arwi_output"], "وَنَكَّمْ");
        assert_eq!(lines[0]["success"], true);
        assert!(lines[0].get("error").is_none());
    }

    #[test]
    fn test_output_file_is_overwritten() {
        let (logger, _dir) = logger_in_tempdir();
        logger.record_success("a", "csv", "first");
        logger.record_success("b", "csv", "second");

        let output = fs::read_to_string(logger.output_path().unwrap()).unwrap();
        assert_eq!(output, "second");
        assert_eq!(read_lines(logger.log_path()).len(), 2);
    }

    #[test]
    fn test_non_ascii_is_written_unescaped() {
        let (logger, _dir) = logger_in_tempdir();
        logger.record_success("வணக்கம்", "google_sheet", "وَنَكَّمْ");
        let raw = fs::read_to_string(logger.log_path()).unwrap();
        assert!(raw.contains("வணக்கம்"));
        assert!(!raw.contains("\\u"));
    }

    #[test]
    fn test_timestamp_format() {
        let entry = LogEntry::success("a", "csv", "b");
        // e.g. "2026-10-17 14:03:59"
        assert_eq!(entry.timestamp.len(), 19, "got: {}", entry.timestamp);
        assert!(chrono::NaiveDateTime::parse_from_str(&entry.timestamp, TIMESTAMP_FORMAT).is_ok());
    }

    // ── failure records ───────────────────────────────────────────────────────

    #[test]
    fn test_failure_record_leaves_output_untouched() {
        let (logger, _dir) = logger_in_tempdir();
        logger.record_failure("வணக்கம்", "csv", "Failed to load data");

        let lines = read_lines(logger.log_path());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["success"], false);
        assert_eq!(lines[0]["error"], "Failed to load data");
        assert!(lines[0].get("arwi_output").is_none());
        assert!(!logger.output_path().unwrap().exists());
    }

    #[test]
    fn test_unwritable_log_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the log file should be makes every append fail.
        let log_path = dir.path().join("output.log");
        fs::create_dir_all(&log_path).unwrap();
        let logger = ActivityLogger::new(&log_path, Some(dir.path().join("out.txt")));

        logger.record_success("a", "csv", "b");
        logger.record_failure("a", "csv", "boom");

        assert!(log_path.is_dir());
        assert!(!dir.path().join("out.txt").exists());
    }

    #[test]
    fn test_unwritable_output_file_still_logs_success() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("temp_output.txt");
        fs::create_dir_all(&output_path).unwrap();
        let logger = ActivityLogger::new(dir.path().join("output.log"), Some(output_path));

        logger.record_success("a", "csv", "b");

        let lines = read_lines(logger.log_path());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["success"], true);
    }

    // ── reading back ──────────────────────────────────────────────────────────

    #[test]
    fn test_recent_returns_last_entries_in_order() {
        let (logger, _dir) = logger_in_tempdir();
        for i in 0..5 {
            logger.record_success(&format!("in{i}"), "csv", &format!("out{i}"));
        }

        let recent = logger.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].input_text, "in3");
        assert_eq!(recent[1].output_text.as_deref(), Some("out4"));
        assert_eq!(logger.recent(100).len(), 5);
    }

    #[test]
    fn test_recent_skips_malformed_lines() {
        let (logger, _dir) = logger_in_tempdir();
        logger.record_success("a", "csv", "b");
        let mut file = OpenOptions::new()
            .append(true)
            .open(logger.log_path())
            .unwrap();
        writeln!(file, "not json").unwrap();
        logger.record_failure("c", "csv", "boom");

        let recent = logger.recent(10);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].success);
        assert!(!recent[1].success);
    }

    #[test]
    fn test_recent_reads_tail_of_large_log() {
        let (logger, _dir) = logger_in_tempdir();
        // Enough records to span many read blocks.
        for i in 0..2000 {
            logger.record_success(&format!("வணக்கம் {i}"), "csv", &format!("out{i}"));
        }

        let recent = logger.recent(3);
        let outputs: Vec<_> = recent
            .iter()
            .map(|e| e.output_text.clone().unwrap())
            .collect();
        assert_eq!(outputs, vec!["out1997", "out1998", "out1999"]);
        assert_eq!(logger.recent(1500).len(), 1500);
        assert_eq!(logger.recent(5000).len(), 2000);
        assert!(logger.recent(0).is_empty());
    }

    #[test]
    fn test_tail_lines_handles_block_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.log");
        let long = "ழ".repeat(5000);
        fs::write(&path, format!("first\n{long}\n\nlast\n")).unwrap();

        assert_eq!(tail_lines(&path, 1).unwrap(), vec!["last".to_string()]);
        assert_eq!(tail_lines(&path, 2).unwrap(), vec![long.clone(), "last".to_string()]);
        assert_eq!(
            tail_lines(&path, 10).unwrap(),
            vec!["first".to_string(), long, "last".to_string()]
        );
    }

    #[test]
    fn test_recent_on_missing_file_is_empty() {
        let (logger, _dir) = logger_in_tempdir();
        assert!(logger.recent(10).is_empty());
    }
}
