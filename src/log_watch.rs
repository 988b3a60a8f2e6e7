//! Emulator log following
//!
//! The monitor's `logFile @path` command copies the emulator log to a file.
//! [`LogWatcher`] follows that file and waits for a line matching a
//! [`LogPattern`]. Reading never touches the monitor session, so waiting on
//! the log does not hold up keyword calls.
//!
//! The watcher keeps a read offset. A successful wait consumes the log up to
//! and including the matching line, so the next wait only sees newer output.

use regex::Regex;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;

use crate::ansi::strip_ansi;
use crate::error::{Error, Result};

/// How often the log file is re-read while waiting
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What to look for in a log line
#[derive(Debug, Clone)]
pub enum LogPattern {
    /// Plain substring
    Text(String),
    /// Regex searched anywhere in the line
    Regex(Regex),
}

impl LogPattern {
    pub fn new(pattern: &str, is_regex: bool) -> Result<Self> {
        if !is_regex {
            return Ok(LogPattern::Text(pattern.to_string()));
        }
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(LogPattern::Regex(regex))
    }

    pub fn matches(&self, line: &str) -> bool {
        match self {
            LogPattern::Text(text) => line.contains(text.as_str()),
            LogPattern::Regex(regex) => regex.is_match(line),
        }
    }
}

/// Follows one log file
#[derive(Debug)]
pub struct LogWatcher {
    path: PathBuf,
    offset: Mutex<u64>,
    poll_interval: Duration,
}

impl LogWatcher {
    /// Watch `path` from its beginning
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: Mutex::new(0),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ignore everything already in the file
    pub async fn skip_to_end(&self) -> Result<()> {
        let len = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(self.read_failed(e)),
        };
        *self.offset.lock().await = len;
        debug!("Following {} from byte {}", self.path.display(), len);
        Ok(())
    }

    /// Wait until a new log line matches `pattern`.
    ///
    /// Returns `Ok(false)` when `timeout` runs out first. With no timeout
    /// the wait only ends on a match or a read error. A missing file counts
    /// as an empty log.
    pub async fn wait_for(&self, pattern: &LogPattern, timeout: Option<Duration>) -> Result<bool> {
        let mut offset = self.offset.lock().await;
        let scan = self.scan(&mut offset, pattern);

        match timeout {
            None => scan.await,
            Some(limit) => match tokio::time::timeout(limit, scan).await {
                Ok(found) => found,
                Err(_) => {
                    debug!("No match for {:?} in {} within {:?}", pattern, self.path.display(), limit);
                    Ok(false)
                }
            },
        }
    }

    async fn scan(&self, offset: &mut u64, pattern: &LogPattern) -> Result<bool> {
        loop {
            let chunk = self.read_new(offset).await?;

            let mut consumed = 0;
            while let Some(end) = chunk[consumed..].iter().position(|&b| b == b'\n') {
                let line = String::from_utf8_lossy(&chunk[consumed..consumed + end]);
                consumed += end + 1;

                let line = strip_ansi(&line);
                if pattern.matches(line.trim_end_matches('\r')) {
                    *offset += consumed as u64;
                    trace!("Log match: {:?}", line);
                    return Ok(true);
                }
            }
            // A trailing partial line is read again once it is complete
            *offset += consumed as u64;

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn read_new(&self, offset: &mut u64) -> Result<Vec<u8>> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.read_failed(e)),
        };

        let len = file.metadata().await.map_err(|e| self.read_failed(e))?.len();
        if len < *offset {
            debug!("{} was truncated, reading from the start", self.path.display());
            *offset = 0;
        }

        file.seek(SeekFrom::Start(*offset))
            .await
            .map_err(|e| self.read_failed(e))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .await
            .map_err(|e| self.read_failed(e))?;
        Ok(buf)
    }

    fn read_failed(&self, e: std::io::Error) -> Error {
        Error::LogReadFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }
}
