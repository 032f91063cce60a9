use std::fs::{self, OpenOptions};
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::*;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

#[derive(Debug, thiserror::Error)]
pub enum LogViewerError {
    #[error("log file {0} does not exist; start the server first")]
    Missing(PathBuf),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to launch {command}: {message}")]
    Launch { command: String, message: String },
}

impl LogViewerError {
    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::Missing(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Reads the whole log file, replacing invalid UTF-8.
pub fn read_all(path: &Path) -> Result<String, LogViewerError> {
    let bytes = fs::read(path).map_err(|err| LogViewerError::io(path, err))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Returns at most `count` trailing lines of the log file.
pub fn last_lines(path: &Path, count: usize) -> Result<Vec<String>, LogViewerError> {
    let contents = read_all(path)?;
    let lines: Vec<&str> = contents.lines().collect();
    let start = lines.len().saturating_sub(count);
    Ok(lines[start..].iter().map(|line| line.to_string()).collect())
}

/// Truncates the log file, creating it when missing.
pub fn clear(path: &Path) -> Result<(), LogViewerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| LogViewerError::io(parent, err))?;
    }
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|err| LogViewerError::io(path, err))?;
    Ok(())
}

/// Colours a log line by its level marker.
pub fn colorize(line: &str) -> ColoredString {
    if line.contains(" ERROR ") {
        line.red()
    } else if line.contains(" WARN ") {
        line.yellow()
    } else if line.contains(" DEBUG ") || line.contains(" TRACE ") {
        line.dimmed()
    } else {
        line.normal()
    }
}

pub fn print_lines<'a>(lines: impl IntoIterator<Item = &'a str>) {
    for line in lines {
        println!("{}", colorize(line));
    }
}

/// Incremental reader over a growing file.
///
/// Remembers how far it has read; when the file shrinks (cleared or rotated)
/// reading restarts from the beginning.
#[derive(Debug)]
pub struct LogFollower {
    path: PathBuf,
    offset: u64,
    pending: String,
}

impl LogFollower {
    /// Starts following at the current end of the file.
    pub fn at_end(path: &Path) -> Result<Self, LogViewerError> {
        let offset = fs::metadata(path)
            .map_err(|err| LogViewerError::io(path, err))?
            .len();
        Ok(Self {
            path: path.to_path_buf(),
            offset,
            pending: String::new(),
        })
    }

    /// Returns complete lines appended since the previous poll.
    pub async fn poll(&mut self) -> Result<Vec<String>, LogViewerError> {
        let len = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => 0,
            Err(err) => return Err(LogViewerError::io(&self.path, err)),
        };

        if len < self.offset {
            self.offset = 0;
            self.pending.clear();
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        let mut file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|err| LogViewerError::io(&self.path, err))?;
        file.seek(SeekFrom::Start(self.offset))
            .await
            .map_err(|err| LogViewerError::io(&self.path, err))?;
        let mut buf = Vec::new();
        let read = file
            .read_to_end(&mut buf)
            .await
            .map_err(|err| LogViewerError::io(&self.path, err))?;
        self.offset += read as u64;

        self.pending.push_str(&String::from_utf8_lossy(&buf));
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            lines.push(line.trim_end_matches(|c: char| c == '\n' || c == '\r').to_string());
        }
        Ok(lines)
    }
}

/// Prints the last `initial` lines, then prints appended lines until Ctrl-C.
pub async fn follow(path: &Path, initial: usize, interval: Duration) -> Result<(), LogViewerError> {
    let tail = last_lines(path, initial)?;
    print_lines(tail.iter().map(String::as_str));

    let mut follower = LogFollower::at_end(path)?;
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let lines = follower.poll().await?;
                print_lines(lines.iter().map(String::as_str));
            }
        }
    }
    Ok(())
}
