//! Line sources feeding a parser: a finished log or a file still being written.

use anyhow::{Context, Result};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Something that yields raw log lines in order.
pub trait DataSource {
    /// Source name for logs (usually a path).
    fn name(&self) -> &str;

    /// Lines that became available since the last call. Empty means "nothing yet".
    fn next_lines(&mut self) -> Result<Vec<String>>;

    /// True once the source will never produce more lines.
    fn is_exhausted(&self) -> bool;
}

/// A fixed set of lines, handed out in one go.
pub struct StaticSource {
    name: String,
    lines: Option<Vec<String>>,
}

impl StaticSource {
    pub fn from_lines<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            lines: Some(lines.into_iter().map(Into::into).collect()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        Ok(Self::from_lines(
            path.display().to_string(),
            content.lines().map(str::to_string),
        ))
    }
}

impl DataSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_lines(&mut self) -> Result<Vec<String>> {
        Ok(self.lines.take().unwrap_or_default())
    }

    fn is_exhausted(&self) -> bool {
        self.lines.is_none()
    }
}

/// Follows a file that is being appended to.
///
/// Only complete (newline-terminated) lines are returned; a trailing partial
/// line stays unread until its newline arrives. If the file shrinks below
/// the read offset it is treated as replaced and read again from the start.
/// A log whose last line never gets a newline keeps that line unread.
pub struct TailSource {
    path: PathBuf,
    name: String,
    offset: u64,
}

impl TailSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self {
            path,
            name,
            offset: 0,
        }
    }

    /// Byte offset just past the last complete line handed out.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for TailSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_lines(&mut self) -> Result<Vec<String>> {
        let metadata = std::fs::metadata(&self.path)
            .with_context(|| format!("Cannot stat {}", self.path.display()))?;
        let file_size = metadata.len();

        // Detect file truncation (e.g., file was replaced)
        if file_size < self.offset {
            tracing::info!(
                "File truncated ({}B < {}B offset), resetting: {}",
                file_size,
                self.offset,
                self.path.display()
            );
            self.offset = 0;
        }

        if file_size == self.offset {
            return Ok(Vec::new());
        }

        let mut file = std::fs::File::open(&self.path)
            .with_context(|| format!("Cannot open {}", self.path.display()))?;
        file.seek(SeekFrom::Start(self.offset))
            .with_context(|| format!("Cannot seek in {}", self.path.display()))?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .with_context(|| format!("Cannot read {}", self.path.display()))?;

        let Some(last_newline) = buffer.iter().rposition(|&b| b == b'\n') else {
            return Ok(Vec::new());
        };
        let complete = &buffer[..=last_newline];
        self.offset += complete.len() as u64;

        Ok(complete
            .split(|&b| b == b'\n')
            .map(|line| String::from_utf8_lossy(line).trim_end_matches('\r').to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    fn is_exhausted(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn append(path: &Path, data: &str) {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .unwrap();
        file.write_all(data.as_bytes()).unwrap();
    }

    #[test]
    fn static_source_yields_once() {
        let mut source = StaticSource::from_lines("mem", ["a", "b"]);
        assert!(!source.is_exhausted());
        assert_eq!(source.next_lines().unwrap(), vec!["a", "b"]);
        assert!(source.is_exhausted());
        assert!(source.next_lines().unwrap().is_empty());
    }

    #[test]
    fn static_source_from_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StaticSource::from_path(&dir.path().join("nope.jsonl")).is_err());
    }

    #[test]
    fn tail_source_reads_incrementally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.jsonl");
        std::fs::write(&path, "{\"a\":1}\n").unwrap();

        let mut tail = TailSource::new(&path);
        assert_eq!(tail.next_lines().unwrap(), vec!["{\"a\":1}"]);
        assert!(tail.next_lines().unwrap().is_empty());

        append(&path, "{\"b\":2}\n{\"c\":3}\n");
        assert_eq!(tail.next_lines().unwrap(), vec!["{\"b\":2}", "{\"c\":3}"]);
        assert!(!tail.is_exhausted());
    }

    #[test]
    fn tail_source_holds_partial_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.jsonl");
        std::fs::write(&path, "{\"a\":1}\n{\"b\":").unwrap();

        let mut tail = TailSource::new(&path);
        assert_eq!(tail.next_lines().unwrap(), vec!["{\"a\":1}"]);
        assert_eq!(tail.offset(), 8);
        assert!(tail.next_lines().unwrap().is_empty());

        append(&path, "2}\r\n");
        assert_eq!(tail.next_lines().unwrap(), vec!["{\"b\":2}"]);
    }

    #[test]
    fn unterminated_last_line_is_not_emitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.jsonl");
        std::fs::write(&path, "{\"a\":1}\n{\"b\":2}").unwrap();

        let mut tail = TailSource::new(&path);
        assert_eq!(tail.next_lines().unwrap(), vec!["{\"a\":1}"]);
        assert!(tail.next_lines().unwrap().is_empty());
        assert!(tail.next_lines().unwrap().is_empty());
        assert_eq!(tail.offset(), 8);
    }

    #[test]
    fn tail_source_resets_on_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.jsonl");
        std::fs::write(&path, "{\"a\":1}\n{\"b\":2}\n{\"c\":3}\n").unwrap();
        let mut tail = TailSource::new(&path);
        let _ = tail.next_lines().unwrap();

        std::fs::write(&path, "{\"x\":1}\n").unwrap();
        assert_eq!(tail.next_lines().unwrap(), vec!["{\"x\":1}"]);
    }
}
