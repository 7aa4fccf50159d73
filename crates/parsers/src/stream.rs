use crate::claude_code::decode_line;
use crate::link::{ToolCallRecord, ToolLinker};
use anyhow::{Context, Result};
use serde::Serialize;
use sessiontree_core::{Message, ToolLink};
use std::path::Path;

/// Why a single line could not become a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    #[error("malformed line: {reason}")]
    Malformed { reason: String },
    #[error("unsupported `{entry_type}` line: {reason}")]
    UnsupportedShape { entry_type: String, reason: String },
}

/// A parse failure tagged with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("line {line}: {error}")]
pub struct LineError {
    pub line: usize,
    pub error: ParseError,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedBatch {
    pub messages: Vec<Message>,
    pub errors: Vec<LineError>,
}

/// Incremental parser for one conversation log.
///
/// Accepted messages are numbered in arrival order; that index is what
/// [`sessiontree_core::BlockRef`]s refer to. Rejected lines consume no index.
#[derive(Debug, Default, Clone)]
pub struct StreamParser {
    linker: ToolLinker,
    accepted: usize,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and link one raw line.
    pub fn parse_line(&mut self, raw: &str) -> Result<Message, ParseError> {
        let mut message = decode_line(raw)?;
        self.linker.link_message(self.accepted, &mut message);
        self.accepted += 1;
        Ok(message)
    }

    /// Streaming entry point: blank lines are not an error, just nothing.
    pub fn submit_line(&mut self, raw: &str) -> Result<Option<Message>, ParseError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        self.parse_line(raw).map(Some)
    }

    pub fn parse_batch<I, S>(&mut self, lines: I) -> ParsedBatch
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut batch = ParsedBatch::default();
        for (index, line) in lines.into_iter().enumerate() {
            match self.submit_line(line.as_ref()) {
                Ok(Some(message)) => batch.messages.push(message),
                Ok(None) => {}
                Err(error) => {
                    tracing::debug!("Skipping line {}: {}", index + 1, error);
                    batch.errors.push(LineError {
                        line: index + 1,
                        error,
                    });
                }
            }
        }
        batch
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted
    }

    pub fn links(&self) -> Vec<ToolLink> {
        self.linker.links()
    }

    pub fn tool_call(&self, id: &str) -> Option<&ToolCallRecord> {
        self.linker.tool_call(id)
    }

    pub fn linker(&self) -> &ToolLinker {
        &self.linker
    }
}

/// Parse a complete line sequence with a fresh parser.
pub fn parse_batch<I, S>(lines: I) -> ParsedBatch
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    StreamParser::new().parse_batch(lines)
}

/// Read and parse a whole log file.
pub fn parse_file(path: &Path) -> Result<ParsedBatch> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read conversation log: {}", path.display()))?;
    Ok(parse_batch(content.lines()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sessiontree_core::{BlockRef, ContentBlock, ResultLink};

    const CALL: &str = r#"{"type":"assistant","uuid":"a1","message":{"content":[{"type":"tool_use","id":"toolu_1","name":"Read","input":{"file_path":"/a.txt"}}]}}"#;
    const RESULT: &str = r#"{"type":"user","uuid":"u2","message":{"content":[{"type":"tool_result","tool_use_id":"toolu_1","content":"hello"}]}}"#;

    #[test]
    fn malformed_line_inside_batch() {
        let lines = [
            r#"{"type":"user","message":{"content":"hi"}}"#,
            CALL,
            "not json",
            RESULT,
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"done"}]}}"#,
        ];
        let batch = parse_batch(lines);
        assert_eq!(batch.messages.len(), 4);
        assert_eq!(batch.errors.len(), 1);
        assert_eq!(batch.errors[0].line, 3);
        assert!(matches!(batch.errors[0].error, ParseError::Malformed { .. }));
    }

    #[test]
    fn failed_line_leaves_state_untouched() {
        let mut parser = StreamParser::new();
        parser.parse_line(CALL).unwrap();
        assert!(parser.parse_line(r#"{"type":"summary"}"#).is_err());
        assert_eq!(parser.accepted_count(), 1);

        let message = parser.parse_line(RESULT).unwrap();
        let ContentBlock::ToolResult { link, .. } = &message.blocks[0] else {
            panic!("Expected ToolResult");
        };
        assert_eq!(
            link,
            &ResultLink::Resolved {
                call: BlockRef::new(0, 0),
                tool_name: "Read".to_string(),
            }
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut parser = StreamParser::new();
        assert_eq!(parser.submit_line("   ").unwrap(), None);
        let batch = parser.parse_batch(["", CALL, "\t"]);
        assert_eq!(batch.messages.len(), 1);
        assert!(batch.errors.is_empty());
        assert!(parser.parse_line("").is_err());
    }

    #[test]
    fn replaying_lines_gives_identical_linkage() {
        let lines = [CALL, RESULT];
        let first = parse_batch(lines);
        let second = parse_batch(lines);
        assert_eq!(first, second);
    }

    #[test]
    fn line_error_display_has_line_number() {
        let batch = parse_batch(["{}"]);
        assert_eq!(
            batch.errors[0].to_string(),
            "line 1: malformed line: missing string `type` field"
        );
    }
}
