//! A tree that grows as a conversation log is appended to.

use crate::builder::{Placement, TreeBuilder};
use crate::node::ConversationTree;
use anyhow::Result;
use sessiontree_core::{Message, SessionInfo};
use sessiontree_parsers::{DataSource, LineError, ParseError, StreamParser};

/// Parser and tree kept in lockstep for one session.
pub struct LiveSession {
    parser: StreamParser,
    builder: TreeBuilder,
    messages: Vec<Message>,
    errors: Vec<LineError>,
    tree: ConversationTree,
    lines_seen: usize,
}

impl LiveSession {
    pub fn new(builder: TreeBuilder) -> Self {
        Self {
            parser: StreamParser::new(),
            builder,
            messages: Vec::new(),
            errors: Vec::new(),
            tree: ConversationTree::new(SessionInfo::default()),
            lines_seen: 0,
        }
    }

    /// Feed one raw line. Blank lines yield `Ok(None)`; rejected lines are
    /// recorded with their line number and returned.
    pub fn submit_line(&mut self, raw: &str) -> Result<Option<Placement>, ParseError> {
        self.lines_seen += 1;
        match self.parser.submit_line(raw) {
            Ok(Some(message)) => {
                let placement = self.builder.add_message(&mut self.tree, &message);
                self.messages.push(message);
                Ok(Some(placement))
            }
            Ok(None) => Ok(None),
            Err(error) => {
                tracing::debug!("Skipping line {}: {}", self.lines_seen, error);
                self.errors.push(LineError {
                    line: self.lines_seen,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// Pull whatever `source` has ready and place it.
    pub fn drain(&mut self, source: &mut dyn DataSource) -> Result<Vec<Placement>> {
        let lines = source.next_lines()?;
        if !lines.is_empty() {
            tracing::debug!("{}: {} new lines", source.name(), lines.len());
        }
        let mut placements = Vec::new();
        for line in &lines {
            if let Ok(Some(placement)) = self.submit_line(line) {
                placements.push(placement);
            }
        }
        Ok(placements)
    }

    pub fn tree(&self) -> &ConversationTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ConversationTree {
        &mut self.tree
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn errors(&self) -> &[LineError] {
        &self.errors
    }

    pub fn parser(&self) -> &StreamParser {
        &self.parser
    }

    /// Replace the tree with a full rebuild, keeping expanded flags.
    pub fn rebuild(&mut self) {
        self.tree = self.builder.rebuild(&self.tree, &self.messages);
    }
}
