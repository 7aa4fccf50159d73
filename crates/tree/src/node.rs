use serde::{Deserialize, Serialize};
use serde_json::Value;
use sessiontree_core::validate::ValidationError;
use sessiontree_core::{ClassificationResult, LinkError, SessionInfo};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Stable node identity: a pure function of message and block position.
///
/// Renders as `session`, `m{i}` or `m{i}.b{j}`. Ordering follows the
/// conversation: `m3` < `m3.b0` < `m3.b1` < `m4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum NodeKey {
    Session,
    Message(usize),
    Block { message: usize, block: usize },
}

impl NodeKey {
    pub fn block(message: usize, block: usize) -> Self {
        Self::Block { message, block }
    }

    /// Index of the message this key belongs to.
    pub fn message(&self) -> Option<usize> {
        match self {
            Self::Session => None,
            Self::Message(message) | Self::Block { message, .. } => Some(*message),
        }
    }

    fn sort_key(&self) -> (usize, usize, usize) {
        match *self {
            Self::Session => (0, 0, 0),
            Self::Message(message) => (1, message, 0),
            Self::Block { message, block } => (1, message, block + 1),
        }
    }
}

impl Ord for NodeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for NodeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => f.write_str("session"),
            Self::Message(message) => write!(f, "m{message}"),
            Self::Block { message, block } => write!(f, "m{message}.b{block}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid node key `{0}`")]
pub struct KeyParseError(String);

impl FromStr for NodeKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "session" {
            return Ok(Self::Session);
        }
        let err = || KeyParseError(s.to_string());
        let rest = s.strip_prefix('m').ok_or_else(err)?;
        match rest.split_once(".b") {
            Some((message, block)) => Ok(Self::Block {
                message: message.parse().map_err(|_| err())?,
                block: block.parse().map_err(|_| err())?,
            }),
            None => Ok(Self::Message(rest.parse().map_err(|_| err())?)),
        }
    }
}

impl From<NodeKey> for String {
    fn from(key: NodeKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for NodeKey {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    SessionRoot,
    Message,
    ToolCall,
    ToolResult,
    TextLeaf,
}

/// Link state shown on tool nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NodeLink {
    /// Tool call with no result yet.
    AwaitingResult,
    /// Tool call with at least one result nested under it.
    Answered,
    ResultOf { call: NodeKey },
    Orphaned(LinkError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub key: NodeKey,
    pub label: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationResult>,
    pub expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<NodeLink>,
}

impl TreeNode {
    /// A node with no classified payload (root, message).
    pub fn structural(key: NodeKey, label: String, kind: NodeKind, expanded: bool) -> Self {
        Self {
            key,
            label,
            kind,
            children: Vec::new(),
            classification: None,
            expanded,
            link: None,
        }
    }

    pub fn find(&self, key: NodeKey) -> Option<&TreeNode> {
        if self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(key))
    }

    pub fn find_mut(&mut self, key: NodeKey) -> Option<&mut TreeNode> {
        if self.key == key {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(key))
    }

    fn apply_expanded(&mut self, flags: &HashMap<NodeKey, bool>) {
        if let Some(expanded) = flags.get(&self.key) {
            self.expanded = *expanded;
        }
        for child in &mut self.children {
            child.apply_expanded(flags);
        }
    }
}

/// First tool call seen for an id.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CallSite {
    pub(crate) key: NodeKey,
    pub(crate) tool_name: String,
    pub(crate) input: Value,
}

/// A message that was left out of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeDiagnostic {
    pub message_index: usize,
    pub error: ValidationError,
}

/// The renderable tree for one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTree {
    pub(crate) root: TreeNode,
    pub(crate) info: SessionInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) diagnostics: Vec<TreeDiagnostic>,
    #[serde(skip)]
    pub(crate) calls: HashMap<String, CallSite>,
    #[serde(skip)]
    pub(crate) next_index: usize,
}

impl ConversationTree {
    /// Empty tree, ready for incremental placement.
    pub fn new(info: SessionInfo) -> Self {
        let root = TreeNode::structural(NodeKey::Session, info.label(), NodeKind::SessionRoot, true);
        Self {
            root,
            info,
            diagnostics: Vec::new(),
            calls: HashMap::new(),
            next_index: 0,
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn diagnostics(&self) -> &[TreeDiagnostic] {
        &self.diagnostics
    }

    /// Messages consumed so far, including skipped ones.
    pub fn message_count(&self) -> usize {
        self.next_index
    }

    pub fn find(&self, key: NodeKey) -> Option<&TreeNode> {
        self.root.find(key)
    }

    pub fn find_mut(&mut self, key: NodeKey) -> Option<&mut TreeNode> {
        self.root.find_mut(key)
    }

    /// Returns false when no node has `key`.
    pub fn set_expanded(&mut self, key: NodeKey, expanded: bool) -> bool {
        match self.find_mut(key) {
            Some(node) => {
                node.expanded = expanded;
                true
            }
            None => false,
        }
    }

    /// Flip a node's expanded flag; returns the new value.
    pub fn toggle(&mut self, key: NodeKey) -> Option<bool> {
        let node = self.find_mut(key)?;
        node.expanded = !node.expanded;
        Some(node.expanded)
    }

    /// Depth-first traversal of every node with its depth (root = 0).
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, &self.root)],
            respect_expanded: false,
        }
    }

    /// Depth-first rows a renderer shows: children of collapsed nodes are skipped.
    pub fn visible_rows(&self) -> Vec<(usize, &TreeNode)> {
        Walk {
            stack: vec![(0, &self.root)],
            respect_expanded: true,
        }
        .collect()
    }

    pub(crate) fn apply_expanded(&mut self, flags: &HashMap<NodeKey, bool>) {
        self.root.apply_expanded(flags);
    }

    pub(crate) fn relabel_root(&mut self) -> bool {
        let label = self.info.label();
        if self.root.label == label {
            return false;
        }
        self.root.label = label;
        true
    }
}

pub struct Walk<'a> {
    stack: Vec<(usize, &'a TreeNode)>,
    respect_expanded: bool,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        if !self.respect_expanded || node.expanded {
            self.stack
                .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        }
        Some((depth, node))
    }
}
