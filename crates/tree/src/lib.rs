//! Conversation tree: session root, message nodes, tool calls with their
//! results nested underneath, and orphaned results kept visible.

mod builder;
mod label;
mod live;
mod node;

pub use builder::{Placement, TreeBuilder};
pub use live::LiveSession;
pub use node::{
    ConversationTree, KeyParseError, NodeKey, NodeKind, NodeLink, TreeDiagnostic, TreeNode, Walk,
};
