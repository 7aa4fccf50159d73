//! Content classification: decides how each payload in a conversation tree
//! should be displayed (inline, popup, and which popup flavor).

mod classifier;
pub mod detect;

pub use classifier::{ClassificationContext, ContentClassifier};
pub use detect::{infer_tool_kind, ToolKind};
