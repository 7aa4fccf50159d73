pub mod claude_code;
pub mod link;
pub mod source;
pub mod stream;

pub use link::{ToolCallRecord, ToolLinker};
pub use source::{DataSource, StaticSource, TailSource};
pub use stream::{parse_batch, parse_file, LineError, ParseError, ParsedBatch, StreamParser};
