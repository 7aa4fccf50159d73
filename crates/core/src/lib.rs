pub mod classification;
pub mod message;
pub mod session;
pub mod text;
pub mod validate;

pub use classification::*;
pub use message::*;
pub use session::{get_session_info, SessionInfo};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
