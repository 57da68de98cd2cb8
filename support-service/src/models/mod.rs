pub mod session;

pub use session::{ChatMessage, MessageRole, Session};
