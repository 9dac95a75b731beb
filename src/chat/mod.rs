mod message;

pub use message::{ChatMessage, ClientFrame, ServerFrame};
