mod chat;
mod conversation;
mod error;
mod message;

pub use chat::*;
pub use conversation::*;
pub use error::*;
pub use message::*;
