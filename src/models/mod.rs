//! Records exchanged with the Goose backend.

mod message;
mod request;

pub use message::{Message, Role, TokenState};
pub use request::ChatRequest;
