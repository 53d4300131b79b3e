//! Messenger-facing abstractions: the delivery port, inbound bot updates and replies.

pub mod port;
pub mod throttled;
pub mod types;
