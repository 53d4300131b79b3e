//! Core domain + application logic for the webhook relay.
//!
//! This crate is intentionally framework-agnostic. Telegram, HTTP and SQLite live behind
//! ports (traits) implemented in adapter crates.

pub mod chat;
pub mod commands;
pub mod company;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod registration;
pub mod routing;
pub mod security;
pub mod utils;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
