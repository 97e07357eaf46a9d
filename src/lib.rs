//! goose-client - a streaming client for the Goose agent backend
//!
//! Sends chat requests, decodes the Server-Sent-Events reply incrementally
//! into typed [`sse::SseEvent`]s and delivers them to an
//! [`client::EventSink`]. See [`client::GooseClient`] for the entry point.

pub mod adapters;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod sse;
pub mod traits;
