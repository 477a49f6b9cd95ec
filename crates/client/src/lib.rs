//! # KBA Client
//!
//! Async transport client for the KB-Assist backend.
//!
//! One type, [`KbClient`], performs the wire operations of the chat protocol:
//! asking a question, listing persisted sessions, fetching a session
//! transcript, running a web search, and hitting the diagnostic probes. Each
//! operation is a single stateless request/response exchange; successful
//! payloads pass through the normalizer in `kba-core` before they reach the
//! caller, and failures surface as one [`ClientError`] with the best available
//! human-readable message.

pub mod client;
pub mod config;
pub mod error;

pub use client::{AskRequest, KbClient, Probe, DEFAULT_WEB_RESULTS};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
