//! # KBA Core
//!
//! Response normalization for the KB-Assist client.
//!
//! The backend returns loosely-typed JSON whose field names and shapes have
//! drifted over time. This crate maps each payload deterministically into the
//! entity types from `kba-types`, filling missing or renamed fields from a
//! prioritized list of alternate keys and synthesizing stable identifiers when
//! none are present.
//!
//! **No transport concerns**: HTTP, endpoints and error taxonomy belong in
//! `kba-client`.

pub mod normalize;

pub use normalize::{
    normalize_chat_response, normalize_message, normalize_messages, normalize_session,
    normalize_sessions, normalize_source, normalize_sources, normalize_web_results,
};
