//! Defensive normalization of backend payloads.
//!
//! Every function in this module is total: malformed input degrades the data
//! (fields fall back to documented defaults), it never fails the call. The
//! repeated pattern is an ordered list of candidate key paths per field,
//! evaluated in priority order; the first candidate holding a string wins.

use kba_types::{
    AccessLevel, ChatMessage, ChatResponse, ChatSession, MessageRole, Source, WebSearchResult,
};
use serde_json::{Map, Value};

/// Prefix of identifiers synthesized for sources the backend sent without one.
const SYNTHETIC_ID_PREFIX: &str = "source";

/// Keys consumed by [`normalize_source`]. Everything else in the raw object is
/// kept as pass-through in [`Source::extra`].
const NORMALIZED_SOURCE_KEYS: &[&str] = &[
    "id",
    "title",
    "section",
    "source",
    "accessLevel",
    "snippet",
    "fullText",
];

/// Walk a key path into a JSON value.
fn lookup<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = raw;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// First candidate path resolving to a string wins. A present field of the
/// wrong type is treated as absent, so the next candidate still gets a turn.
fn pick_str(raw: &Value, paths: &[&[&str]]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| lookup(raw, path).and_then(Value::as_str).map(str::to_owned))
}

fn opt_str(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// Non-cryptographic 32-bit string hash (`h = h * 31 + c` with wraparound).
///
/// Collision-tolerant but not collision-free; adequate for a display key,
/// never to be used for deduplication or anything security-relevant.
fn hash_code(input: &str) -> u32 {
    let mut hash: i32 = 0;
    for c in input.chars() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(c as i32);
    }
    hash.unsigned_abs()
}

/// Deterministic fallback id for a source: fixed prefix, position in the
/// response, and a hash of the raw value's serialized form.
fn synthetic_id(raw: &Value, index: usize) -> String {
    format!("{SYNTHETIC_ID_PREFIX}-{index}-{}", hash_code(&raw.to_string()))
}

/// Normalize one raw source object into a well-formed [`Source`].
///
/// Resolution order per field (first match wins):
/// - id: explicit `id` (trimmed, non-empty), else synthetic
/// - title: `title`, `metadata.title`, else `"Source"`
/// - section: `section`, `metadata.section`, `metadata.heading`
/// - source: `source`, `url`, `metadata.source`, `metadata.path`
/// - access level: `accessLevel`, `access_level`, metadata equivalents;
///   only the lower-cased literal `"public"` is public, anything else is
///   internal (fail-closed)
/// - snippet: `snippet`, `metadata.snippet`, `metadata.text`
/// - full text: `fullText`, `full_text`, `metadata.fullText`, `metadata.text`,
///   else the resolved snippet
pub fn normalize_source(raw: &Value, index: usize) -> Source {
    let id = opt_str(raw, "id")
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| synthetic_id(raw, index));

    let title = pick_str(raw, &[&["title"], &["metadata", "title"]])
        .unwrap_or_else(|| "Source".to_owned());

    let section = pick_str(
        raw,
        &[
            &["section"],
            &["metadata", "section"],
            &["metadata", "heading"],
        ],
    )
    .unwrap_or_default();

    let source = pick_str(
        raw,
        &[
            &["source"],
            &["url"],
            &["metadata", "source"],
            &["metadata", "path"],
        ],
    )
    .unwrap_or_default();

    let access_level = pick_str(
        raw,
        &[
            &["accessLevel"],
            &["access_level"],
            &["metadata", "accessLevel"],
            &["metadata", "access_level"],
        ],
    )
    .map(|value| {
        if value.to_lowercase() == "public" {
            AccessLevel::Public
        } else {
            AccessLevel::Internal
        }
    })
    .unwrap_or(AccessLevel::Internal);

    let snippet = pick_str(
        raw,
        &[
            &["snippet"],
            &["metadata", "snippet"],
            &["metadata", "text"],
        ],
    )
    .unwrap_or_default();

    let full_text = pick_str(
        raw,
        &[
            &["fullText"],
            &["full_text"],
            &["metadata", "fullText"],
            &["metadata", "text"],
        ],
    )
    .unwrap_or_else(|| snippet.clone());

    let extra: Map<String, Value> = match raw.as_object() {
        Some(object) => object
            .iter()
            .filter(|(key, _)| !NORMALIZED_SOURCE_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        None => Map::new(),
    };

    Source {
        id,
        title,
        section,
        source,
        access_level,
        snippet,
        full_text,
        extra,
    }
}

/// Normalize a raw `sources` value. Non-array input yields an empty list.
pub fn normalize_sources(raw: &Value) -> Vec<Source> {
    match raw.as_array() {
        Some(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| normalize_source(item, index))
            .collect(),
        None => Vec::new(),
    }
}

fn string_seq(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect()
    })
}

/// A string field that only counts when present and non-empty.
fn truthy_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

/// Normalize the body of a successful `/api/chat` response.
///
/// `follow_up_questions` falls back to the alternate wire key `follow_ups`;
/// session id/title are carried through only when present and non-empty.
pub fn normalize_chat_response(body: &Value) -> ChatResponse {
    ChatResponse {
        answer: opt_str(body, "answer").unwrap_or_default(),
        sources: normalize_sources(body.get("sources").unwrap_or(&Value::Null)),
        follow_up_questions: string_seq(body.get("follow_up_questions"))
            .or_else(|| string_seq(body.get("follow_ups")))
            .unwrap_or_default(),
        chat_session_id: truthy_str(body.get("chat_session_id")),
        chat_session_title: truthy_str(body.get("chat_session_title")),
    }
}

/// Normalize one session summary record.
pub fn normalize_session(raw: &Value) -> ChatSession {
    ChatSession {
        id: opt_str(raw, "id").unwrap_or_default(),
        title: opt_str(raw, "title").unwrap_or_else(|| "New chat".to_owned()),
        preview: opt_str(raw, "preview").unwrap_or_default(),
        updated_at: opt_str(raw, "updated_at"),
    }
}

/// Normalize a session-list body. Non-array bodies yield an empty list.
pub fn normalize_sessions(body: &Value) -> Vec<ChatSession> {
    match body.as_array() {
        Some(items) => items.iter().map(normalize_session).collect(),
        None => {
            tracing::warn!("session list response was not an array, dropping it");
            Vec::new()
        }
    }
}

/// Normalize one transcript entry. Only the exact literal `"assistant"` maps
/// to the assistant role; every other value is a user turn.
pub fn normalize_message(raw: &Value) -> ChatMessage {
    let role = match raw.get("role").and_then(Value::as_str) {
        Some("assistant") => MessageRole::Assistant,
        _ => MessageRole::User,
    };

    ChatMessage {
        id: opt_str(raw, "id").unwrap_or_default(),
        role,
        content: opt_str(raw, "content").unwrap_or_default(),
        created_at: opt_str(raw, "created_at"),
    }
}

/// Normalize a session-transcript body. Non-array bodies yield an empty list.
pub fn normalize_messages(body: &Value) -> Vec<ChatMessage> {
    match body.as_array() {
        Some(items) => items.iter().map(normalize_message).collect(),
        None => {
            tracing::warn!("session transcript response was not an array, dropping it");
            Vec::new()
        }
    }
}

/// Normalize a web-search body: either a bare array of results or an object
/// wrapping them under `results`. Anything else yields an empty list.
pub fn normalize_web_results(body: &Value) -> Vec<WebSearchResult> {
    let items = body
        .as_array()
        .or_else(|| body.get("results").and_then(Value::as_array));

    match items {
        Some(items) => items
            .iter()
            .map(|item| WebSearchResult {
                title: opt_str(item, "title").unwrap_or_default(),
                link: opt_str(item, "link").unwrap_or_default(),
                snippet: opt_str(item, "snippet"),
            })
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn synthetic_id_is_deterministic_and_non_empty() {
        let raw = json!({"title": "Handbook", "snippet": "annual leave"});
        let first = normalize_source(&raw, 3);
        let second = normalize_source(&raw, 3);

        assert!(!first.id.is_empty());
        assert_eq!(first.id, second.id);
        assert!(first.id.starts_with("source-3-"));

        // A different position produces a different display key.
        let shifted = normalize_source(&raw, 4);
        assert_ne!(first.id, shifted.id);
    }

    #[test]
    fn explicit_id_is_trimmed_and_wins_over_synthesis() {
        let raw = json!({"id": "  doc-7  "});
        assert_eq!(normalize_source(&raw, 0).id, "doc-7");

        // Whitespace-only ids are treated as absent.
        let blank = json!({"id": "   "});
        assert!(normalize_source(&blank, 0).id.starts_with("source-0-"));
    }

    #[test]
    fn access_level_fails_closed() {
        let cases = [
            (json!({"accessLevel": "public"}), AccessLevel::Public),
            (json!({"accessLevel": "pUbLic"}), AccessLevel::Public),
            (json!({"access_level": "public"}), AccessLevel::Public),
            (json!({"metadata": {"access_level": "public"}}), AccessLevel::Public),
            (json!({"accessLevel": "Public "}), AccessLevel::Internal),
            (json!({"accessLevel": "unknown"}), AccessLevel::Internal),
            (json!({"accessLevel": 7}), AccessLevel::Internal),
            (json!({}), AccessLevel::Internal),
        ];

        for (raw, expected) in cases {
            assert_eq!(normalize_source(&raw, 0).access_level, expected, "raw: {raw}");
        }
    }

    #[test]
    fn non_array_sources_normalize_to_empty() {
        assert!(normalize_sources(&Value::Null).is_empty());
        assert!(normalize_sources(&json!({})).is_empty());
        assert!(normalize_sources(&json!("sources")).is_empty());
    }

    #[test]
    fn empty_object_source_gets_all_defaults() {
        let sources = normalize_sources(&json!([{}]));
        assert_eq!(sources.len(), 1);

        let source = &sources[0];
        assert!(source.id.starts_with("source-0-"));
        assert_eq!(source.title, "Source");
        assert_eq!(source.section, "");
        assert_eq!(source.source, "");
        assert_eq!(source.access_level, AccessLevel::Internal);
        assert_eq!(source.snippet, "");
        assert_eq!(source.full_text, "");
        assert!(source.extra.is_empty());
    }

    #[test]
    fn fully_populated_canonical_input_round_trips_losslessly() {
        let raw = json!({
            "id": "doc-42",
            "title": "Expense policy",
            "section": "Travel",
            "source": "https://kb.example.com/expenses",
            "accessLevel": "public",
            "snippet": "Flights must be booked",
            "fullText": "Flights must be booked two weeks ahead."
        });

        let source = normalize_source(&raw, 0);
        assert_eq!(source.id, "doc-42");
        assert_eq!(source.title, "Expense policy");
        assert_eq!(source.section, "Travel");
        assert_eq!(source.source, "https://kb.example.com/expenses");
        assert_eq!(source.access_level, AccessLevel::Public);
        assert_eq!(source.snippet, "Flights must be booked");
        assert_eq!(source.full_text, "Flights must be booked two weeks ahead.");
        assert!(source.extra.is_empty());
    }

    #[test]
    fn metadata_fallbacks_fill_renamed_fields() {
        let raw = json!({
            "metadata": {
                "title": "Onboarding",
                "heading": "Week one",
                "path": "docs/onboarding.md",
                "text": "Welcome aboard."
            }
        });

        let source = normalize_source(&raw, 0);
        assert_eq!(source.title, "Onboarding");
        assert_eq!(source.section, "Week one");
        assert_eq!(source.source, "docs/onboarding.md");
        assert_eq!(source.snippet, "Welcome aboard.");
        assert_eq!(source.full_text, "Welcome aboard.");
    }

    #[test]
    fn full_text_falls_back_to_resolved_snippet() {
        let raw = json!({"snippet": "just the excerpt"});
        let source = normalize_source(&raw, 0);
        assert_eq!(source.full_text, "just the excerpt");
    }

    #[test]
    fn unrecognized_fields_pass_through_without_clobbering() {
        let raw = json!({
            "id": "doc-1",
            "title": "Handbook",
            "score": 0.93,
            "url": "https://example.com",
            "metadata": {"title": "ignored"}
        });

        let source = normalize_source(&raw, 0);
        assert_eq!(source.title, "Handbook");
        assert_eq!(source.extra.get("score"), Some(&json!(0.93)));
        // `url` and `metadata` are inputs to resolution, not normalized output
        // names, so they survive in the pass-through bag.
        assert_eq!(source.extra.get("url"), Some(&json!("https://example.com")));
        assert!(source.extra.contains_key("metadata"));
        assert!(!source.extra.contains_key("title"));
        assert!(!source.extra.contains_key("id"));
    }

    #[test]
    fn chat_response_defaults_and_follow_ups_fallback() {
        let body = json!({"answer": "X", "sources": [], "follow_ups": ["A", "B"]});
        let response = normalize_chat_response(&body);
        assert_eq!(response.answer, "X");
        assert!(response.sources.is_empty());
        assert_eq!(response.follow_up_questions, vec!["A", "B"]);
        assert_eq!(response.chat_session_id, None);
        assert_eq!(response.chat_session_title, None);

        let empty = normalize_chat_response(&json!({}));
        assert_eq!(empty.answer, "");
        assert!(empty.sources.is_empty());
        assert!(empty.follow_up_questions.is_empty());
    }

    #[test]
    fn primary_follow_up_key_wins_over_alternate() {
        let body = json!({
            "answer": "X",
            "follow_up_questions": ["primary"],
            "follow_ups": ["alternate"]
        });
        let response = normalize_chat_response(&body);
        assert_eq!(response.follow_up_questions, vec!["primary"]);
    }

    #[test]
    fn empty_session_strings_are_not_carried_through() {
        let body = json!({"answer": "X", "chat_session_id": "", "chat_session_title": "Trip"});
        let response = normalize_chat_response(&body);
        assert_eq!(response.chat_session_id, None);
        assert_eq!(response.chat_session_title.as_deref(), Some("Trip"));
    }

    #[test]
    fn session_defaults() {
        let session = normalize_session(&json!({"id": "s1"}));
        assert_eq!(session.id, "s1");
        assert_eq!(session.title, "New chat");
        assert_eq!(session.preview, "");
        assert_eq!(session.updated_at, None);
    }

    #[test]
    fn non_array_session_bodies_are_empty_not_errors() {
        assert!(normalize_sessions(&json!({"detail": "nope"})).is_empty());
        assert!(normalize_messages(&json!({"detail": "nope"})).is_empty());
    }

    #[test]
    fn role_coercion_is_exact_match_only() {
        let assistant = normalize_message(&json!({"id": "m1", "role": "assistant", "content": "hi"}));
        assert_eq!(assistant.role, MessageRole::Assistant);

        // Wrong case is not the literal, so it coerces to user.
        let wrong_case = normalize_message(&json!({"id": "m2", "role": "Assistant", "content": "hi"}));
        assert_eq!(wrong_case.role, MessageRole::User);

        let garbage = normalize_message(&json!({"id": "m3", "role": 3, "content": "hi"}));
        assert_eq!(garbage.role, MessageRole::User);
    }

    #[test]
    fn web_results_accept_bare_array_or_wrapper_object() {
        let bare = json!([{"title": "T", "link": "L", "snippet": "S"}]);
        let wrapped = json!({"ok": true, "results": [{"title": "T", "link": "L"}]});

        let from_bare = normalize_web_results(&bare);
        assert_eq!(from_bare.len(), 1);
        assert_eq!(from_bare[0].snippet.as_deref(), Some("S"));

        let from_wrapped = normalize_web_results(&wrapped);
        assert_eq!(from_wrapped.len(), 1);
        assert_eq!(from_wrapped[0].title, "T");
        assert_eq!(from_wrapped[0].snippet, None);

        assert!(normalize_web_results(&json!("nope")).is_empty());
    }
}
