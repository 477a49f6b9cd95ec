//! Shared entity types for the KB-Assist client.
//!
//! Everything here is the *internal* data model: the stable shapes the rest of
//! the workspace renders and reasons about, after the normalization layer in
//! `kba-core` has absorbed whatever the backend actually sent. Entities are
//! built fresh per response and never mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Access classification of a retrieved document fragment.
///
/// Defaults to [`AccessLevel::Internal`]: when the backend is ambiguous about
/// access, the fragment is treated as restricted rather than public.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Public,
    Internal,
}

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::Internal
    }
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Public => "public",
            AccessLevel::Internal => "internal",
        }
    }
}

/// Who authored a chat turn. Unrecognized backend values coerce to `User`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl Default for MessageRole {
    fn default() -> Self {
        MessageRole::User
    }
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Which document population a question may draw from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Internal,
    Web,
    Hybrid,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Internal => "internal",
            Scope::Web => "web",
            Scope::Hybrid => "hybrid",
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "internal" => Ok(Scope::Internal),
            "web" => Ok(Scope::Web),
            "hybrid" => Ok(Scope::Hybrid),
            other => Err(format!(
                "unknown scope '{other}' (expected internal, web or hybrid)"
            )),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single retrieved document fragment backing an answer.
///
/// After normalization every field is a defined string/enum, regardless of
/// what the backend sent. `extra` carries raw fields the normalizer did not
/// recognise; on name conflict the normalized fields win.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub section: String,
    pub source: String,
    #[serde(rename = "accessLevel", default)]
    pub access_level: AccessLevel,
    #[serde(default)]
    pub snippet: String,
    #[serde(rename = "fullText", default)]
    pub full_text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The record the rendering layer consumes: a pure field-for-field alias of
/// [`Source`] with the pass-through bag dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub title: String,
    pub section: String,
    pub source: String,
    pub access_level: AccessLevel,
    pub snippet: String,
    pub full_text: String,
}

impl From<Source> for Citation {
    fn from(source: Source) -> Self {
        Citation {
            id: source.id,
            title: source.title,
            section: source.section,
            source: source.source,
            access_level: source.access_level,
            snippet: source.snippet,
            full_text: source.full_text,
        }
    }
}

/// One prior turn of conversation, as sent back to the backend with a
/// question. The caller bounds history length before asking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: MessageRole,
    pub content: String,
}

/// Result of asking a question. Source order is the backend's relevance rank.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    pub follow_up_questions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_session_title: Option<String>,
}

/// Summary record for a previous backend-persisted conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub preview: String,
    pub updated_at: Option<String>,
}

/// A single turn within a session transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(default)]
    pub role: MessageRole,
    pub content: String,
    pub created_at: Option<String>,
}

/// One hit from the web-search endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub title: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Access role supplied by the session/auth layer. The (out-of-scope)
/// filtering logic uses this to pick a [`Scope`] before asking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Employee,
}

/// Minimal user record consumed from the session/auth layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub role: UserRole,
}
