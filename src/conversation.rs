// ============================================================================
// File: src/conversation.rs
// In-memory chat conversations
// ============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Role, Source};

const TITLE_MAX_CHARS: usize = 30;

/// A single chat message; never mutated after creation
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            id: generate_message_id(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            sources,
        }
    }
}

/// Unique message id, `msg_<millis>_<suffix>`
pub fn generate_message_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("msg_{}_{}", Utc::now().timestamp_millis(), &suffix[..9])
}

/// Title derived from the opening user message
pub fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// A chat conversation living in process memory only
#[derive(Debug, Serialize, Clone)]
pub struct ConversationSession {
    pub id: String,
    pub title: String,
    /// Session id the backend last confirmed; `None` when it never sent one
    pub backend_session_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// All conversations of this process, newest first, with at most one selected
#[derive(Debug, Default)]
pub struct ConversationStore {
    sessions: Vec<ConversationSession>,
    current: Option<String>,
}

impl ConversationStore {
    pub fn sessions(&self) -> &[ConversationSession] {
        &self.sessions
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&ConversationSession> {
        let id = self.current.as_deref()?;
        self.get(id)
    }

    pub fn get(&self, id: &str) -> Option<&ConversationSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Append a user/assistant pair to the current conversation, creating it
    /// (titled from the user message) when none is selected. A confirmed
    /// backend id replaces the one stored on the conversation.
    pub fn append_turn(
        &mut self,
        backend_session_id: Option<&str>,
        user: ChatMessage,
        assistant: ChatMessage,
    ) -> &ConversationSession {
        let now = Utc::now();
        let backend_session_id = backend_session_id.filter(|id| !id.is_empty());
        let existing = self
            .current
            .as_deref()
            .and_then(|id| self.sessions.iter().position(|s| s.id == id));

        let index = match existing {
            Some(index) => {
                let session = &mut self.sessions[index];
                session.messages.push(user);
                session.messages.push(assistant);
                session.updated_at = now;
                if let Some(id) = backend_session_id {
                    session.backend_session_id = Some(id.to_string());
                }
                index
            }
            None => {
                let id = backend_session_id
                    .map(str::to_string)
                    .unwrap_or_else(generate_message_id);
                let session = ConversationSession {
                    title: derive_title(&user.content),
                    id: id.clone(),
                    backend_session_id: backend_session_id.map(str::to_string),
                    messages: vec![user, assistant],
                    created_at: now,
                    updated_at: now,
                };
                self.sessions.insert(0, session);
                self.current = Some(id);
                0
            }
        };

        &self.sessions[index]
    }

    pub fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_some() {
            self.current = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn deselect(&mut self) {
        self.current = None;
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.current.as_deref() == Some(id) {
            self.current = None;
        }
        self.sessions.len() != before
    }
}
