// ============================================================================
// File: src/session.rs
// Session continuity: which backend conversation a follow-up belongs to
// ============================================================================

use tracing::info;

use crate::conversation::ConversationStore;
use crate::error::{ClientError, Result};
use crate::models::{AnswerResult, Source};

/// Whether a backend session has been established
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Active(String),
}

/// Single slot holding the most recent backend session id.
///
/// Only a successful response moves it; only `reset` returns it to `Idle`.
#[derive(Debug, Default)]
pub struct SessionTracker {
    state: SessionState,
}

impl SessionTracker {
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current(&self) -> Option<&str> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Active(id) => Some(id),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Effective id for one call: an explicit non-empty id wins over the tracked one.
    /// The tracked slot is not touched.
    pub fn resolve(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .filter(|id| !id.is_empty())
            .or_else(|| self.current())
            .map(str::to_string)
    }

    /// Like [`resolve`](Self::resolve) but a missing id is a precondition failure
    pub fn require(&self, explicit: Option<&str>) -> Result<String> {
        self.resolve(explicit).ok_or(ClientError::NoActiveSession)
    }

    /// Record the id a response confirmed. An empty id leaves the tracker idle.
    pub fn establish(&mut self, id: &str) {
        let next = if id.is_empty() {
            SessionState::Idle
        } else {
            SessionState::Active(id.to_string())
        };
        if next != self.state {
            info!(from = ?self.state, to = ?next, "session transition");
        }
        self.state = next;
    }

    pub fn reset(&mut self) {
        if self.is_active() {
            info!("session reset");
        }
        self.state = SessionState::Idle;
    }
}

/// One query and the answer shown for it
#[derive(Debug, Clone)]
pub struct SearchTurn {
    pub query: String,
    pub result: AnswerResult,
}

/// Search-mode context: the tracked session plus the sources currently on screen
#[derive(Debug, Default)]
pub struct SearchContext {
    pub tracker: SessionTracker,
    sources: Vec<Source>,
    turns: Vec<SearchTurn>,
}

impl SearchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_active_session(&self) -> bool {
        self.tracker.is_active()
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.tracker.current()
    }

    /// Sources currently displayed
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn turns(&self) -> &[SearchTurn] {
        &self.turns
    }

    /// Replace the displayed sources outright, as a new search does
    pub(crate) fn replace_sources(&mut self, incoming: Vec<Source>) -> Vec<Source> {
        self.sources = incoming;
        self.sources.clone()
    }

    /// Replace the displayed sources unless `incoming` is empty, then return the
    /// list that should be displayed.
    pub fn merge_sources(&mut self, incoming: Vec<Source>) -> Vec<Source> {
        if !incoming.is_empty() {
            self.sources = incoming;
        }
        self.sources.clone()
    }

    pub(crate) fn record_turn(&mut self, query: &str, result: &AnswerResult) {
        self.turns.push(SearchTurn {
            query: query.to_string(),
            result: result.clone(),
        });
    }

    /// Start over on an unrelated topic
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.sources.clear();
        self.turns.clear();
    }
}

/// Chat-mode context, tracked independently of search
#[derive(Debug, Default)]
pub struct ChatContext {
    pub tracker: SessionTracker,
    pub conversations: ConversationStore,
}

impl ChatContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.tracker.current()
    }

    /// Deselect the current conversation and forget the backend session
    pub fn new_chat(&mut self) {
        self.tracker.reset();
        self.conversations.deselect();
    }

    /// Make an existing conversation current and pin follow-ups to the
    /// backend session it last confirmed; without one the tracker goes idle.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.conversations.select(id) {
            return false;
        }
        let backend_id = self
            .conversations
            .current()
            .and_then(|s| s.backend_session_id.clone());
        match backend_id {
            Some(backend_id) => self.tracker.establish(&backend_id),
            None => self.tracker.reset(),
        }
        true
    }

    /// Remove a conversation; removing the current one starts a new chat
    pub fn delete(&mut self, id: &str) -> bool {
        let was_current = self.conversations.current_id() == Some(id);
        let removed = self.conversations.delete(id);
        if removed && was_current {
            self.new_chat();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ChatMessage;
    use crate::models::Role;

    fn pair(question: &str) -> (ChatMessage, ChatMessage) {
        (
            ChatMessage::new(Role::User, question, Vec::new()),
            ChatMessage::new(Role::Assistant, "answer", Vec::new()),
        )
    }

    fn source(title: &str) -> Source {
        Source {
            title: title.into(),
            url: format!("http://{}", title.to_lowercase()),
            snippet: String::new(),
            domain: String::new(),
            favicon: String::new(),
        }
    }

    #[test]
    fn tracker_starts_idle() {
        let tracker = SessionTracker::default();
        assert_eq!(tracker.state(), &SessionState::Idle);
        assert!(matches!(tracker.require(None), Err(ClientError::NoActiveSession)));
    }

    #[test]
    fn establish_and_reset() {
        let mut tracker = SessionTracker::default();
        tracker.establish("s1");
        assert_eq!(tracker.state(), &SessionState::Active("s1".into()));
        tracker.reset();
        assert!(!tracker.is_active());
    }

    #[test]
    fn empty_id_leaves_tracker_idle() {
        let mut tracker = SessionTracker::default();
        tracker.establish("s1");
        tracker.establish("");
        assert_eq!(tracker.current(), None);
    }

    #[test]
    fn explicit_id_wins_without_overwriting_slot() {
        let mut tracker = SessionTracker::default();
        tracker.establish("tracked");
        assert_eq!(tracker.resolve(Some("explicit")).as_deref(), Some("explicit"));
        assert_eq!(tracker.resolve(Some("")).as_deref(), Some("tracked"));
        assert_eq!(tracker.current(), Some("tracked"));
    }

    #[test]
    fn explicit_id_satisfies_precondition_when_idle() {
        let tracker = SessionTracker::default();
        assert_eq!(tracker.require(Some("given")).unwrap(), "given");
    }

    #[test]
    fn empty_incoming_sources_keep_previous() {
        let mut ctx = SearchContext::new();
        ctx.merge_sources(vec![source("A"), source("B")]);
        let shown = ctx.merge_sources(Vec::new());
        assert_eq!(shown.len(), 2);

        let shown = ctx.merge_sources(vec![source("C")]);
        assert_eq!(shown, vec![source("C")]);
        assert_eq!(ctx.sources(), &[source("C")]);
    }

    #[test]
    fn search_reset_clears_everything() {
        let mut ctx = SearchContext::new();
        ctx.tracker.establish("s1");
        ctx.merge_sources(vec![source("A")]);
        ctx.reset();
        assert!(!ctx.has_active_session());
        assert!(ctx.sources().is_empty());
        assert!(ctx.turns().is_empty());
    }

    #[test]
    fn chat_select_and_delete() {
        let mut ctx = ChatContext::new();
        let (user, assistant) = pair("first");
        ctx.conversations.append_turn(Some("s1"), user, assistant);
        ctx.new_chat();
        assert!(ctx.current_session_id().is_none());

        assert!(ctx.select("s1"));
        assert_eq!(ctx.current_session_id(), Some("s1"));
        assert!(!ctx.select("missing"));

        assert!(ctx.delete("s1"));
        assert!(ctx.current_session_id().is_none());
        assert!(ctx.conversations.is_empty());
    }

    #[test]
    fn selecting_conversation_without_backend_id_leaves_tracker_idle() {
        let mut ctx = ChatContext::new();
        let (user, assistant) = pair("first");
        let local_id = ctx.conversations.append_turn(None, user, assistant).id.clone();
        ctx.tracker.establish("elsewhere");

        assert!(ctx.select(&local_id));
        assert!(ctx.current_session_id().is_none());
    }
}
