// ============================================================================
// File: src/client.rs
// Query, follow-up and chat client for the answer service
// ============================================================================

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Endpoints;
use crate::conversation::ChatMessage;
use crate::error::{ClientError, Result};
use crate::models::{
    AnswerResponse, AnswerResult, ErrorResponse, MessageRequest, RawSource, Role, SearchRequest,
};
use crate::session::{ChatContext, SearchContext};
use crate::source::{normalize_sources, CHAT_TITLE_FALLBACK, SEARCH_TITLE_FALLBACK};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Search,
    FollowUp,
    Chat,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Search => "Search",
            Operation::FollowUp => "Follow-up",
            Operation::Chat => "Chat",
        })
    }
}

/// Result of a chat turn: the normalized answer and the assistant message
/// that was appended to the conversation
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub result: AnswerResult,
    pub message: ChatMessage,
}

pub struct AnswerClient<T: Transport> {
    transport: T,
    endpoints: Endpoints,
}

impl<T: Transport> AnswerClient<T> {
    pub fn new(transport: T, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Start a new search. Allowed in any session state; the returned session
    /// id replaces whatever the context tracked.
    pub async fn search(&self, ctx: &mut SearchContext, query: &str) -> Result<AnswerResult> {
        require_text(query, "query")?;

        let data = self.call(Operation::Search, &SearchRequest { query }).await?;

        let sources = normalize_sources(pick_sources(&data, false), SEARCH_TITLE_FALLBACK);
        let result = AnswerResult {
            answer: data.answer.clone().unwrap_or_default(),
            session_id: data.session_id.clone().unwrap_or_default(),
            sources: ctx.replace_sources(sources),
        };

        ctx.tracker.establish(&result.session_id);
        ctx.record_turn(query, &result);
        Ok(result)
    }

    /// Continue the current search session.
    ///
    /// Fails with [`ClientError::NoActiveSession`] before any request when no
    /// session id can be resolved. An empty source list keeps the sources
    /// already on screen.
    pub async fn follow_up(
        &self,
        ctx: &mut SearchContext,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<AnswerResult> {
        require_text(message, "message")?;
        let effective = ctx.tracker.require(session_id)?;

        let request = MessageRequest {
            message,
            session_id: Some(effective.as_str()),
        };
        let data = self.call(Operation::FollowUp, &request).await?;

        let incoming = normalize_sources(pick_sources(&data, false), SEARCH_TITLE_FALLBACK);
        let result = AnswerResult {
            answer: data.answer.clone().unwrap_or_default(),
            session_id: non_empty(data.session_id.as_deref())
                .unwrap_or(effective.as_str())
                .to_string(),
            sources: ctx.merge_sources(incoming),
        };

        ctx.tracker.establish(&result.session_id);
        ctx.record_turn(message, &result);
        Ok(result)
    }

    /// Send a chat turn, pinned to the tracked chat session when there is one,
    /// and append both messages to the current conversation.
    pub async fn chat(
        &self,
        ctx: &mut ChatContext,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatTurn> {
        require_text(message, "message")?;
        let effective = ctx.tracker.resolve(session_id);

        let request = MessageRequest {
            message,
            session_id: effective.as_deref(),
        };
        let data = self.call(Operation::Chat, &request).await?;

        let session_id = non_empty(data.session_id.as_deref())
            .or(effective.as_deref())
            .unwrap_or_default()
            .to_string();
        let result = AnswerResult {
            answer: data.answer.clone().unwrap_or_default(),
            sources: normalize_sources(pick_sources(&data, true), CHAT_TITLE_FALLBACK),
            session_id,
        };

        if !result.session_id.is_empty() {
            ctx.tracker.establish(&result.session_id);
        }

        let user = ChatMessage::new(Role::User, message, Vec::new());
        let assistant = ChatMessage::new(
            Role::Assistant,
            result.answer.clone(),
            result.sources.clone(),
        );
        ctx.conversations.append_turn(
            non_empty(Some(result.session_id.as_str())),
            user,
            assistant.clone(),
        );

        Ok(ChatTurn {
            result,
            message: assistant,
        })
    }

    async fn call<B: Serialize>(&self, op: Operation, body: &B) -> Result<AnswerResponse> {
        let endpoint = match op {
            Operation::Search => &self.endpoints.search,
            Operation::FollowUp => &self.endpoints.followup,
            Operation::Chat => &self.endpoints.chat,
        };
        let body = serde_json::to_value(body)
            .map_err(|e| ClientError::InvalidInput(format!("failed to encode request: {}", e)))?;

        debug!(%op, endpoint = %endpoint, "calling answer service");
        let response = self.transport.post_json(endpoint, body).await?;

        if !response.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&response.body)
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("{} failed", op));
            warn!(%op, status = response.status, %message, "answer service returned an error status");
            return Err(ClientError::Upstream {
                status: response.status,
                message,
            });
        }

        let data: AnswerResponse = serde_json::from_str(&response.body).map_err(|e| {
            ClientError::Response(format!(
                "{} returned an unreadable body: {} (first 200 chars: {})",
                op,
                e,
                response.body.chars().take(200).collect::<String>()
            ))
        })?;

        if let Some(error) = non_empty(data.error.as_deref()) {
            warn!(%op, %error, "answer service reported an error");
            return Err(ClientError::Response(error.to_string()));
        }

        debug!(
            %op,
            results = data.results.as_ref().map_or(0, Vec::len),
            sources = data.sources.as_ref().map_or(0, Vec::len),
            session = ?data.session_id,
            "answer received"
        );
        Ok(data)
    }
}

fn require_text(text: &str, what: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(ClientError::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Search and follow-up answer under `results`, chat under `sources`; accept either.
fn pick_sources(data: &AnswerResponse, prefer_sources: bool) -> &[RawSource] {
    let (first, second) = if prefer_sources {
        (&data.sources, &data.results)
    } else {
        (&data.results, &data.sources)
    };
    first
        .as_deref()
        .filter(|list| !list.is_empty())
        .or(second.as_deref())
        .unwrap_or_default()
}
