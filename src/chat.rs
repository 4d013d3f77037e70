//! Chat transcripts kept per session.

use serde::Serialize;
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

const ASSISTANT_PREFIX: &str = "SimpliMedi-Search";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Message typed by the user.
    User,
    /// Reply generated from the query summary.
    Assistant,
}

/// One entry in a session transcript.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Message author.
    pub role: ChatRole,
    /// Rendered message text.
    pub content: String,
    /// RFC3339 creation time.
    pub timestamp: String,
}

impl ChatMessage {
    /// Create a message stamped with the current time.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: current_timestamp_rfc3339(),
        }
    }
}

/// Render the assistant reply shown for a query summary.
pub fn format_reply(summary: &str, factual_consistency: Option<f32>) -> String {
    let score = factual_consistency
        .map(|score| score.to_string())
        .unwrap_or_else(|| "unavailable".to_string());
    format!("{ASSISTANT_PREFIX}: {summary}\n\nFactual Consistency Score: {score}")
}

/// In-memory transcripts keyed by session id.
#[derive(Default)]
pub struct ChatStore {
    sessions: RwLock<HashMap<Uuid, Vec<ChatMessage>>>,
}

impl ChatStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append messages to a session, creating it on first use.
    pub async fn append(&self, session: Uuid, messages: impl IntoIterator<Item = ChatMessage>) {
        let mut sessions = self.sessions.write().await;
        sessions.entry(session).or_default().extend(messages);
    }

    /// Return the transcript for a session, or `None` when it was never used.
    pub async fn history(&self, session: Uuid) -> Option<Vec<ChatMessage>> {
        self.sessions.read().await.get(&session).cloned()
    }

    /// Number of sessions with at least one message.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_includes_summary_and_score() {
        assert_eq!(
            format_reply("No known allergies.", Some(0.8123)),
            "SimpliMedi-Search: No known allergies.\n\nFactual Consistency Score: 0.8123"
        );
        assert!(format_reply("S", None).ends_with("Factual Consistency Score: unavailable"));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = ChatStore::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        store
            .append(
                first,
                [
                    ChatMessage::new(ChatRole::User, "hi"),
                    ChatMessage::new(ChatRole::Assistant, "hello"),
                ],
            )
            .await;
        store
            .append(second, [ChatMessage::new(ChatRole::User, "other")])
            .await;

        let history = store.history(first).await.expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[1].content, "hello");
        assert_eq!(store.session_count().await, 2);
        assert!(store.history(Uuid::new_v4()).await.is_none());
    }
}
