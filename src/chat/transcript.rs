//! In-process conversation transcripts, keyed by session id.
//!
//! A transcript lives for the duration of a browser session and is
//! append-only between resets. The lock is never held across an await.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Default)]
pub struct TranscriptStore {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, session_id: &str, message: Message) {
        let mut sessions = self.sessions.write().expect("transcript lock poisoned");
        sessions
            .entry(session_id.to_string())
            .or_default()
            .push(message);
    }

    pub fn snapshot(&self, session_id: &str) -> Vec<Message> {
        let sessions = self.sessions.read().expect("transcript lock poisoned");
        sessions.get(session_id).cloned().unwrap_or_default()
    }

    /// Clear a session's transcript. A no-op for unknown or empty sessions.
    pub fn clear(&self, session_id: &str) {
        let mut sessions = self.sessions.write().expect("transcript lock poisoned");
        sessions.remove(session_id);
    }

    pub fn len(&self, session_id: &str) -> usize {
        let sessions = self.sessions.read().expect("transcript lock poisoned");
        sessions.get(session_id).map(Vec::len).unwrap_or(0)
    }
}
