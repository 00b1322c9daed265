//! Response assembler — turns one user prompt into exactly one appended
//! assistant message.
//!
//! Every call appends one user turn and one assistant turn, whether the
//! chain succeeds, fails, or is skipped by the greeting fast path.

use std::sync::Arc;

use crate::chat::transcript::{Message, TranscriptStore};
use crate::core::config::ChatSettings;
use crate::rag::{AnswerChain, Passage};

pub struct ResponseAssembler {
    chain: Arc<dyn AnswerChain>,
    greetings: Vec<String>,
    greeting_reply: String,
}

impl ResponseAssembler {
    pub fn new(chain: Arc<dyn AnswerChain>, chat: &ChatSettings) -> Self {
        Self {
            chain,
            greetings: chat
                .greetings
                .iter()
                .map(|g| g.to_lowercase())
                .collect(),
            greeting_reply: chat.greeting_reply.clone(),
        }
    }

    /// Handle one synchronous chat turn for the given session.
    ///
    /// An empty trimmed prompt is not rejected; it still produces a
    /// user/assistant pair.
    pub async fn respond(&self, transcripts: &TranscriptStore, session_id: &str, prompt: &str) {
        let prompt = prompt.trim();
        transcripts.append(session_id, Message::user(prompt));

        if self.is_greeting(prompt) {
            tracing::debug!("greeting fast path taken");
            transcripts.append(session_id, Message::assistant(self.greeting_reply.clone()));
            return;
        }

        let reply = match self.chain.invoke(prompt).await {
            Ok(output) => format_reply(&output.result, &output.source_documents),
            Err(err) => {
                tracing::warn!("chain invocation failed: {}", err);
                format!("Error: {}", err.message())
            }
        };

        transcripts.append(session_id, Message::assistant(reply));
    }

    fn is_greeting(&self, prompt: &str) -> bool {
        let lowered = prompt.to_lowercase();
        self.greetings.iter().any(|g| *g == lowered)
    }
}

/// Answer text followed by a rendered source list when passages are present.
pub fn format_reply(answer: &str, passages: &[Passage]) -> String {
    let mut reply = answer.to_string();

    if !passages.is_empty() {
        reply.push_str("\n\nSources:\n");
        for (i, passage) in passages.iter().enumerate() {
            let mut name = match &passage.source {
                Some(source) => source.clone(),
                None => format!("Document {}", i + 1),
            };
            if let Some(page) = passage.page {
                name.push_str(&format!(" (Page: {})", page));
            }
            reply.push_str(&format!("- {}\n", name));
        }
    }

    reply
}
