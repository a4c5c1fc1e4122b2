//! Interactive chat session over the QA pipeline.

pub mod terminal;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::image::{self, ImageLookup};
use crate::rag::{PromptTemplate, RetrievalQa};
use crate::state::PipelineStatus;

pub const PIPELINE_UNAVAILABLE_NOTICE: &str = "Failed to load the QA pipeline.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn label(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only message history for one session.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn push(&mut self, role: ChatRole, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingGeneration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageDisplay {
    Found { url: String, caption: String },
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing was recorded.
    Ignored,
    Answered {
        reply: String,
        /// `None` when image lookup is disabled.
        image: Option<ImageDisplay>,
    },
    Failed {
        notice: String,
    },
}

pub struct SessionTurnHandler {
    chain: Option<RetrievalQa>,
    unavailable_reason: Option<String>,
    image_lookup: Option<Arc<dyn ImageLookup>>,
    log: ChatLog,
    state: TurnState,
}

impl SessionTurnHandler {
    pub fn new(pipeline: &PipelineStatus, image_lookup: Option<Arc<dyn ImageLookup>>) -> Self {
        let (chain, unavailable_reason) = match pipeline {
            PipelineStatus::Ready(pipeline) => (Some(pipeline.chain(PromptTemplate::session())), None),
            PipelineStatus::Unavailable(reason) => (None, Some(reason.clone())),
        };
        Self {
            chain,
            unavailable_reason,
            image_lookup,
            log: ChatLog::default(),
            state: TurnState::Idle,
        }
    }

    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub async fn handle_turn(&mut self, input: &str) -> TurnOutcome {
        if input.trim().is_empty() {
            return TurnOutcome::Ignored;
        }

        self.log.push(ChatRole::User, input);

        let Some(chain) = &self.chain else {
            if let Some(reason) = &self.unavailable_reason {
                tracing::warn!("Session turn without pipeline: {}", reason);
            }
            return TurnOutcome::Failed {
                notice: PIPELINE_UNAVAILABLE_NOTICE.to_string(),
            };
        };

        self.state = TurnState::AwaitingGeneration;
        let result = chain.invoke(input).await;
        self.state = TurnState::Idle;

        let reply = match result {
            Ok(output) => output.result,
            Err(err) => {
                tracing::error!("Session turn failed: {}", err);
                return TurnOutcome::Failed {
                    notice: format!("Error: {}", err.detail()),
                };
            }
        };
        self.log.push(ChatRole::Assistant, reply.clone());

        let image = self.lookup_image(input).await;
        TurnOutcome::Answered { reply, image }
    }

    async fn lookup_image(&self, input: &str) -> Option<ImageDisplay> {
        let lookup = self.image_lookup.as_ref()?;
        let key = image::disease_key(input);

        let display = match lookup.lookup(&key).await {
            Ok(Some(url)) => ImageDisplay::Found {
                url,
                caption: image::caption(input),
            },
            Ok(None) => ImageDisplay::NotFound,
            Err(err) => {
                tracing::warn!("Image lookup via {} failed: {}", lookup.name(), err);
                ImageDisplay::NotFound
            }
        };
        Some(display)
    }
}
