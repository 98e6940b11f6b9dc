//! Provider trait: the abstraction over AI backends.
//!
//! A Provider takes the parsed message list and returns a stream of
//! response chunks. Backends (HTTP APIs, vendor CLIs) live outside the core;
//! this crate only fixes the contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Receiver;

use crate::error::ProviderError;
use crate::message::Message;

/// What a streamed chunk carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Answer text to render
    Assistant,
    /// Reasoning trace; never rendered into the answer
    Thinking,
    /// Backend-reported error text
    Error,
}

/// A single chunk in a streaming response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseChunk {
    #[serde(rename = "type")]
    pub kind: ChunkKind,

    /// Partial content delta
    pub content: String,
}

impl ResponseChunk {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            kind: ChunkKind::Assistant,
            content: content.into(),
        }
    }

    pub fn thinking(content: impl Into<String>) -> Self {
        Self {
            kind: ChunkKind::Thinking,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            kind: ChunkKind::Error,
            content: content.into(),
        }
    }
}

/// Stream of chunks returned by [`Provider::request`].
pub type ChunkStream = Receiver<std::result::Result<ResponseChunk, ProviderError>>;

/// The core Provider trait.
///
/// One implementation per backend. Callers hand over the message list
/// without knowing which backend serves it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "bedrock").
    fn name(&self) -> &str;

    /// Send the conversation and get a stream of response chunks.
    async fn request(&self, messages: Vec<Message>) -> std::result::Result<ChunkStream, ProviderError>;

    /// Generate images for a prompt.
    ///
    /// Default implementation reports the operation as unsupported.
    async fn request_image(&self, _prompt: &str) -> std::result::Result<Vec<String>, ProviderError> {
        Err(ProviderError::Unsupported {
            provider: self.name().to_string(),
            operation: "request_image".into(),
        })
    }
}
