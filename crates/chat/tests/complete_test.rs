//! Completion runner against a scripted provider.

use std::sync::Mutex;

use tokio::sync::mpsc;
use vimai_chat::prompt::AiContext;
use vimai_chat::{IncludeResolver, TranscriptParser, run_completion};
use vimai_config::value::ConfigMap;
use vimai_config::{ConfigValue, builtin_defaults};
use vimai_core::error::ProviderError;
use vimai_core::provider::ChunkStream;
use vimai_core::{CommandType, Error, Message, Provider, ResponseChunk, Role};

// ── Scripted Provider ────────────────────────────────────────────────────

/// Replays a fixed chunk sequence and records the messages it received.
struct ScriptedProvider {
    chunks: Vec<Result<ResponseChunk, ProviderError>>,
    received: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    fn new(chunks: Vec<Result<ResponseChunk, ProviderError>>) -> Self {
        Self {
            chunks,
            received: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    fn last_request(&self) -> Vec<Message> {
        self.received.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn request(&self, messages: Vec<Message>) -> Result<ChunkStream, ProviderError> {
        self.received.lock().unwrap().push(messages);
        let (tx, rx) = mpsc::channel(self.chunks.len().max(1));
        for chunk in &self.chunks {
            tx.send(chunk.clone()).await.unwrap();
        }
        Ok(rx)
    }
}

fn context(prompt: &str, roles: &[&str], config: ConfigMap) -> AiContext {
    AiContext {
        command_type: CommandType::Complete,
        config,
        prompt: prompt.into(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

fn parser() -> TranscriptParser {
    TranscriptParser::new(IncludeResolver::new(env!("CARGO_MANIFEST_DIR")))
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn only_assistant_chunks_reach_the_sink() {
    let provider = ScriptedProvider::new(vec![
        Ok(ResponseChunk::thinking("let me think")),
        Ok(ResponseChunk::assistant("Hello")),
        Ok(ResponseChunk::error("rate limited")),
        Ok(ResponseChunk::assistant(", world")),
    ]);
    let mut output = String::new();

    run_completion(
        &context("greet", &[], builtin_defaults(CommandType::Complete)),
        &parser(),
        &provider,
        |text| output.push_str(text),
    )
    .await
    .unwrap();

    assert_eq!(output, "Hello, world");
}

#[tokio::test]
async fn initial_prompt_becomes_system_message() {
    let provider = ScriptedProvider::new(vec![Ok(ResponseChunk::assistant("ok"))]);

    run_completion(
        &context("greet", &[], builtin_defaults(CommandType::Complete)),
        &parser(),
        &provider,
        |_| {},
    )
    .await
    .unwrap();

    let messages = provider.last_request();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::System);
    assert!(messages[0].text().starts_with("You are a general assistant."));
    assert_eq!(messages[1], Message::user("greet"));
}

#[tokio::test]
async fn empty_prompt_without_roles_does_nothing() {
    let provider = ScriptedProvider::new(vec![Ok(ResponseChunk::assistant("unused"))]);
    let mut called = false;

    run_completion(&context("", &[], ConfigMap::new()), &parser(), &provider, |_| {
        called = true
    })
    .await
    .unwrap();

    assert_eq!(provider.calls(), 0);
    assert!(!called);
}

#[tokio::test]
async fn roles_alone_trigger_a_request() {
    let provider = ScriptedProvider::new(vec![Ok(ResponseChunk::assistant("done"))]);
    let mut output = String::new();

    run_completion(
        &context("", &["fix"], ConfigMap::new()),
        &parser(),
        &provider,
        |text| output.push_str(text),
    )
    .await
    .unwrap();

    assert_eq!(provider.calls(), 1);
    assert_eq!(output, "done");
}

#[tokio::test]
async fn complete_engine_is_rejected_before_requesting() {
    let provider = ScriptedProvider::new(Vec::new());
    let mut config = ConfigMap::new();
    config.insert("engine".into(), ConfigValue::from("complete"));

    let err = run_completion(&context("hi", &[], config), &parser(), &provider, |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config { .. }));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn stream_failure_is_surfaced() {
    let provider = ScriptedProvider::new(vec![
        Ok(ResponseChunk::assistant("partial")),
        Err(ProviderError::StreamInterrupted(String::new())),
    ]);
    let mut output = String::new();

    let err = run_completion(
        &context("hi", &[], ConfigMap::new()),
        &parser(),
        &provider,
        |text| output.push_str(text),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Provider(ProviderError::StreamInterrupted(_))));
    assert_eq!(output, "partial");
}
