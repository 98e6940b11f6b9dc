//! Completion runner for the `complete` and `edit` commands.

use tracing::{debug, warn};
use vimai_config::options::{initial_prompt, make_options};
use vimai_config::value::{ConfigMap, get_str};
use vimai_core::{ChunkKind, Error, Provider, Result};

use crate::prompt::AiContext;
use crate::transcript::TranscriptParser;

/// Build the transcript sent for a completion: the configured initial
/// prompt followed by one user segment.
pub fn completion_transcript(context: &AiContext) -> String {
    let options = context
        .config
        .get("options")
        .and_then(|v| v.as_map())
        .map(make_options)
        .unwrap_or_default();
    format!(
        "{}\n\n>>> user\n\n{}",
        initial_prompt(&options),
        context.prompt
    )
    .trim()
    .to_string()
}

fn check_engine(config: &ConfigMap) -> Result<()> {
    if get_str(config, "engine") == "complete" {
        return Err(Error::Config {
            message: "complete engine is no longer supported".into(),
        });
    }
    Ok(())
}

/// Run one completion, passing assistant text to `sink` as it streams in.
///
/// Nothing is requested when both the prompt and the role list are empty.
/// Thinking chunks are dropped; error chunks are logged and dropped.
pub async fn run_completion<F>(
    context: &AiContext,
    parser: &TranscriptParser,
    provider: &dyn Provider,
    mut sink: F,
) -> Result<()>
where
    F: FnMut(&str) + Send,
{
    check_engine(&context.config)?;

    if context.prompt.is_empty() && context.roles.is_empty() {
        debug!(command_type = %context.command_type, "Empty completion, nothing to request");
        return Ok(());
    }

    let transcript = completion_transcript(context);
    debug!(command_type = %context.command_type, "Completion text:\n{transcript}");
    let messages = parser.parse(&transcript);

    let mut stream = provider.request(messages).await?;
    while let Some(chunk) = stream.recv().await {
        let chunk = chunk?;
        match chunk.kind {
            ChunkKind::Assistant => sink(&chunk.content),
            ChunkKind::Thinking => {}
            ChunkKind::Error => warn!(provider = provider.name(), "Provider error chunk: {}", chunk.content),
        }
    }
    Ok(())
}
