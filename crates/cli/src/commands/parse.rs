//! `vimai parse`: Parse a transcript into provider messages.

use std::io::Read;
use std::path::{Path, PathBuf};

use vimai_chat::{IncludeResolver, TranscriptParser};

pub fn run(file: Option<&Path>, cwd: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let transcript = read_transcript(file)?;
    let resolver = match cwd {
        Some(dir) => IncludeResolver::new(dir),
        None => IncludeResolver::from_current_dir(),
    };

    let messages = TranscriptParser::new(resolver).parse(&transcript);
    tracing::debug!(messages = messages.len(), "Transcript parsed");
    println!("{}", serde_json::to_string_pretty(&messages)?);
    Ok(())
}

fn read_transcript(file: Option<&Path>) -> Result<String, Box<dyn std::error::Error>> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read transcript {}: {e}", path.display()))?),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}
