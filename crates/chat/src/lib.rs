//! # vimai Chat
//!
//! Turns editor text into provider input: the transcript parser produces the
//! message list, the include resolver inlines referenced files, and the
//! prompt assembler layers roles over command defaults. Context roles
//! also get the current file and project layout.

pub mod complete;
pub mod include;
pub mod project_context;
pub mod prompt;
pub mod transcript;

pub use complete::run_completion;
pub use include::IncludeResolver;
pub use project_context::ProjectContext;
pub use prompt::{AiContext, AssembleRequest, PromptAssembler, parse_role_names};
pub use transcript::{TranscriptParser, parse_chat_messages};
