//! Prompt assembly: role extraction, config layering, and selection fencing.
//!
//! `assemble` turns the editor's instruction (`/role another-role do this`)
//! and selected text into the final prompt and the effective config:
//!
//! ```text
//! effective = merge_deep([command defaults, caller overrides, roles])
//! roles     = [default] + /names, merged slot by slot
//! ```

use serde::Serialize;
use tracing::debug;
use vimai_config::value::{ConfigMap, get_str};
use vimai_config::{RoleStore, merge_deep};
use vimai_core::{CommandType, Result};

use crate::project_context::ProjectContext;

/// The generic fence boundary; gets the buffer's filetype appended.
pub const FENCE: &str = "```";

/// Filetype of chat buffers, never used as a fence annotation.
const CHAT_FILETYPE: &str = "aichat";

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ':'
}

/// Split leading `/name` tokens off an instruction.
///
/// Returns the role names and the remaining prompt. The prompt starts right
/// after the last role token, so `/role: text` keeps its leading `:`.
pub fn parse_role_names(instruction: &str) -> (Vec<String>, String) {
    let instruction = instruction.trim();
    let mut roles = Vec::new();
    let mut prompt_start = 0;

    let mut offset = 0;
    let mut rest = instruction;
    loop {
        let token_start = rest.trim_start_matches(is_separator);
        offset += rest.len() - token_start.len();
        if token_start.is_empty() {
            break;
        }
        let end = token_start.find(is_separator).unwrap_or(token_start.len());
        match token_start[..end].strip_prefix('/') {
            Some(name) if !name.is_empty() => {
                roles.push(name.to_string());
                prompt_start = offset + end;
            }
            _ => break,
        }
        offset += end;
        rest = &token_start[end..];
    }

    (roles, instruction[prompt_start..].trim().to_string())
}

/// Opening and closing selection boundaries.
///
/// Only the generic fence is annotated, and only with a real filetype.
pub fn selection_boundary(boundary: &str, filetype: &str) -> (String, String) {
    if boundary == FENCE && !filetype.is_empty() && filetype != CHAT_FILETYPE {
        (format!("{boundary}{filetype}"), boundary.to_string())
    } else {
        (boundary.to_string(), boundary.to_string())
    }
}

fn selection_prompt(
    selection: &str,
    user_prompt: &str,
    config_prompt: &str,
    boundary: &str,
    filetype: &str,
) -> String {
    if user_prompt.is_empty() && config_prompt.is_empty() {
        return selection.to_string();
    }
    if selection.is_empty() {
        return String::new();
    }
    if boundary.is_empty() || selection.contains(boundary) {
        return selection.to_string();
    }
    let (open, close) = selection_boundary(boundary, filetype);
    format!("{open}\n{selection}\n{close}")
}

/// Build the final prompt from its pieces.
pub fn make_prompt(
    config_prompt: &str,
    user_prompt: &str,
    selection: &str,
    boundary: &str,
    filetype: &str,
) -> String {
    let user_prompt = user_prompt.trim();
    let delimiter = if !user_prompt.is_empty() && !selection.is_empty() {
        ":\n"
    } else {
        ""
    };
    let selection = selection_prompt(selection, user_prompt, config_prompt, boundary, filetype);
    let prompt = format!("{user_prompt}{delimiter}{selection}");

    if config_prompt.is_empty() {
        return prompt;
    }
    let delimiter = if prompt.starts_with(':') { "" } else { ":\n" };
    format!("{config_prompt}{delimiter}{prompt}")
}

/// Inputs to one assembly.
#[derive(Debug, Clone, Copy)]
pub struct AssembleRequest<'a> {
    pub instruction: &'a str,
    pub selection: &'a str,
    pub command_type: CommandType,
    /// Command defaults, usually `Settings::command_defaults`.
    pub default_config: &'a ConfigMap,
    /// Per-call overrides from the editor.
    pub override_config: &'a ConfigMap,
    /// Filetype of the active buffer, for fence annotation.
    pub filetype: &'a str,
}

/// Result of one assembly, handed to the provider layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiContext {
    pub command_type: CommandType,
    pub config: ConfigMap,
    pub prompt: String,
    pub roles: Vec<String>,
}

/// Assembles prompts against a role store.
#[derive(Debug)]
pub struct PromptAssembler {
    role_store: RoleStore,
    project: Option<ProjectContext>,
}

impl PromptAssembler {
    pub fn new(role_store: RoleStore) -> Self {
        Self {
            role_store,
            project: None,
        }
    }

    /// Prefix prompts of context roles with what is known about the project.
    pub fn with_project_context(mut self, project: ProjectContext) -> Self {
        self.project = Some(project);
        self
    }

    pub fn role_store(&self) -> &RoleStore {
        &self.role_store
    }

    /// Extract roles, layer the config, and build the prompt.
    ///
    /// Fails with `RoleNotFound` for an unknown role and with a config error
    /// when the role source cannot be read.
    pub fn assemble(&self, request: AssembleRequest<'_>) -> Result<AiContext> {
        let (roles, user_prompt) = parse_role_names(request.instruction);
        let role_config = self
            .role_store
            .resolve_roles(&roles, request.command_type)?;

        let config = merge_deep([request.default_config, request.override_config, &role_config]);
        let prompt = make_prompt(
            get_str(&config, "prompt"),
            &user_prompt,
            request.selection,
            get_str(&config, "options.selection_boundary"),
            request.filetype,
        );
        let prompt = match &self.project {
            Some(project) => project.enhance(&prompt, &roles),
            None => prompt,
        };

        debug!(
            command_type = %request.command_type,
            ?roles,
            prompt_len = prompt.len(),
            "Assembled prompt"
        );

        Ok(AiContext {
            command_type: request.command_type,
            config,
            prompt,
            roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_leading_slash_tokens() {
        let (roles, prompt) = parse_role_names("/foo /bar do something");
        assert_eq!(roles, vec!["foo", "bar"]);
        assert_eq!(prompt, "do something");
    }

    #[test]
    fn plain_text_has_no_roles() {
        let (roles, prompt) = parse_role_names("plain text");
        assert!(roles.is_empty());
        assert_eq!(prompt, "plain text");
    }

    #[test]
    fn role_extraction_stops_at_first_plain_token() {
        let (roles, prompt) = parse_role_names("  /a fix /b later ");
        assert_eq!(roles, vec!["a"]);
        assert_eq!(prompt, "fix /b later");
    }

    #[test]
    fn colon_after_role_is_kept() {
        let (roles, prompt) = parse_role_names("/refactor: extract fn");
        assert_eq!(roles, vec!["refactor"]);
        assert_eq!(prompt, ": extract fn");
    }

    #[test]
    fn only_roles_leaves_empty_prompt() {
        let (roles, prompt) = parse_role_names("/a:/b");
        assert_eq!(roles, vec!["a", "b"]);
        assert_eq!(prompt, "");
    }

    #[test]
    fn bare_slash_is_not_a_role() {
        let (roles, prompt) = parse_role_names("/ what");
        assert!(roles.is_empty());
        assert_eq!(prompt, "/ what");
    }

    #[test]
    fn selection_only_is_verbatim() {
        assert_eq!(make_prompt("", "", "let x = 1;", "#####", ""), "let x = 1;");
    }

    #[test]
    fn prompt_and_selection_get_boundary() {
        assert_eq!(
            make_prompt("", "explain", "code", "#####", "rust"),
            "explain:\n#####\ncode\n#####"
        );
    }

    #[test]
    fn fence_is_annotated_with_filetype() {
        assert_eq!(
            make_prompt("", "explain", "code", "```", "rust"),
            "explain:\n```rust\ncode\n```"
        );
        assert_eq!(
            make_prompt("", "explain", "code", "```", "aichat"),
            "explain:\n```\ncode\n```"
        );
    }

    #[test]
    fn boundary_already_in_selection_is_not_added() {
        assert_eq!(
            make_prompt("", "explain", "a ##### b", "#####", ""),
            "explain:\na ##### b"
        );
    }

    #[test]
    fn config_prompt_is_prefixed() {
        assert_eq!(make_prompt("be brief", "hi", "", "", ""), "be brief:\nhi");
        assert_eq!(make_prompt("be brief", "", "", "", ""), "be brief:\n");
        assert_eq!(make_prompt("be brief", ": hi", "", "", ""), "be brief: hi");
    }

    #[test]
    fn config_prompt_with_selection_only() {
        assert_eq!(
            make_prompt("fix", "", "code", "", ""),
            "fix:\ncode"
        );
    }
}
