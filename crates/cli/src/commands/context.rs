//! `vimai context`: Assemble the prompt and effective config.

use std::path::PathBuf;

use vimai_chat::{AiContext, AssembleRequest, ProjectContext, PromptAssembler};
use vimai_config::Settings;
use vimai_config::value::{ConfigMap, from_json};
use vimai_core::CommandType;

pub struct ContextArgs {
    pub command_type: CommandType,
    pub selection_file: Option<PathBuf>,
    pub filetype: String,
    pub override_json: Option<String>,
    /// Active buffer; context roles describe it in the prompt.
    pub current_file: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
    pub instruction: String,
}

pub fn run(settings: &Settings, args: ContextArgs) -> Result<(), Box<dyn std::error::Error>> {
    let context = build(settings, &args)?;
    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}

/// Assemble without printing.
pub fn build(settings: &Settings, args: &ContextArgs) -> Result<AiContext, Box<dyn std::error::Error>> {
    let selection = match &args.selection_file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read selection {}: {e}", path.display()))?,
        None => String::new(),
    };
    let overrides = parse_overrides(args.override_json.as_deref())?;
    let defaults = settings.command_defaults(args.command_type);

    let assembler =
        PromptAssembler::new(settings.role_store()).with_project_context(project_context(args)?);
    let context = assembler.assemble(AssembleRequest {
        instruction: &args.instruction,
        selection: &selection,
        command_type: args.command_type,
        default_config: &defaults,
        override_config: &overrides,
        filetype: &args.filetype,
    })?;
    Ok(context)
}

fn project_context(args: &ContextArgs) -> Result<ProjectContext, Box<dyn std::error::Error>> {
    let cwd = match &args.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir()?,
    };
    let mut project = ProjectContext::new(&cwd).with_filetype(&args.filetype);
    if let Some(file) = &args.current_file {
        project = project.with_current_file(cwd.join(file));
    }
    Ok(project)
}

fn parse_overrides(json: Option<&str>) -> Result<ConfigMap, Box<dyn std::error::Error>> {
    let Some(json) = json.filter(|j| !j.trim().is_empty()) else {
        return Ok(ConfigMap::new());
    };
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| format!("Invalid --override JSON: {e}"))?;
    if !value.is_object() {
        return Err("--override must be a JSON object".into());
    }
    Ok(from_json(value)?)
}
