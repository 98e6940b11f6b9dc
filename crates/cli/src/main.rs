//! vimai CLI: the entry point used by the editor glue.
//!
//! Commands:
//! - `parse`: Parse a chat transcript into provider messages
//! - `roles`: List roles selectable for a command type
//! - `context`: Assemble prompt and effective config for an instruction
//! - `config`: Show, locate, validate, or create the settings file

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vimai_config::Settings;
use vimai_core::CommandType;

mod commands;

#[derive(Parser)]
#[command(
    name = "vimai",
    about = "vimai: transcript parsing and prompt assembly for the editor assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    debug_log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a transcript (file or stdin) and print the messages as JSON
    Parse {
        /// Transcript file; reads stdin when omitted
        file: Option<PathBuf>,

        /// Directory relative include paths resolve against
        #[arg(long)]
        cwd: Option<PathBuf>,
    },

    /// List role names for a command type
    Roles {
        /// complete, edit, chat, or image
        command_type: CommandType,
    },

    /// Assemble the prompt and effective config for an instruction
    Context {
        /// complete, edit, chat, or image
        command_type: CommandType,

        /// File holding the selected text
        #[arg(long)]
        selection_file: Option<PathBuf>,

        /// Filetype of the active buffer
        #[arg(long, default_value = "")]
        filetype: String,

        /// Per-call config overrides as a JSON object
        #[arg(long = "override", value_name = "JSON")]
        override_json: Option<String>,

        /// Path of the active buffer, for context roles
        #[arg(long)]
        current_file: Option<PathBuf>,

        /// Project root; defaults to the current directory
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Instruction, e.g. `/refactor extract this`
        #[arg(trailing_var_arg = true)]
        instruction: Vec<String>,
    },

    /// Inspect the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings as TOML
    Show,
    /// Print the settings file path
    Path,
    /// Check the settings and role file
    Validate,
    /// Write a default settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    init_tracing(&cli, &settings)?;

    match cli.command {
        Commands::Parse { file, cwd } => commands::parse::run(file.as_deref(), cwd)?,
        Commands::Roles { command_type } => commands::roles::run(&settings, command_type)?,
        Commands::Context {
            command_type,
            selection_file,
            filetype,
            override_json,
            current_file,
            cwd,
            instruction,
        } => commands::context::run(
            &settings,
            commands::context::ContextArgs {
                command_type,
                selection_file,
                filetype,
                override_json,
                current_file,
                cwd,
                instruction: instruction.join(" "),
            },
        )?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(&settings)?,
            ConfigAction::Path => commands::config_cmd::path(cli.config.as_deref())?,
            ConfigAction::Validate => commands::config_cmd::validate(&settings)?,
            ConfigAction::Init { force } => {
                let path = commands::config_cmd::settings_path(cli.config.as_deref());
                commands::config_cmd::init(&path, force)?;
                println!("Wrote {}", path.display());
            }
        },
    }

    Ok(())
}

/// Log to stderr, or to a file when `--debug-log` is given or `debug = true`.
fn init_tracing(cli: &Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let filter = if cli.verbose || settings.debug { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let log_file = cli
        .debug_log
        .clone()
        .or_else(|| settings.debug.then(|| settings.debug_log_file.clone()));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| format!("Failed to open log file {}: {e}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
