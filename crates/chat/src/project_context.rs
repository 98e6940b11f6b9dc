//! Project context for the context-aware roles.
//!
//! When an instruction selects one of [`CONTEXT_ROLES`], the assembled
//! prompt is prefixed with what the editor knows about the project:
//!
//! ```text
//! Current file: /work/app/src/main.rs (language: rust)
//! Project root: /work/app
//! Relative path: src/main.rs
//! Key project files:          (codebase, architect, project)
//!   src/lib.rs
//! Git status:                 (git)
//!    M src/main.rs
//!
//! <prompt>
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

/// Roles that receive project context.
pub const CONTEXT_ROLES: &[&str] = &[
    "codebase",
    "refactor",
    "debug",
    "review",
    "architect",
    "test",
    "docs",
    "git",
    "project",
];

/// Roles that also receive a source file listing.
const LISTING_ROLES: &[&str] = &["codebase", "architect", "project"];

const SOURCE_PATTERNS: &[&str] = &[
    "*.py", "*.js", "*.ts", "*.java", "*.go", "*.rs", "*.cpp", "*.c", "*.h",
];

const FILES_PER_PATTERN: usize = 5;
const MAX_LISTED_FILES: usize = 20;
const MAX_GIT_STATUS_LINES: usize = 10;

/// Whether any of `roles` asks for project context.
pub fn needs_context(roles: &[String]) -> bool {
    roles.iter().any(|r| CONTEXT_ROLES.contains(&r.as_str()))
}

/// What the editor reports about the active buffer and project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    /// Project root; the editor's working directory.
    pub cwd: PathBuf,
    /// Absolute path of the active buffer, if it has one.
    pub current_file: Option<PathBuf>,
    pub filetype: String,
}

impl ProjectContext {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            current_file: None,
            filetype: String::new(),
        }
    }

    pub fn with_current_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.current_file = Some(path.into());
        self
    }

    pub fn with_filetype(mut self, filetype: impl Into<String>) -> Self {
        self.filetype = filetype.into();
        self
    }

    /// Prefix `prompt` with project context when a context role is active.
    ///
    /// Without a context role or a current file the prompt is returned as is.
    pub fn enhance(&self, prompt: &str, roles: &[String]) -> String {
        if !needs_context(roles) {
            return prompt.to_string();
        }
        let lines = self.context_lines(roles);
        if lines.is_empty() {
            return prompt.to_string();
        }
        debug!(lines = lines.len(), "Added project context");
        format!("{}\n\n{prompt}", lines.join("\n"))
    }

    fn context_lines(&self, roles: &[String]) -> Vec<String> {
        let Some(current_file) = &self.current_file else {
            return Vec::new();
        };

        let mut lines = Vec::new();
        if self.filetype.is_empty() {
            lines.push(format!("Current file: {}", current_file.display()));
        } else {
            lines.push(format!(
                "Current file: {} (language: {})",
                current_file.display(),
                self.filetype
            ));
        }

        let relative = current_file.strip_prefix(&self.cwd).unwrap_or(current_file);
        lines.push(format!("Project root: {}", self.cwd.display()));
        lines.push(format!("Relative path: {}", relative.display()));

        if roles.iter().any(|r| LISTING_ROLES.contains(&r.as_str())) {
            let files = project_files(&self.cwd);
            if !files.is_empty() {
                lines.push("Key project files:".into());
                lines.extend(files.iter().map(|f| format!("  {f}")));
            }
        }

        if roles.iter().any(|r| r == "git")
            && let Some(status) = git_status(&self.cwd)
        {
            lines.push("Git status:".into());
            lines.extend(status.iter().map(|l| format!("  {l}")));
        }

        lines
    }
}

/// Source files under `root`, a few per language, sorted and capped.
pub fn project_files(root: &Path) -> Vec<String> {
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..Default::default()
    };
    let base = glob::Pattern::escape(&root.to_string_lossy());

    let mut files: Vec<String> = Vec::new();
    for pattern in SOURCE_PATTERNS {
        let full = format!("{}/**/{pattern}", base.trim_end_matches('/'));
        let Ok(entries) = glob::glob_with(&full, options) else {
            continue;
        };
        files.extend(
            entries
                .filter_map(Result::ok)
                .filter(|p| p.is_file())
                .take(FILES_PER_PATTERN)
                .map(|p| p.strip_prefix(root).unwrap_or(&p).display().to_string()),
        );
    }

    files.sort();
    files.dedup();
    files.truncate(MAX_LISTED_FILES);
    files
}

/// `git status --porcelain` in `dir`, capped; `None` outside a repository.
pub fn git_status(dir: &Path) -> Option<Vec<String>> {
    let output = match Command::new("git")
        .args(["status", "--porcelain"])
        .current_dir(dir)
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            warn!("Could not run git: {e}");
            return None;
        }
    };
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<String> = stdout
        .trim()
        .lines()
        .take(MAX_GIT_STATUS_LINES)
        .map(str::to_string)
        .collect();
    (!lines.is_empty()).then_some(lines)
}
