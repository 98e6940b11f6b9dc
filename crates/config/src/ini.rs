//! Reader for the section-keyed role source format.
//!
//! ```text
//! # comment
//! [grammar]
//! prompt =
//!   fix spelling and grammar
//!   keep the meaning
//! options.temperature = 0.2
//!
//! [grammar.chat]
//! ui.open_chat_command = preset_tab
//! ```
//!
//! Rules:
//! - `[name]` opens a section; section names are case-sensitive.
//! - `key = value` or `key: value`; keys are lower-cased and trimmed.
//! - Lines starting with `#` or `;` (after indentation) are comments.
//! - An indented line continues the previous value; blank lines between
//!   continuation lines are kept. The joined value is trimmed.
//! - A duplicate section or a duplicate key within one source is an error.

use std::collections::BTreeMap;
use std::path::Path;

use crate::ConfigError;

/// Keys of one section, in key order.
pub type IniSection = BTreeMap<String, String>;

/// All sections of one or more sources, by section name.
pub type SectionMap = BTreeMap<String, IniSection>;

/// Parse one source. `source_name` is used in error messages only.
pub fn parse(source_name: &str, text: &str) -> Result<SectionMap, ConfigError> {
    let mut parser = Parser::new(source_name);
    for (index, line) in text.lines().enumerate() {
        parser.feed(index + 1, line)?;
    }
    Ok(parser.finish())
}

/// Read and parse a source file.
pub fn read_file(path: &Path) -> Result<SectionMap, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse(&path.display().to_string(), &text)
}

/// Overlay `later` on `base`: sections are unioned, keys of `later` win.
pub fn overlay(base: &mut SectionMap, later: SectionMap) {
    for (name, section) in later {
        base.entry(name).or_default().extend(section);
    }
}

struct Parser<'a> {
    source_name: &'a str,
    sections: SectionMap,
    current_section: Option<String>,
    /// Key being built and its collected lines.
    current_key: Option<(String, Vec<String>)>,
    /// Blank lines seen since the last content line of `current_key`.
    pending_blank: usize,
}

impl<'a> Parser<'a> {
    fn new(source_name: &'a str) -> Self {
        Self {
            source_name,
            sections: SectionMap::new(),
            current_section: None,
            current_key: None,
            pending_blank: 0,
        }
    }

    fn error(&self, line: usize, reason: impl Into<String>) -> ConfigError {
        ConfigError::ParseError {
            source_name: self.source_name.to_string(),
            line,
            reason: reason.into(),
        }
    }

    fn feed(&mut self, line_no: usize, line: &str) -> Result<(), ConfigError> {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if self.current_key.is_some() {
                self.pending_blank += 1;
            }
            return Ok(());
        }

        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            return Ok(());
        }

        let indented = line.starts_with(|c: char| c.is_whitespace());
        if indented && let Some((_, lines)) = self.current_key.as_mut() {
            lines.extend(std::iter::repeat_n(String::new(), self.pending_blank));
            lines.push(trimmed.to_string());
            self.pending_blank = 0;
            return Ok(());
        }

        self.flush_key();

        if let Some(header) = trimmed.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| self.error(line_no, format!("malformed section header '{trimmed}'")))?;
            if self.sections.contains_key(name) {
                return Err(self.error(line_no, format!("duplicate section '{name}'")));
            }
            self.sections.insert(name.to_string(), IniSection::new());
            self.current_section = Some(name.to_string());
            return Ok(());
        }

        let Some(section) = self.current_section.as_ref() else {
            return Err(self.error(line_no, "key outside of any section"));
        };

        let split_at = trimmed
            .find(['=', ':'])
            .ok_or_else(|| self.error(line_no, format!("expected 'key = value', got '{trimmed}'")))?;
        let key = trimmed[..split_at].trim().to_lowercase();
        let value = trimmed[split_at + 1..].trim();
        if key.is_empty() {
            return Err(self.error(line_no, "empty key"));
        }
        if self
            .sections
            .get(section)
            .is_some_and(|s| s.contains_key(&key))
        {
            return Err(self.error(
                line_no,
                format!("duplicate key '{key}' in section '{section}'"),
            ));
        }

        self.current_key = Some((key, vec![value.to_string()]));
        Ok(())
    }

    fn flush_key(&mut self) {
        self.pending_blank = 0;
        let Some((key, lines)) = self.current_key.take() else {
            return;
        };
        if let Some(section) = self
            .current_section
            .as_ref()
            .and_then(|name| self.sections.get_mut(name))
        {
            section.insert(key, lines.join("\n").trim().to_string());
        }
    }

    fn finish(mut self) -> SectionMap {
        self.flush_key();
        self.sections
    }
}
