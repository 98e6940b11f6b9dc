//! Role store: named prompt/config fragments selected with `/name`.
//!
//! Roles are read fresh from their source files on every call; the files
//! may change between invocations. Sources are layered:
//!
//! 1. **Bundled roles**: compiled in from `roles/default.ini`
//! 2. **User roles**: the configured role file (must exist)
//! 3. **Generated roles**: sections returned by an optional [`RoleGenerator`]
//!
//! Two section layouts are understood. The current one keys sections by
//! command type:
//!
//! ```text
//! [grammar]                 -> default slot
//! [grammar.chat]            -> chat slot (also .complete, .edit, .image)
//! options.temperature = 0.2 -> {"options": {"temperature": "0.2"}}
//! ```
//!
//! The deprecated one splits options and ui into their own sections
//! (`grammar.options`, `grammar.options-chat`, `grammar.ui-edit`, ...) and
//! shares the base section's `prompt` across every text command.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;
use vimai_core::CommandType;

use crate::ConfigError;
use crate::ini::{self, IniSection, SectionMap};
use crate::value::{ConfigMap, ConfigValue, merge_deep, merge_into};

/// The role applied implicitly before any `/name` role.
pub const DEFAULT_ROLE_NAME: &str = "default";

/// Bundled role definitions, read before the user's role file.
pub const BUNDLED_ROLES: &str = include_str!("../roles/default.ini");

/// Top-level keys accepted in a current-syntax role section.
const SCALAR_KEYS: &[&str] = &["prompt", "provider"];

/// Namespaces whose leaves are opaque, single-level keys.
const NAMESPACES: &[&str] = &["options", "ui"];

const DEPRECATED_SUFFIXES: &[&str] = &[
    "options",
    "options-complete",
    "options-edit",
    "options-chat",
    "ui",
    "ui-complete",
    "ui-edit",
    "ui-chat",
];

/// Source of synthetic role sections, consulted on every lookup.
pub trait RoleGenerator: Send + Sync {
    fn generate(&self) -> Result<SectionMap, ConfigError>;
}

impl<F> RoleGenerator for F
where
    F: Fn() -> SectionMap + Send + Sync,
{
    fn generate(&self) -> Result<SectionMap, ConfigError> {
        Ok(self())
    }
}

/// A role's configuration, one map per slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleConfig {
    pub default: ConfigMap,
    pub complete: ConfigMap,
    pub edit: ConfigMap,
    pub chat: ConfigMap,
    pub image: ConfigMap,
}

impl RoleConfig {
    /// The command-specific slot (without the default slot merged in).
    pub fn slot(&self, command_type: CommandType) -> &ConfigMap {
        match command_type {
            CommandType::Complete => &self.complete,
            CommandType::Edit => &self.edit,
            CommandType::Chat => &self.chat,
            CommandType::Image => &self.image,
        }
    }

    /// Merge `other` over `self`, slot by slot.
    pub fn merge(&mut self, other: &RoleConfig) {
        merge_into(&mut self.default, &other.default);
        merge_into(&mut self.complete, &other.complete);
        merge_into(&mut self.edit, &other.edit);
        merge_into(&mut self.chat, &other.chat);
        merge_into(&mut self.image, &other.image);
    }

    /// The default slot with the command slot merged over it.
    pub fn resolve(&self, command_type: CommandType) -> ConfigMap {
        merge_deep([&self.default, self.slot(command_type)])
    }
}

/// Loads roles from their sources on demand.
pub struct RoleStore {
    include_bundled: bool,
    files: Vec<PathBuf>,
    generator: Option<Box<dyn RoleGenerator>>,
}

impl std::fmt::Debug for RoleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleStore")
            .field("include_bundled", &self.include_bundled)
            .field("files", &self.files)
            .field("generator", &self.generator.is_some())
            .finish()
    }
}

impl RoleStore {
    /// Bundled roles plus the user's role file.
    pub fn new(roles_file: impl Into<PathBuf>) -> Self {
        Self {
            include_bundled: true,
            files: vec![roles_file.into()],
            generator: None,
        }
    }

    /// Bundled roles only.
    pub fn bundled() -> Self {
        Self {
            include_bundled: true,
            files: Vec::new(),
            generator: None,
        }
    }

    /// Skip the compiled-in role definitions.
    pub fn without_bundled_roles(mut self) -> Self {
        self.include_bundled = false;
        self
    }

    /// Add another role file; later files override earlier ones key by key.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Contribute dynamic role sections before every lookup.
    pub fn with_generator(mut self, generator: impl RoleGenerator + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    /// Read every source into one section map.
    pub fn read_sections(&self) -> Result<SectionMap, ConfigError> {
        let mut sections = if self.include_bundled {
            ini::parse("<bundled roles>", BUNDLED_ROLES)?
        } else {
            SectionMap::new()
        };

        for path in &self.files {
            ini::overlay(&mut sections, ini::read_file(path)?);
        }

        if let Some(generator) = &self.generator {
            let generated = generator.generate()?;
            debug!(count = generated.len(), "Adding generated role sections");
            sections.extend(generated);
        }

        Ok(sections)
    }

    /// Load one role by name.
    pub fn load_role(&self, name: &str) -> Result<RoleConfig, ConfigError> {
        load_role_from(&self.read_sections()?, name)
    }

    /// Load the default role followed by `names`, merge them slot by slot,
    /// and resolve the result for `command_type`.
    pub fn resolve_roles(
        &self,
        names: &[String],
        command_type: CommandType,
    ) -> Result<ConfigMap, ConfigError> {
        let sections = self.read_sections()?;
        let mut merged = RoleConfig::default();
        for name in std::iter::once(DEFAULT_ROLE_NAME).chain(names.iter().map(String::as_str)) {
            merged.merge(&load_role_from(&sections, name)?);
        }
        debug!(?names, %command_type, "Resolved role configuration");
        Ok(merged.resolve(command_type))
    }

    /// Role names selectable for `command_type`.
    pub fn list_role_names(&self, command_type: CommandType) -> Result<BTreeSet<String>, ConfigError> {
        Ok(role_names(&self.read_sections()?, command_type))
    }
}

/// Role names selectable for `command_type` from an already-read section map.
pub fn role_names(sections: &SectionMap, command_type: CommandType) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for section_name in sections.keys() {
        let (base, suffix) = match section_name.split_once('.') {
            Some((base, suffix)) => (base, Some(suffix)),
            None => (section_name.as_str(), None),
        };
        if base == DEFAULT_ROLE_NAME {
            continue;
        }
        let listed = match (command_type, suffix) {
            (CommandType::Image, Some(suffix)) => suffix == "image",
            (CommandType::Image, None) => false,
            (_, None) => true,
            (_, Some(suffix)) => suffix == command_type.as_str(),
        };
        if listed {
            names.insert(base.to_string());
        }
    }
    names
}

/// Load one role from an already-read section map.
pub fn load_role_from(sections: &SectionMap, name: &str) -> Result<RoleConfig, ConfigError> {
    let exists = sections.contains_key(name)
        || CommandType::ALL
            .iter()
            .any(|c| sections.contains_key(&format!("{name}.{c}")));
    if !exists {
        return Err(ConfigError::RoleNotFound(name.to_string()));
    }

    if is_deprecated_syntax(sections, name) {
        debug!(role = name, "Loading role with deprecated section syntax");
        return Ok(load_deprecated(sections, name));
    }

    let slot = |suffix: Option<CommandType>| -> Result<ConfigMap, ConfigError> {
        let section_name = match suffix {
            Some(c) => format!("{name}.{c}"),
            None => name.to_string(),
        };
        match sections.get(&section_name) {
            Some(section) => parse_role_section(&section_name, section),
            None => Ok(ConfigMap::new()),
        }
    };

    Ok(RoleConfig {
        default: slot(None)?,
        complete: slot(Some(CommandType::Complete))?,
        edit: slot(Some(CommandType::Edit))?,
        chat: slot(Some(CommandType::Chat))?,
        image: slot(Some(CommandType::Image))?,
    })
}

fn is_deprecated_syntax(sections: &SectionMap, name: &str) -> bool {
    DEPRECATED_SUFFIXES
        .iter()
        .any(|suffix| sections.contains_key(&format!("{name}.{suffix}")))
}

fn load_deprecated(sections: &SectionMap, name: &str) -> RoleConfig {
    let prompt = sections
        .get(name)
        .and_then(|s| s.get("prompt"))
        .cloned()
        .unwrap_or_default();

    let flat = |suffix: &str| -> ConfigValue {
        let map: ConfigMap = sections
            .get(&format!("{name}.{suffix}"))
            .map(|section| {
                section
                    .iter()
                    .map(|(k, v)| (k.clone(), ConfigValue::String(v.clone())))
                    .collect()
            })
            .unwrap_or_default();
        ConfigValue::Map(map)
    };

    let slot = |options: &str, ui: &str| -> ConfigMap {
        ConfigMap::from([
            ("prompt".to_string(), ConfigValue::String(prompt.clone())),
            ("options".to_string(), flat(options)),
            ("ui".to_string(), flat(ui)),
        ])
    };

    RoleConfig {
        default: slot("options", "ui"),
        complete: slot("options-complete", "ui-complete"),
        edit: slot("options-edit", "ui-edit"),
        chat: slot("options-chat", "ui-chat"),
        image: ConfigMap::new(),
    }
}

/// Unflatten dotted keys over the fixed grammar `prompt | provider |
/// options.<leaf> | ui.<leaf>`.
pub fn parse_role_section(section_name: &str, section: &IniSection) -> Result<ConfigMap, ConfigError> {
    let mut result = ConfigMap::new();
    for (key, value) in section {
        let invalid = || ConfigError::InvalidRoleKey {
            section: section_name.to_string(),
            key: key.clone(),
        };
        match key.split_once('.') {
            None if SCALAR_KEYS.contains(&key.as_str()) => {
                result.insert(key.clone(), ConfigValue::String(value.clone()));
            }
            Some((namespace, leaf))
                if NAMESPACES.contains(&namespace) && !leaf.is_empty() && !leaf.contains('.') =>
            {
                let child = result
                    .entry(namespace.to_string())
                    .or_insert_with(|| ConfigValue::Map(ConfigMap::new()));
                match child {
                    ConfigValue::Map(map) => {
                        map.insert(leaf.to_string(), ConfigValue::String(value.clone()));
                    }
                    _ => return Err(invalid()),
                }
            }
            _ => return Err(invalid()),
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(text: &str) -> SectionMap {
        ini::parse("test.ini", text).unwrap()
    }

    fn s(v: &str) -> ConfigValue {
        ConfigValue::String(v.into())
    }

    #[test]
    fn unflattens_dotted_keys() {
        let secs = sections("[r]\nprompt = hi\noptions.model = m\nui.paste_mode = 0\n");
        let map = parse_role_section("r", &secs["r"]).unwrap();
        assert_eq!(map["prompt"], s("hi"));
        assert_eq!(map["options"].as_map().unwrap()["model"], s("m"));
        assert_eq!(map["ui"].as_map().unwrap()["paste_mode"], s("0"));
    }

    #[test]
    fn rejects_unknown_top_level_key() {
        let secs = sections("[r]\npromt = typo\n");
        let err = parse_role_section("r", &secs["r"]).unwrap_err();
        match err {
            ConfigError::InvalidRoleKey { section, key } => {
                assert_eq!(section, "r");
                assert_eq!(key, "promt");
            }
            other => panic!("Expected InvalidRoleKey, got: {other}"),
        }
    }

    #[test]
    fn rejects_nested_and_foreign_namespaces() {
        let secs = sections("[a]\noptions.a.b = 1\n[b]\nmodel.name = x\n[c]\noptions. = x\n");
        assert!(parse_role_section("a", &secs["a"]).is_err());
        assert!(parse_role_section("b", &secs["b"]).is_err());
        assert!(parse_role_section("c", &secs["c"]).is_err());
    }

    #[test]
    fn missing_role_is_not_found() {
        let secs = sections("[known]\nprompt = x\n");
        let err = load_role_from(&secs, "unknown").unwrap_err();
        assert!(matches!(err, ConfigError::RoleNotFound(name) if name == "unknown"));
    }

    #[test]
    fn role_with_only_command_section_exists() {
        let secs = sections("[hd.image]\noptions.quality = hd\n");
        let role = load_role_from(&secs, "hd").unwrap();
        assert!(role.default.is_empty());
        assert_eq!(
            role.image["options"].as_map().unwrap()["quality"],
            s("hd")
        );
    }

    #[test]
    fn deprecated_syntax_shares_prompt() {
        let secs = sections(
            "[old]\nprompt = be terse\n[old.options]\nmodel = m\n[old.options-chat]\nendpoint_url = u\n[old.ui-chat]\nopen_chat_command = preset_tab\n",
        );
        let role = load_role_from(&secs, "old").unwrap();
        for slot in [&role.default, &role.complete, &role.edit, &role.chat] {
            assert_eq!(slot["prompt"], s("be terse"));
        }
        assert!(role.image.is_empty());
        assert_eq!(role.default["options"].as_map().unwrap()["model"], s("m"));
        assert_eq!(role.chat["options"].as_map().unwrap()["endpoint_url"], s("u"));
        assert_eq!(role.chat["ui"].as_map().unwrap()["open_chat_command"], s("preset_tab"));
        assert!(role.edit["options"].as_map().unwrap().is_empty());
    }

    #[test]
    fn command_slot_overrides_default_slot() {
        let secs = sections("[r]\noptions.model = base\noptions.temperature = 1\n[r.edit]\noptions.model = edit\n");
        let role = load_role_from(&secs, "r").unwrap();
        let resolved = role.resolve(CommandType::Edit);
        let options = resolved["options"].as_map().unwrap();
        assert_eq!(options["model"], s("edit"));
        assert_eq!(options["temperature"], s("1"));
        assert_eq!(role.resolve(CommandType::Chat)["options"].as_map().unwrap()["model"], s("base"));
    }

    #[test]
    fn listing_respects_command_suffix_and_image_rule() {
        let secs = sections(
            "[default]\n[plain]\n[chatty.chat]\n[pic.image]\n[mixed]\n[mixed.image]\n",
        );
        let chat = role_names(&secs, CommandType::Chat);
        assert_eq!(
            chat,
            BTreeSet::from(["chatty".to_string(), "mixed".to_string(), "plain".to_string()])
        );
        let image = role_names(&secs, CommandType::Image);
        assert_eq!(image, BTreeSet::from(["mixed".to_string(), "pic".to_string()]));
        assert!(!role_names(&secs, CommandType::Edit).contains("default"));
    }

    #[test]
    fn generator_sections_take_part_in_lookup() {
        let store = RoleStore::bundled().with_generator(|| {
            SectionMap::from([(
                "generated".to_string(),
                IniSection::from([("prompt".to_string(), "from code".to_string())]),
            )])
        });
        let role = store.load_role("generated").unwrap();
        assert_eq!(role.default["prompt"], s("from code"));
        assert!(store.list_role_names(CommandType::Edit).unwrap().contains("generated"));
    }

    #[test]
    fn bundled_roles_parse_and_define_default() {
        let store = RoleStore::bundled();
        let role = store.load_role(DEFAULT_ROLE_NAME).unwrap();
        assert_eq!(role, load_role_from(&store.read_sections().unwrap(), "default").unwrap());
        let chat = store.list_role_names(CommandType::Chat).unwrap();
        for name in ["right", "below", "tab", "populate", "populate-all", "codebase"] {
            assert!(chat.contains(name), "missing bundled role {name}");
        }
    }

    #[test]
    fn later_roles_win_within_a_slot() {
        let store = RoleStore::bundled().with_generator(|| {
            ini::parse(
                "gen",
                "[a]\noptions.model = a\noptions.temperature = 0.1\n[b]\noptions.model = b\n[b.chat]\nprompt = chat b\n",
            )
            .unwrap_or_default()
        });
        let config = store
            .resolve_roles(&["a".to_string(), "b".to_string()], CommandType::Chat)
            .unwrap();
        let options = config["options"].as_map().unwrap();
        assert_eq!(options["model"], s("b"));
        assert_eq!(options["temperature"], s("0.1"));
        assert_eq!(config["prompt"], s("chat b"));
    }
}
