//! `vimai config`: Settings inspection commands.

use std::path::{Path, PathBuf};

use vimai_config::Settings;
use vimai_core::CommandType;

pub fn show(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let toml_str = toml::to_string_pretty(settings)?;
    println!("{toml_str}");
    Ok(())
}

/// `--config`, then `VIMAI_CONFIG`, then the default location.
pub fn settings_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => std::env::var_os("VIMAI_CONFIG")
            .map(Into::into)
            .unwrap_or_else(Settings::default_path),
    }
}

pub fn path(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", settings_path(explicit).display());
    Ok(())
}

/// Write the default settings to `path`, refusing to clobber unless `force`.
pub fn init(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!("{} already exists (use --force to overwrite)", path.display()).into());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Settings::default_toml()?)?;
    tracing::info!("Wrote default settings to {}", path.display());
    Ok(())
}

/// Settings were validated on load; this also loads every role once so
/// role-file typos surface here instead of mid-edit.
pub fn validate(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");
    println!("   Settings parsed successfully");

    let store = settings.role_store();
    let mut failures = Vec::new();
    let mut checked = std::collections::BTreeSet::new();
    for command_type in CommandType::ALL {
        for name in store.list_role_names(command_type)? {
            if checked.insert(name.clone())
                && let Err(e) = store.load_role(&name)
            {
                failures.push(format!("{name}: {e}"));
            }
        }
    }

    println!("   Role file: {}", settings.roles_config_file.display());
    println!("   Roles:     {}", checked.len());

    if failures.is_empty() {
        println!("   All checks passed");
        Ok(())
    } else {
        println!();
        for failure in &failures {
            println!("   Invalid role {failure}");
        }
        Err(format!("{} invalid role(s)", failures.len()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        init(&path, false).unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.roles_config_file, Settings::default().roles_config_file);
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "debug = true\n").unwrap();

        assert!(init(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "debug = true\n");

        init(&path, true).unwrap();
        assert!(!Settings::load_from(&path).unwrap().debug);
    }

    #[test]
    fn explicit_settings_path_wins() {
        let path = Path::new("/tmp/custom.toml");
        assert_eq!(settings_path(Some(path)), PathBuf::from("/tmp/custom.toml"));
    }
}
