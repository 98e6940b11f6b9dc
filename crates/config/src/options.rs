//! Normalization of provider options before they reach a backend.

use crate::value::{ConfigMap, ConfigValue};

/// Normalize an options map.
///
/// `initial_prompt` may be written as one multi-line string or as a list of
/// lines; it always leaves here as a list of lines. Other keys pass through.
pub fn make_options(options: &ConfigMap) -> ConfigMap {
    let mut result = options.clone();
    if let Some(ConfigValue::String(text)) = options.get("initial_prompt") {
        let lines = text
            .split('\n')
            .map(|line| ConfigValue::String(line.to_string()))
            .collect();
        result.insert("initial_prompt".into(), ConfigValue::List(lines));
    }
    result
}

/// The `initial_prompt` option as text, lines joined with `\n`.
pub fn initial_prompt(options: &ConfigMap) -> String {
    match options.get("initial_prompt") {
        Some(ConfigValue::List(lines)) => lines
            .iter()
            .filter_map(ConfigValue::to_scalar_string)
            .collect::<Vec<_>>()
            .join("\n"),
        Some(ConfigValue::String(text)) => text.clone(),
        _ => String::new(),
    }
}
