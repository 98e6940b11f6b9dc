//! Built-in per-command defaults, the bottom layer of every effective config.

use vimai_core::CommandType;

use crate::value::{ConfigMap, ConfigValue};

const DEFAULT_PROVIDER: &str = "openai";

const CHAT_INITIAL_PROMPT: &[&str] = &[
    ">>> system",
    "",
    "You are a general assistant.",
    "If you attach a code block add syntax type after ``` to enable syntax highlighting.",
];

const TEXT_INITIAL_PROMPT: &[&str] = &[
    ">>> system",
    "",
    "You are a general assistant.",
    "Answer shortly, concisely and only what you are asked.",
    "Do not provide any explanation or comments if not requested.",
    "If you answer in code, do not wrap it in a markdown code block.",
];

fn table<const N: usize>(entries: [(&str, ConfigValue); N]) -> ConfigValue {
    ConfigValue::Map(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

fn lines(text: &[&str]) -> ConfigValue {
    ConfigValue::List(text.iter().map(|line| ConfigValue::from(*line)).collect())
}

fn root<const N: usize>(entries: [(&str, ConfigValue); N]) -> ConfigMap {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Defaults for one command type.
pub fn builtin_defaults(command_type: CommandType) -> ConfigMap {
    match command_type {
        CommandType::Chat => root([
            ("provider", DEFAULT_PROVIDER.into()),
            ("prompt", "".into()),
            (
                "options",
                table([
                    ("model", "gpt-4o".into()),
                    ("endpoint_url", "https://api.openai.com/v1/chat/completions".into()),
                    ("max_tokens", ConfigValue::Integer(0)),
                    ("temperature", ConfigValue::Integer(1)),
                    ("request_timeout", ConfigValue::Integer(20)),
                    ("stream", ConfigValue::Integer(1)),
                    ("selection_boundary", "".into()),
                    ("initial_prompt", lines(CHAT_INITIAL_PROMPT)),
                ]),
            ),
            (
                "ui",
                table([
                    ("open_chat_command", "preset_below".into()),
                    ("scratch_buffer_keep_open", ConfigValue::Integer(0)),
                    ("populate_options", ConfigValue::Integer(0)),
                    ("code_syntax_enabled", ConfigValue::Integer(1)),
                    ("force_new_chat", ConfigValue::Integer(0)),
                    ("paste_mode", ConfigValue::Integer(1)),
                ]),
            ),
        ]),
        CommandType::Complete | CommandType::Edit => root([
            ("provider", DEFAULT_PROVIDER.into()),
            ("prompt", "".into()),
            (
                "options",
                table([
                    ("model", "gpt-4o".into()),
                    ("endpoint_url", "https://api.openai.com/v1/chat/completions".into()),
                    ("max_tokens", ConfigValue::Integer(0)),
                    ("temperature", ConfigValue::Float(0.1)),
                    ("request_timeout", ConfigValue::Integer(20)),
                    ("stream", ConfigValue::Integer(1)),
                    ("selection_boundary", "#####".into()),
                    ("initial_prompt", lines(TEXT_INITIAL_PROMPT)),
                ]),
            ),
            ("ui", table([("paste_mode", ConfigValue::Integer(1))])),
        ]),
        CommandType::Image => root([
            ("provider", DEFAULT_PROVIDER.into()),
            ("prompt", "".into()),
            (
                "options",
                table([
                    ("model", "dall-e-3".into()),
                    ("endpoint_url", "https://api.openai.com/v1/images/generations".into()),
                    ("quality", "standard".into()),
                    ("size", "1024x1024".into()),
                    ("style", "vivid".into()),
                    ("request_timeout", ConfigValue::Integer(40)),
                    ("download_dir", "".into()),
                ]),
            ),
            ("ui", table([])),
        ]),
    }
}
