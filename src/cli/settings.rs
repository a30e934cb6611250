//! `set` / `unset` handling.
//!
//! Keys map either onto the TOML config or onto the state document. Values
//! are validated here so that a bad `set` never reaches disk.

use std::fmt;
use std::str::FromStr;

use crate::core::config::Config;
use crate::core::settings::{ModelId, SessionSettings, MAX_TOKENS_LIMIT};
use crate::core::state::PersistedState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Model,
    Temperature,
    MaxTokens,
    ContextWindow,
    Timeout,
    BaseUrl,
    Remote,
    RemoteOnly,
    Voice,
    DarkMode,
}

impl SettingKey {
    pub const ALL: [SettingKey; 10] = [
        SettingKey::Model,
        SettingKey::Temperature,
        SettingKey::MaxTokens,
        SettingKey::ContextWindow,
        SettingKey::Timeout,
        SettingKey::BaseUrl,
        SettingKey::Remote,
        SettingKey::RemoteOnly,
        SettingKey::Voice,
        SettingKey::DarkMode,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Model => "model",
            SettingKey::Temperature => "temperature",
            SettingKey::MaxTokens => "max-tokens",
            SettingKey::ContextWindow => "context-window",
            SettingKey::Timeout => "timeout",
            SettingKey::BaseUrl => "base-url",
            SettingKey::Remote => "remote",
            SettingKey::RemoteOnly => "remote-only",
            SettingKey::Voice => "voice",
            SettingKey::DarkMode => "dark-mode",
        }
    }

    /// Which document a change to this key lands in.
    pub fn target(self) -> SettingTarget {
        match self {
            SettingKey::Model | SettingKey::Voice | SettingKey::DarkMode => SettingTarget::State,
            _ => SettingTarget::Config,
        }
    }
}

impl FromStr for SettingKey {
    type Err = SettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        SettingKey::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == key)
            .ok_or_else(|| SettingError::UnknownKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingTarget {
    Config,
    State,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingError {
    UnknownKey(String),
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => {
                let known: Vec<&str> = SettingKey::ALL.iter().map(|k| k.as_str()).collect();
                write!(f, "Unknown setting '{key}'. Known settings: {}", known.join(", "))
            }
            SettingError::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "Invalid value '{value}' for {key}: expected {expected}"),
        }
    }
}

impl std::error::Error for SettingError {}

fn invalid(key: SettingKey, value: &str, expected: &'static str) -> SettingError {
    SettingError::InvalidValue {
        key: key.as_str(),
        value: value.to_string(),
        expected,
    }
}

fn parse_bool(key: SettingKey, value: &str) -> Result<bool, SettingError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, value, "true or false")),
    }
}

fn parse_number<T: FromStr>(
    key: SettingKey,
    value: &str,
    expected: &'static str,
) -> Result<T, SettingError> {
    value.trim().parse().map_err(|_| invalid(key, value, expected))
}

/// Apply `set <key> <value>`, returning a confirmation line.
pub fn apply_set(
    key: SettingKey,
    value: &str,
    config: &mut Config,
    state: &mut PersistedState,
) -> Result<String, SettingError> {
    match key {
        SettingKey::Model => {
            let model =
                ModelId::from_str(value).map_err(|_| invalid(key, value, "a supported model"))?;
            state.model = model.as_str().to_string();
        }
        SettingKey::Temperature => {
            let expected = "a number between 0.0 and 1.0";
            let temperature: f32 = parse_number(key, value, expected)?;
            if !(0.0..=1.0).contains(&temperature) {
                return Err(invalid(key, value, expected));
            }
            config.temperature = Some(temperature);
        }
        SettingKey::MaxTokens => {
            let expected = "an integer between 1 and 4000";
            let max_tokens: u32 = parse_number(key, value, expected)?;
            if !(1..=MAX_TOKENS_LIMIT).contains(&max_tokens) {
                return Err(invalid(key, value, expected));
            }
            config.max_tokens = Some(max_tokens);
        }
        SettingKey::ContextWindow => {
            let expected = "a positive integer";
            let turns: usize = parse_number(key, value, expected)?;
            if turns == 0 {
                return Err(invalid(key, value, expected));
            }
            config.context_window = Some(turns);
        }
        SettingKey::Timeout => {
            let expected = "a positive number of seconds";
            let secs: u64 = parse_number(key, value, expected)?;
            if secs == 0 {
                return Err(invalid(key, value, expected));
            }
            config.request_timeout_secs = Some(secs);
        }
        SettingKey::BaseUrl => {
            let url = value.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid(key, value, "an http:// or https:// URL"));
            }
            config.base_url = Some(url.trim_end_matches('/').to_string());
        }
        SettingKey::Remote => config.remote_enabled = Some(parse_bool(key, value)?),
        SettingKey::RemoteOnly => config.remote_only = Some(parse_bool(key, value)?),
        SettingKey::Voice => state.voice_enabled = parse_bool(key, value)?,
        SettingKey::DarkMode => state.dark_mode = parse_bool(key, value)?,
    }
    Ok(format!(
        "✅ Set {} to: {}",
        key.as_str(),
        describe(key, config, state)
    ))
}

/// Apply `unset <key>`, restoring the default.
pub fn apply_unset(key: SettingKey, config: &mut Config, state: &mut PersistedState) -> String {
    let defaults = PersistedState::default();
    match key {
        SettingKey::Model => state.model = defaults.model,
        SettingKey::Temperature => config.temperature = None,
        SettingKey::MaxTokens => config.max_tokens = None,
        SettingKey::ContextWindow => config.context_window = None,
        SettingKey::Timeout => config.request_timeout_secs = None,
        SettingKey::BaseUrl => config.base_url = None,
        SettingKey::Remote => config.remote_enabled = None,
        SettingKey::RemoteOnly => config.remote_only = None,
        SettingKey::Voice => state.voice_enabled = defaults.voice_enabled,
        SettingKey::DarkMode => state.dark_mode = defaults.dark_mode,
    }
    format!(
        "✅ Unset {} (now: {})",
        key.as_str(),
        describe(key, config, state)
    )
}

/// Effective value of a key, defaults included.
pub fn describe(key: SettingKey, config: &Config, state: &PersistedState) -> String {
    let session = config.session_settings();
    match key {
        SettingKey::Model => state.model.clone(),
        SettingKey::Temperature => session.temperature.to_string(),
        SettingKey::MaxTokens => session.max_tokens.to_string(),
        SettingKey::ContextWindow => config.context_window().to_string(),
        SettingKey::Timeout => format!("{}s", config.request_timeout().as_secs()),
        SettingKey::BaseUrl => config.base_url().to_string(),
        SettingKey::Remote => session.remote_enabled.to_string(),
        SettingKey::RemoteOnly => config.remote_only.unwrap_or(false).to_string(),
        SettingKey::Voice => state.voice_enabled.to_string(),
        SettingKey::DarkMode => state.dark_mode.to_string(),
    }
}

/// Lines for the `settings` command.
pub fn render_settings(
    config: &Config,
    state: &PersistedState,
    settings: &SessionSettings,
) -> Vec<String> {
    let mut lines: Vec<String> = SettingKey::ALL
        .into_iter()
        .map(|key| format!("  {:<15} {}", key.as_str(), describe(key, config, state)))
        .collect();

    let credential = match &settings.credential {
        Some(credential) => format!(
            "{} ({})",
            credential.redacted(),
            credential.source().as_str()
        ),
        None => "none (replies are simulated)".to_string(),
    };
    lines.push(format!("  {:<15} {}", "credential", credential));
    lines
}
