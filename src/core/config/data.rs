use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::settings::{
    DispatchMode, SessionSettings, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
use crate::core::transport::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use crate::core::window::DEFAULT_WINDOW_LIMIT;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// API base URL (e.g., "https://api.openai.com/v1")
    pub base_url: Option<String>,
    /// Sampling temperature between 0.0 and 1.0
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens per reply
    pub max_tokens: Option<u32>,
    /// Number of trailing turns sent with each request
    pub context_window: Option<usize>,
    /// Seconds to wait for the provider before giving up
    pub request_timeout_secs: Option<u64>,
    /// Allow remote calls at all; when off every reply is simulated
    pub remote_enabled: Option<bool>,
    /// Require remote answers instead of falling back to simulated replies
    pub remote_only: Option<bool>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Zero is not a usable window and falls back to the default.
    pub fn context_window(&self) -> usize {
        self.context_window
            .filter(|turns| *turns > 0)
            .unwrap_or(DEFAULT_WINDOW_LIMIT)
    }

    /// Zero is not a usable timeout and falls back to the default.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        if self.remote_only.unwrap_or(false) {
            DispatchMode::RemoteOnly
        } else {
            DispatchMode::AllowFallback
        }
    }

    /// Session settings seeded from this file. Credential and model are
    /// filled in by the caller from the keyring and the state file.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            remote_enabled: self.remote_enabled.unwrap_or(true),
            mode: self.dispatch_mode(),
            ..SessionSettings::default()
        }
    }
}
