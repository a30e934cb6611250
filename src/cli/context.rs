//! Everything a command needs from disk and the environment.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::config::data::path_display;
use crate::core::config::Config;
use crate::core::dispatch::Dispatcher;
use crate::core::keyring::CredentialStore;
use crate::core::settings::{resolve_credential, SessionSettings};
use crate::core::state::{PersistedState, StateFile};
use crate::core::transport::{HttpTransport, TransportFailure};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Paths and switches shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub config_path: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
    pub use_keyring: bool,
}

pub struct CliContext {
    config_path: PathBuf,
    state_file: StateFile,
    pub config: Config,
    pub state: PersistedState,
    pub credentials: CredentialStore,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// `OPENAI_BASE_URL` wins over the configured base URL.
pub fn effective_base_url(config: &Config, env_base_url: Option<String>) -> String {
    non_blank(env_base_url)
        .map(|url| url.trim().to_string())
        .unwrap_or_else(|| config.base_url().to_string())
}

impl CliContext {
    pub fn load(options: &ContextOptions) -> Result<Self, Box<dyn Error>> {
        let config_path = match &options.config_path {
            Some(path) => path.clone(),
            None => Config::default_path()?,
        };
        let state_path = match &options.state_path {
            Some(path) => path.clone(),
            None => StateFile::default_path()?,
        };

        let config = Config::load_from_path(&config_path)?;
        let state_file = StateFile::new(state_path);
        let state = state_file.load()?;
        debug!(
            config = %path_display(&config_path),
            state = %path_display(state_file.path()),
            turns = state.conversation.len(),
            "Loaded configuration and state"
        );

        Ok(Self {
            config_path,
            state_file,
            config,
            state,
            credentials: CredentialStore::new_with_keyring(options.use_keyring),
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn state_path(&self) -> &Path {
        self.state_file.path()
    }

    /// The key stored by `parlance auth`. Keyring trouble degrades to "no
    /// key" so chat keeps working on simulated replies.
    fn user_api_key(&self) -> Option<String> {
        match self.credentials.get() {
            Ok(key) => key,
            Err(err) => {
                warn!(
                    recoverable = err.is_recoverable(),
                    "Could not read credential from keyring: {err}"
                );
                None
            }
        }
    }

    pub fn session_settings(&self, model_override: Option<&str>) -> SessionSettings {
        let user_key = self.user_api_key();
        let server_key = non_blank(std::env::var(API_KEY_ENV).ok());
        let credential = resolve_credential(user_key.as_deref(), server_key.as_deref());
        if let Some(credential) = &credential {
            debug!(source = credential.source().as_str(), "Credential resolved");
        }

        let model = model_override
            .filter(|model| !model.trim().is_empty())
            .unwrap_or(self.state.model.as_str());

        self.config
            .session_settings()
            .with_model(model)
            .with_credential(credential)
    }

    pub fn base_url(&self) -> String {
        effective_base_url(&self.config, std::env::var(BASE_URL_ENV).ok())
    }

    pub fn dispatcher(&self) -> Result<Dispatcher, TransportFailure> {
        let transport = HttpTransport::new(self.base_url(), self.config.request_timeout())?;
        Ok(Dispatcher::new(Arc::new(transport)))
    }

    pub fn save_config(&self) -> Result<(), Box<dyn Error>> {
        self.config.save_to_path(&self.config_path)
    }

    pub fn save_state(&self) -> Result<(), Box<dyn Error>> {
        self.state_file.save(&self.state)?;
        Ok(())
    }
}
