//! Session settings consulted by the dispatcher.
//!
//! Settings are plain values owned by the caller and passed into every
//! dispatch; nothing here is process-global.

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const MAX_TOKENS_LIMIT: u32 = 4000;

/// Models the client knows how to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelId {
    Gpt4o,
    Gpt4,
    #[default]
    Gpt35Turbo,
    Claude37Sonnet,
    Llama3,
}

impl ModelId {
    pub const ALL: [ModelId; 5] = [
        ModelId::Gpt4o,
        ModelId::Gpt4,
        ModelId::Gpt35Turbo,
        ModelId::Claude37Sonnet,
        ModelId::Llama3,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelId::Gpt4o => "gpt-4o",
            ModelId::Gpt4 => "gpt-4",
            ModelId::Gpt35Turbo => "gpt-3.5-turbo",
            ModelId::Claude37Sonnet => "claude-3-7-sonnet",
            ModelId::Llama3 => "llama-3-70b",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ModelId::Gpt4o => "OpenAI's most capable model",
            ModelId::Gpt4 => "Strong reasoning, higher cost",
            ModelId::Gpt35Turbo => "Fast and inexpensive",
            ModelId::Claude37Sonnet => "Anthropic's balanced model",
            ModelId::Llama3 => "Meta's open model",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModel(pub String);

impl fmt::Display for UnknownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known: Vec<&str> = ModelId::ALL.iter().map(|model| model.as_str()).collect();
        write!(
            f,
            "unsupported model '{}' (known models: {})",
            self.0,
            known.join(", ")
        )
    }
}

impl std::error::Error for UnknownModel {}

impl FromStr for ModelId {
    type Err = UnknownModel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        ModelId::ALL
            .into_iter()
            .find(|model| model.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownModel(value.to_string()))
    }
}

/// Where the active credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Supplied by the user (keyring entry or explicit input).
    User,
    /// Held by the deployment, e.g. `OPENAI_API_KEY`.
    ServerDefault,
}

impl CredentialSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialSource::User => "user",
            CredentialSource::ServerDefault => "server default",
        }
    }
}

/// An API key. `Debug` never shows the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    secret: String,
    source: CredentialSource,
}

impl Credential {
    pub fn new(secret: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            secret: secret.into(),
            source,
        }
    }

    pub fn user(secret: impl Into<String>) -> Self {
        Self::new(secret, CredentialSource::User)
    }

    pub fn expose(&self) -> &str {
        &self.secret
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    /// Short form safe for display, e.g. `sk-…wxyz`.
    pub fn redacted(&self) -> String {
        let chars: Vec<char> = self.secret.chars().collect();
        if chars.len() <= 8 {
            return "…".to_string();
        }
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("secret", &self.redacted())
            .field("source", &self.source)
            .finish()
    }
}

/// Pick the credential for a session. A user-supplied key always wins over
/// the deployment default; blank values count as absent.
pub fn resolve_credential(user: Option<&str>, server_default: Option<&str>) -> Option<Credential> {
    let usable = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|trimmed| !trimmed.is_empty())
            .map(str::to_string)
    };

    usable(user)
        .map(|secret| Credential::new(secret, CredentialSource::User))
        .or_else(|| {
            usable(server_default)
                .map(|secret| Credential::new(secret, CredentialSource::ServerDefault))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Answer locally when a remote call is not possible.
    #[default]
    AllowFallback,
    /// Remote answers only; a missing credential is reported as an error.
    RemoteOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub credential: Option<Credential>,
    /// Raw model identifier; checked against [`ModelId`] on every dispatch.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub remote_enabled: bool,
    pub mode: DispatchMode,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            credential: None,
            model: ModelId::default().as_str().to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            remote_enabled: true,
            mode: DispatchMode::default(),
        }
    }
}

/// Settings after validation, ready to build a request from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub model: ModelId,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    UnknownModel(UnknownModel),
    TemperatureOutOfRange(String),
    MaxTokensOutOfRange(u32),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::UnknownModel(err) => write!(f, "{err}"),
            SettingsError::TemperatureOutOfRange(value) => {
                write!(f, "temperature {value} is outside 0.0..=1.0")
            }
            SettingsError::MaxTokensOutOfRange(value) => {
                write!(f, "max tokens {value} is outside 1..={MAX_TOKENS_LIMIT}")
            }
        }
    }
}

impl std::error::Error for SettingsError {}

impl SessionSettings {
    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn validate(&self) -> Result<GenerationParams, SettingsError> {
        let model = self
            .model
            .parse::<ModelId>()
            .map_err(SettingsError::UnknownModel)?;

        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(SettingsError::TemperatureOutOfRange(
                self.temperature.to_string(),
            ));
        }

        if !(1..=MAX_TOKENS_LIMIT).contains(&self.max_tokens) {
            return Err(SettingsError::MaxTokensOutOfRange(self.max_tokens));
        }

        Ok(GenerationParams {
            model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }

    /// The credential to use for a remote call, if remote calls are allowed.
    pub fn remote_credential(&self) -> Option<&Credential> {
        if self.remote_enabled {
            self.credential.as_ref()
        } else {
            None
        }
    }
}
