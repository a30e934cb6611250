//! Resolve a windowed history into an assistant reply.
//!
//! The dispatcher is stateless. Each call validates the settings, then either
//! answers locally through [`fallback::respond`] or makes exactly one remote
//! request. Failures come back as [`DispatchError`] values; the caller decides
//! what to show and whether to resend.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{ChatMessage, ChatRequest, ChatResponse, Usage};
use crate::core::fallback::{self, SIMULATED_MODEL};
use crate::core::settings::{DispatchMode, SessionSettings};
use crate::core::transport::{ChatTransport, TransportFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Remote,
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub model: String,
    pub usage: Option<Usage>,
    pub source: ReplySource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The selected model or a generation parameter is not acceptable.
    Configuration(String),
    /// A remote answer was required but no credential is configured.
    CredentialMissing,
    /// Upstream answered with an error status or a body of the wrong shape.
    Provider { status: u16, detail: String },
    /// No response could be obtained at all.
    Transport(String),
}

pub type DispatchResult = Result<Reply, DispatchError>;

impl DispatchError {
    /// One-line description suitable for a status line or log entry.
    pub fn summary(&self) -> String {
        match self {
            DispatchError::Provider { status, detail } => match summarize_provider_detail(detail) {
                Some(message) => format!("provider error ({status}): {message}"),
                None => format!("provider error ({status})"),
            },
            other => other.to_string(),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Configuration(detail) => write!(f, "configuration error: {detail}"),
            DispatchError::CredentialMissing => {
                write!(f, "no API credential configured for a remote-only request")
            }
            DispatchError::Provider { status, detail } => {
                write!(f, "provider error ({status}): {detail}")
            }
            DispatchError::Transport(detail) => write!(f, "transport error: {detail}"),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<TransportFailure> for DispatchError {
    fn from(failure: TransportFailure) -> Self {
        DispatchError::Transport(failure.to_string())
    }
}

/// Pull a human-readable message out of a provider error payload.
///
/// Understands `{"error":{"message":..}}`, `{"error":".."}` and
/// `{"message":".."}`. Non-JSON bodies yield their trimmed first line.
pub fn summarize_provider_detail(detail: &str) -> Option<String> {
    let trimmed = detail.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return trimmed.lines().next().map(str::to_string);
    };

    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("error").and_then(|v| v.as_str()))
        .or_else(|| value.get("message").and_then(|v| v.as_str()))?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Strictly parse a 2xx body. Anything missing `choices[0].message.content`
/// or `model` is a provider error, never a partial reply.
fn parse_success_body(status: u16, body: &str) -> DispatchResult {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|err| DispatchError::Provider {
            status,
            detail: format!("malformed response body: {err}"),
        })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| DispatchError::Provider {
            status,
            detail: "malformed response body: no choices returned".to_string(),
        })?;

    Ok(Reply {
        content,
        model: parsed.model,
        usage: parsed.usage,
        source: ReplySource::Remote,
    })
}

fn latest_user_content(history: &[ChatMessage]) -> &str {
    history
        .iter()
        .rev()
        .find(|message| message.role == "user")
        .map(|message| message.content.as_str())
        .unwrap_or_default()
}

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn ChatTransport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    pub async fn dispatch(
        &self,
        history: &[ChatMessage],
        settings: &SessionSettings,
    ) -> DispatchResult {
        let params = settings
            .validate()
            .map_err(|err| DispatchError::Configuration(err.to_string()))?;

        let Some(credential) = settings.remote_credential() else {
            return match settings.mode {
                DispatchMode::AllowFallback => {
                    let reply = fallback::respond(latest_user_content(history));
                    debug!(
                        remote_enabled = settings.remote_enabled,
                        "No usable credential; answering with fallback responder"
                    );
                    Ok(Reply {
                        content: reply.to_string(),
                        model: SIMULATED_MODEL.to_string(),
                        usage: None,
                        source: ReplySource::Simulated,
                    })
                }
                DispatchMode::RemoteOnly if !settings.remote_enabled => {
                    Err(DispatchError::Configuration(
                        "remote calls are disabled but the session requires a remote answer"
                            .to_string(),
                    ))
                }
                DispatchMode::RemoteOnly => Err(DispatchError::CredentialMissing),
            };
        };

        let request = ChatRequest {
            model: params.model.as_str().to_string(),
            messages: history.to_vec(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        info!(
            model = %request.model,
            messages = request.messages.len(),
            credential_source = credential.source().as_str(),
            "Dispatching to remote model"
        );

        let response = match self.transport.send(&request, credential.expose()).await {
            Ok(response) => response,
            Err(failure) => {
                warn!(error = %failure, "Chat request could not be completed");
                return Err(failure.into());
            }
        };

        if !response.is_success() {
            let err = DispatchError::Provider {
                status: response.status,
                detail: response.body,
            };
            warn!(status = response.status, summary = %err.summary(), "Provider returned an error");
            return Err(err);
        }

        let result = parse_success_body(response.status, &response.body);
        match &result {
            Ok(reply) => debug!(
                model = %reply.model,
                total_tokens = reply.usage.map(|usage| usage.total_tokens),
                "Remote reply parsed"
            ),
            Err(err) => warn!(error = %err, "Provider response did not match the expected shape"),
        }
        result
    }
}
