//! Key-value state file holding the conversation and UI preferences.
//!
//! The file is a flat JSON object with fixed keys. Turns are validated one by
//! one on load; anything malformed is dropped rather than failing the whole
//! file. There is no schema version.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::core::config::data::path_display;
use crate::core::config::io::project_dirs;
use crate::core::conversation::Conversation;
use crate::core::message::{Role, Turn};
use crate::core::settings::ModelId;

pub const KEY_MESSAGES: &str = "chatMessages";
pub const KEY_MODEL: &str = "model";
pub const KEY_VOICE: &str = "voiceEnabled";
pub const KEY_DARK_MODE: &str = "darkMode";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedState {
    pub conversation: Conversation,
    pub model: String,
    pub voice_enabled: bool,
    pub dark_mode: bool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            conversation: Conversation::seeded(),
            model: ModelId::default().as_str().to_string(),
            voice_enabled: false,
            dark_mode: false,
        }
    }
}

#[derive(Debug)]
pub enum StateError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        detail: String,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Read { path, source } => {
                write!(f, "Failed to read state at {}: {}", path_display(path), source)
            }
            StateError::Parse { path, detail } => {
                write!(f, "Failed to parse state at {}: {}", path_display(path), detail)
            }
            StateError::Write { path, source } => {
                write!(f, "Failed to write state at {}: {}", path_display(path), source)
            }
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StateError::Read { source, .. } | StateError::Write { source, .. } => Some(source),
            StateError::Parse { .. } => None,
        }
    }
}

/// Parse one stored turn. `None` for anything that is not a well-formed turn
/// with a known role.
fn parse_turn(value: &Value) -> Option<Turn> {
    let object = value.as_object()?;
    let id = object.get("id")?.as_str()?.trim();
    let role = Role::try_from(object.get("role")?.as_str()?).ok()?;
    let content = object.get("content")?.as_str()?;
    let timestamp = object.get("timestamp")?.as_str()?;
    let created_at = DateTime::parse_from_rfc3339(timestamp)
        .ok()?
        .with_timezone(&Utc);

    if id.is_empty() || content.trim().is_empty() {
        return None;
    }
    Some(Turn::restore(
        id.to_string(),
        role,
        content.to_string(),
        created_at,
    ))
}

fn parse_flag(map: &Map<String, Value>, key: &str) -> bool {
    match map.get(key) {
        Some(Value::String(text)) => text == "true",
        Some(Value::Bool(flag)) => *flag,
        _ => false,
    }
}

impl PersistedState {
    /// Decode a state document. Only a document that is not a JSON object is
    /// an error; individual bad entries fall back to defaults.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(text).map_err(|err| err.to_string())?;
        let Value::Object(map) = value else {
            return Err("state document is not a JSON object".to_string());
        };

        let mut turns: Vec<Turn> = Vec::new();
        let mut seen_ids = HashSet::new();
        if let Some(Value::Array(entries)) = map.get(KEY_MESSAGES) {
            for (index, entry) in entries.iter().enumerate() {
                match parse_turn(entry) {
                    Some(turn) if seen_ids.insert(turn.id().to_string()) => turns.push(turn),
                    Some(turn) => {
                        warn!(index, id = turn.id(), "Discarding stored turn with duplicate id")
                    }
                    None => warn!(index, "Discarding malformed stored turn"),
                }
            }
        }

        let model = map
            .get(KEY_MODEL)
            .and_then(Value::as_str)
            .filter(|model| !model.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| ModelId::default().as_str().to_string());

        Ok(Self {
            conversation: Conversation::from_turns(turns),
            model,
            voice_enabled: parse_flag(&map, KEY_VOICE),
            dark_mode: parse_flag(&map, KEY_DARK_MODE),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut map = Map::new();
        map.insert(
            KEY_MESSAGES.to_string(),
            serde_json::to_value(self.conversation.turns())?,
        );
        map.insert(KEY_MODEL.to_string(), Value::String(self.model.clone()));
        map.insert(
            KEY_VOICE.to_string(),
            Value::String(self.voice_enabled.to_string()),
        );
        map.insert(
            KEY_DARK_MODE.to_string(),
            Value::String(self.dark_mode.to_string()),
        );
        serde_json::to_string_pretty(&Value::Object(map))
    }
}

/// Location of the state document on disk.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let dirs = project_dirs().ok_or("Failed to determine data directory")?;
        Ok(dirs.data_dir().join("state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<PersistedState, StateError> {
        if !self.path.exists() {
            debug!(path = %path_display(&self.path), "No state file; starting fresh");
            return Ok(PersistedState::default());
        }

        let text = fs::read_to_string(&self.path).map_err(|source| StateError::Read {
            path: self.path.clone(),
            source,
        })?;
        PersistedState::from_json(&text).map_err(|detail| StateError::Parse {
            path: self.path.clone(),
            detail,
        })
    }

    pub fn save(&self, state: &PersistedState) -> Result<(), StateError> {
        let write_err = |source: std::io::Error| StateError::Write {
            path: self.path.clone(),
            source,
        };

        let contents = state
            .to_json()
            .map_err(|err| write_err(std::io::Error::other(err)))?;

        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(write_err)?;
        }

        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(write_err)?;
        temp_file
            .write_all(contents.as_bytes())
            .map_err(write_err)?;
        temp_file.as_file_mut().sync_all().map_err(write_err)?;
        temp_file
            .persist(&self.path)
            .map_err(|err| write_err(err.error))?;

        debug!(
            path = %path_display(&self.path),
            turns = state.conversation.len(),
            "State saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::{MessageStore, GREETING};
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_seeded_defaults() {
        let temp_dir = TempDir::new().expect("temp dir");
        let state = StateFile::new(temp_dir.path().join("state.json"))
            .load()
            .expect("load");
        assert_eq!(state.conversation.len(), 1);
        assert_eq!(state.conversation.turns()[0].content(), GREETING);
        assert_eq!(state.model, "gpt-3.5-turbo");
        assert!(!state.voice_enabled);
        assert!(!state.dark_mode);
    }

    #[test]
    fn save_then_load_preserves_turn_identity() {
        let temp_dir = TempDir::new().expect("temp dir");
        let file = StateFile::new(temp_dir.path().join("nested").join("state.json"));

        let mut store = MessageStore::new();
        store.append(Turn::user("hi")).expect("append");
        store.append(Turn::assistant("hello!")).expect("append");
        let state = PersistedState {
            conversation: store.conversation().clone(),
            model: "gpt-4o".to_string(),
            voice_enabled: true,
            dark_mode: false,
        };

        file.save(&state).expect("save");
        let loaded = file.load().expect("load");
        assert_eq!(loaded, state);
    }

    #[test]
    fn stored_document_uses_fixed_keys_and_string_flags() {
        let json = PersistedState::default().to_json().expect("encode");
        let value: Value = serde_json::from_str(&json).expect("decode");
        assert!(value[KEY_MESSAGES].is_array());
        assert_eq!(value[KEY_MODEL], "gpt-3.5-turbo");
        assert_eq!(value[KEY_VOICE], "false");
        assert_eq!(value[KEY_DARK_MODE], "false");
    }

    #[test]
    fn malformed_turns_are_discarded_individually() {
        let text = r#"{
            "chatMessages": [
                {"id": "a", "role": "user", "content": "kept", "timestamp": "2024-05-01T10:00:00Z"},
                {"id": "b", "role": "tool", "content": "bad role", "timestamp": "2024-05-01T10:00:01Z"},
                {"id": "c", "role": "assistant", "timestamp": "2024-05-01T10:00:02Z"},
                {"id": "d", "role": "assistant", "content": "bad time", "timestamp": "yesterday"},
                "not an object",
                {"id": "e", "role": "assistant", "content": "also kept", "timestamp": "2024-05-01T10:00:03+02:00"}
            ],
            "model": "gpt-4",
            "voiceEnabled": "true",
            "darkMode": "nope"
        }"#;

        let state = PersistedState::from_json(text).expect("object parses");
        let contents: Vec<&str> = state.conversation.iter().map(Turn::content).collect();
        assert_eq!(contents, ["kept", "also kept"]);
        assert_eq!(state.conversation.turns()[0].id(), "a");
        assert_eq!(state.model, "gpt-4");
        assert!(state.voice_enabled);
        assert!(!state.dark_mode);
    }

    #[test]
    fn all_turns_malformed_reseeds_conversation() {
        let text = r#"{"chatMessages":[{"role":"robot"}]}"#;
        let state = PersistedState::from_json(text).expect("object parses");
        assert_eq!(state.conversation.len(), 1);
        assert_eq!(state.conversation.turns()[0].content(), GREETING);
    }

    #[test]
    fn non_object_document_is_a_parse_error() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("state.json");
        fs::write(&path, "[1, 2, 3]").expect("write");

        let err = StateFile::new(&path).load().expect_err("array is rejected");
        assert!(matches!(err, StateError::Parse { .. }));
    }

    #[test]
    fn later_turns_reusing_an_id_are_dropped() {
        let text = r#"{
            "chatMessages": [
                {"id": "a", "role": "assistant", "content": "first", "timestamp": "2024-05-01T10:00:00Z"},
                {"id": "b", "role": "user", "content": "question", "timestamp": "2024-05-01T10:00:01Z"},
                {"id": "a", "role": "assistant", "content": "copy", "timestamp": "2024-05-01T10:00:02Z"}
            ]
        }"#;

        let state = PersistedState::from_json(text).expect("object parses");
        let ids: Vec<&str> = state.conversation.iter().map(Turn::id).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(state.conversation.turns()[0].content(), "first");
    }
}
