//! Application settings and credentials.
//!
//! Everything is read once at startup and passed into constructors; nothing
//! below re-reads the environment while a chat is running.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ChatError;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const PUSHOVER_USER: &str = "PUSHOVER_USER";
pub const PUSHOVER_TOKEN: &str = "PUSHOVER_TOKEN";

/// Round cap applied when `PROFILE_CHAT_MAX_ROUNDS` is not set.
pub const DEFAULT_MAX_ROUNDS: usize = 8;

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// OpenAI APIモデル名
    pub model: String,
    /// `max_tokens` limit for 4o-family models
    pub max_tokens: u32,
    /// `max_completion_tokens` limit for newer models
    pub max_completion_tokens: u32,
    /// Maximum number of model round trips per `chat` call.
    pub max_rounds: usize,
    /// Name of the person the bot speaks for.
    pub profile_name: String,
    /// Directory holding `summary.txt` and `linkedin.txt`.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            // NOTE: Keep in sync with tests (tests/config_tests.rs).
            max_tokens: 2000,
            max_completion_tokens: 2000,
            max_rounds: DEFAULT_MAX_ROUNDS,
            profile_name: "Profile Owner".to_string(),
            data_dir: PathBuf::from("me"),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `PROFILE_CHAT_*` / `PROFILE_*` variables.
    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChatError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(model) = non_empty(lookup("PROFILE_CHAT_MODEL")) {
            config.model = model;
        }
        if let Some(raw) = non_empty(lookup("PROFILE_CHAT_MAX_ROUNDS")) {
            config.max_rounds = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ChatError::configuration(format!(
                        "PROFILE_CHAT_MAX_ROUNDS must be a positive integer, got '{raw}'"
                    )));
                }
            };
        }
        if let Some(name) = non_empty(lookup("PROFILE_NAME")) {
            config.profile_name = name;
        }
        if let Some(dir) = non_empty(lookup("PROFILE_DATA_DIR")) {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}

/// API keys supplied at process start.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub openai_api_key: String,
    pub pushover_user: Option<String>,
    pub pushover_token: Option<String>,
}

// keys must never end up in logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &"<redacted>")
            .field("pushover_user", &self.pushover_user.as_ref().map(|_| "<set>"))
            .field("pushover_token", &self.pushover_token.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChatError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = non_empty(lookup(OPENAI_API_KEY)).ok_or_else(|| missing(OPENAI_API_KEY))?;
        Ok(Self {
            openai_api_key,
            pushover_user: non_empty(lookup(PUSHOVER_USER)),
            pushover_token: non_empty(lookup(PUSHOVER_TOKEN)),
        })
    }

    /// Both Pushover values, when both are present.
    pub fn pushover(&self) -> Option<(&str, &str)> {
        match (&self.pushover_user, &self.pushover_token) {
            (Some(user), Some(token)) => Some((user.as_str(), token.as_str())),
            _ => None,
        }
    }
}

/// Read a single environment variable.
///
/// `required` turns an unset or empty value into a configuration error;
/// otherwise `default` is returned in its place.
pub fn env_var(key: &str, required: bool, default: Option<&str>) -> Result<Option<String>, ChatError> {
    match non_empty(std::env::var(key).ok()) {
        Some(v) => Ok(Some(v)),
        None if required => Err(missing(key)),
        None => Ok(default.map(str::to_string)),
    }
}

/// Which of `keys` are set to a non-empty value.
pub fn check_required(keys: &[&str]) -> BTreeMap<String, bool> {
    keys.iter()
        .map(|k| (k.to_string(), non_empty(std::env::var(k).ok()).is_some()))
        .collect()
}

/// Load the first `.env` file that exists among `candidates`, overriding
/// already-set variables. Falls back to dotenvy's default lookup.
pub fn load_dotenv<P: AsRef<Path>>(candidates: &[P]) -> Option<PathBuf> {
    for path in candidates {
        let path = path.as_ref();
        if path.exists() {
            match dotenvy::from_path_override(path) {
                Ok(()) => {
                    info!(path = %path.display(), "loaded .env");
                    return Some(path.to_path_buf());
                }
                Err(e) => debug!(path = %path.display(), error = %e, "failed to load .env candidate"),
            }
        }
    }
    dotenvy::dotenv_override().ok()
}

fn missing(key: &str) -> ChatError {
    ChatError::configuration(format!(
        "{key} is not set. Please create a .env file with {key}=your_value_here"
    ))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
