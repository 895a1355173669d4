//! Error taxonomy for a chat invocation.
//!
//! Only fatal conditions live here. Failures of individual tool calls are
//! reported to the model as ordinary results (see `openai::call::ToolResolution`)
//! and never surface as a `ChatError`.

use async_openai::error::OpenAIError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Missing credential, unreadable profile document, invalid setting.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote completion call failed (network, auth, quota).
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote response was neither a final answer nor a well-formed
    /// function-call request.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The caller passed something unusable (e.g. an empty message).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("model kept requesting functions after {max_rounds} rounds")]
    RoundLimitExceeded { max_rounds: usize },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("function '{0}' is already registered")]
    DuplicateName(String),

    #[error("Unknown tool: {0}")]
    UnknownFunction(String),
}

impl ChatError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Whether retrying the whole `chat` call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChatError::Transport(_))
    }
}

impl From<OpenAIError> for ChatError {
    fn from(value: OpenAIError) -> Self {
        match value {
            // request building failed locally; nothing was sent
            OpenAIError::InvalidArgument(msg) => ChatError::Protocol(msg),
            OpenAIError::JSONDeserialize(err) => {
                ChatError::Protocol(format!("failed to decode response: {err}"))
            }
            other => ChatError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_function_message_names_the_function() {
        let err = RegistryError::UnknownFunction("lookup_weather".into());
        assert_eq!(err.to_string(), "Unknown tool: lookup_weather");
    }

    #[test]
    fn registry_error_converts_into_chat_error() {
        let err: ChatError = RegistryError::DuplicateName("echo".into()).into();
        assert!(matches!(err, ChatError::Registry(RegistryError::DuplicateName(ref n)) if n == "echo"));
        assert!(!err.is_transient());
    }

    #[test]
    fn invalid_argument_is_a_protocol_error() {
        let err: ChatError = OpenAIError::InvalidArgument("bad request".into()).into();
        assert!(matches!(err, ChatError::Protocol(_)));
    }
}
