use serde_json::Value;

/// Speaker of a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    ToolResult,
}

/// A model-issued request to run a local function.
///
/// `arguments` stays in the serialized form the model produced; decoding is
/// the dispatcher's job so that malformed payloads can be reported back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl FunctionCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), arguments: arguments.into() }
    }
}

/// Outcome of one [`FunctionCallRequest`], correlated by `call_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallResult {
    pub call_id: String,
    pub name: String,
    pub payload: Value,
    pub is_error: bool,
}

impl FunctionCallResult {
    /// Serialized payload as sent back to the model.
    pub fn content(&self) -> String {
        self.payload.to_string()
    }

    /// Error message carried by an error-shaped payload.
    pub fn error_message(&self) -> Option<&str> {
        if !self.is_error {
            return None;
        }
        self.payload.get("error").and_then(Value::as_str)
    }
}

/// One message of a conversation. Never mutated once appended.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    System(String),
    User(String),
    Assistant {
        content: Option<String>,
        tool_calls: Vec<FunctionCallRequest>,
    },
    ToolResult(FunctionCallResult),
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Turn::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Turn::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Turn::Assistant { content: Some(content.into()), tool_calls: Vec::new() }
    }

    pub fn role(&self) -> Role {
        match self {
            Turn::System(_) => Role::System,
            Turn::User(_) => Role::User,
            Turn::Assistant { .. } => Role::Assistant,
            Turn::ToolResult(_) => Role::ToolResult,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Turn::System(t) | Turn::User(t) => Some(t),
            Turn::Assistant { content, .. } => content.as_deref(),
            Turn::ToolResult(_) => None,
        }
    }

    pub fn is_function_call(&self) -> bool {
        matches!(self, Turn::Assistant { tool_calls, .. } if !tool_calls.is_empty())
    }
}

/// Append-only transcript for a single `chat` invocation.
///
/// Invariant: push order == send order; nothing is ever removed or edited.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn as_slice(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn into_vec(self) -> Vec<Turn> {
        self.turns
    }

    pub fn roles(&self) -> Vec<Role> {
        self.turns.iter().map(Turn::role).collect()
    }

    pub fn push(&mut self, turn: Turn) -> &mut Self {
        self.turns.push(turn);
        self
    }

    pub fn extend<I: IntoIterator<Item = Turn>>(&mut self, turns: I) -> &mut Self {
        self.turns.extend(turns);
        self
    }

    pub fn add_system<S: AsRef<str>>(&mut self, content: S) -> &mut Self {
        self.push(Turn::system(content.as_ref()))
    }

    pub fn add_user<S: AsRef<str>>(&mut self, content: S) -> &mut Self {
        self.push(Turn::user(content.as_ref()))
    }

    pub fn add_assistant<S: AsRef<str>>(&mut self, content: S) -> &mut Self {
        self.push(Turn::assistant(content.as_ref()))
    }

    /// Assistant turn that requests functions; the raw requests are kept so
    /// results can be correlated by id.
    pub fn add_tool_calls(&mut self, content: Option<String>, calls: Vec<FunctionCallRequest>) -> &mut Self {
        self.push(Turn::Assistant { content, tool_calls: calls })
    }

    pub fn add_tool_result(&mut self, result: FunctionCallResult) -> &mut Self {
        self.push(Turn::ToolResult(result))
    }
}
