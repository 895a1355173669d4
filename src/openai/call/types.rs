use serde_json::Value;
use std::fmt::{self, Display};

use crate::openai::history::{ConversationHistory, FunctionCallRequest, FunctionCallResult};

/// What the remote model answered in one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionResponse {
    /// Terminal answer; no functions requested.
    Final { text: String },
    /// One or more function calls, optionally with accompanying text.
    FunctionCalls {
        content: Option<String>,
        calls: Vec<FunctionCallRequest>,
    },
}

impl CompletionResponse {
    pub fn final_text(text: impl Into<String>) -> Self {
        CompletionResponse::Final { text: text.into() }
    }

    pub fn calls(calls: Vec<FunctionCallRequest>) -> Self {
        CompletionResponse::FunctionCalls { content: None, calls }
    }
}

/// Local outcome of resolving and running one function call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResolution {
    Executed { name: String, result: Value },
    ToolNotFound { requested: String },
    ArgumentsParseError { name: String, raw: String, error: String },
    ExecutionError { name: String, error: String },
}

impl ToolResolution {
    pub fn is_executed(&self) -> bool {
        matches!(self, ToolResolution::Executed { .. })
    }

    pub fn name(&self) -> &str {
        match self {
            ToolResolution::Executed { name, .. }
            | ToolResolution::ArgumentsParseError { name, .. }
            | ToolResolution::ExecutionError { name, .. } => name,
            ToolResolution::ToolNotFound { requested } => requested,
        }
    }

    /// Result turn fed back to the model. Failures become `{"error": ...}`.
    pub fn into_result(self, call_id: impl Into<String>) -> FunctionCallResult {
        let call_id = call_id.into();
        match self {
            ToolResolution::Executed { name, result } => {
                FunctionCallResult { call_id, name, payload: result, is_error: false }
            }
            ToolResolution::ToolNotFound { requested } => FunctionCallResult {
                call_id,
                payload: serde_json::json!({ "error": format!("Unknown tool: {requested}") }),
                name: requested,
                is_error: true,
            },
            ToolResolution::ArgumentsParseError { name, error, .. } => FunctionCallResult {
                call_id,
                payload: serde_json::json!({ "error": format!("invalid arguments for {name}: {error}") }),
                name,
                is_error: true,
            },
            ToolResolution::ExecutionError { name, error } => FunctionCallResult {
                call_id,
                payload: serde_json::json!({ "error": format!("{name} failed: {error}") }),
                name,
                is_error: true,
            },
        }
    }
}

/// Result of a completed `chat` invocation.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub answer: String,
    pub transcript: ConversationHistory,
    pub rounds: usize,
}

/// Progress notifications emitted by the conversation loop.
#[derive(Debug, Clone)]
pub enum LoopEvent {
    RoundStart { round: usize, transcript_len: usize },
    Proposed { round: usize, response: CompletionResponse },
    Dispatched { round: usize, results: Vec<FunctionCallResult> },
    FinalText { round: usize, text: String },
}

// ----- Display (ログで %display を使うため) -----
impl Display for CompletionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionResponse::Final { text } => write!(f, "Final(len={})", text.len()),
            CompletionResponse::FunctionCalls { calls, .. } => {
                let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
                write!(f, "FunctionCalls [{}]", names.join(", "))
            }
        }
    }
}

impl Display for ToolResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolResolution::Executed { name, result } => write!(f, "Executed name={} result={}", name, result),
            ToolResolution::ToolNotFound { requested } => write!(f, "ToolNotFound requested={}", requested),
            ToolResolution::ArgumentsParseError { name, raw, error } => {
                write!(f, "ArgumentsParseError name={} error={} raw={}", name, error, raw)
            }
            ToolResolution::ExecutionError { name, error } => {
                write!(f, "ExecutionError name={} error={}", name, error)
            }
        }
    }
}

impl Display for LoopEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopEvent::RoundStart { round, transcript_len } => {
                write!(f, "RoundStart #{} transcript_len={}", round, transcript_len)
            }
            LoopEvent::Proposed { round, response } => write!(f, "Proposed @{} => {}", round, response),
            LoopEvent::Dispatched { round, results } => {
                let failed = results.iter().filter(|r| r.is_error).count();
                write!(f, "Dispatched @{} results={} failed={}", round, results.len(), failed)
            }
            LoopEvent::FinalText { round, text } => write!(f, "FinalText @{} len={}", round, text.len()),
        }
    }
}
