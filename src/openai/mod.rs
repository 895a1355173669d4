//! OpenAI連携のモジュール
//!
//! Transcript types, callable tools, and the tool-calling conversation loop.

pub mod call;
pub mod history;
pub mod tools;

// 代表的な公開APIを再エクスポート
pub use call::{
	ask_once,
	ChatOutcome,
	CompletionClient,
	CompletionResponse,
	ConversationLoop,
	LoopEvent,
	OpenAiCompletionClient,
	ToolDispatcher,
	ToolResolution,
};
pub use history::{ConversationHistory, FunctionCallRequest, FunctionCallResult, Role, Turn};
pub use tools::{
	profile_registry,
	FunctionSignature,
	ToolDefinition,
	ToolHandler,
	ToolParameters,
	ToolParametersBuilder,
	ToolRegistry,
};
