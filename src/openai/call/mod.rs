// Submodule for tool-calling features: types, remote client, dispatcher, and the conversation loop.

pub mod types;
pub mod request;
pub mod proposer;
pub mod resolver;
pub mod multi_step;

pub use types::{ChatOutcome, CompletionResponse, LoopEvent, ToolResolution};
pub use request::{build_request, determine_token_limit_strategy, TokenLimitStrategy};
pub use proposer::{ask_once, interpret_response, CompletionClient, OpenAiCompletionClient};
pub use resolver::{resolve_and_execute_tool_call, ToolDispatcher};
pub use multi_step::ConversationLoop;
