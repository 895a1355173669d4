use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall,
    ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs,
    ChatCompletionToolType,
    CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
    FunctionCall,
};
use tracing::debug;

use crate::config::Config;
use crate::openai::history::Turn;
use crate::openai::tools::FunctionSignature;

/// トークン制限戦略を表現する列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLimitStrategy {
    /// `max_tokens` を使用（4oモデル向け）
    MaxTokens,
    /// `max_completion_tokens` を使用（5系モデル向け）
    MaxCompletionTokens,
}

/// モデル名からトークン制限戦略を判定する
pub fn determine_token_limit_strategy(model: &str) -> TokenLimitStrategy {
    if model.contains("4o") {
        TokenLimitStrategy::MaxTokens
    } else {
        TokenLimitStrategy::MaxCompletionTokens
    }
}

/// Convert one transcript turn into the chat-completions message shape.
pub fn to_request_message(turn: &Turn) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let msg: ChatCompletionRequestMessage = match turn {
        Turn::System(text) => ChatCompletionRequestSystemMessageArgs::default()
            .content(text.as_str())
            .build()?
            .into(),
        Turn::User(text) => ChatCompletionRequestUserMessageArgs::default()
            .content(text.as_str())
            .build()?
            .into(),
        Turn::Assistant { content, tool_calls } => {
            let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
            if let Some(text) = content {
                builder.content(text.as_str());
            }
            if !tool_calls.is_empty() {
                let calls: Vec<ChatCompletionMessageToolCall> = tool_calls
                    .iter()
                    .map(|c| ChatCompletionMessageToolCall {
                        id: c.id.clone(),
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall { name: c.name.clone(), arguments: c.arguments.clone() },
                    })
                    .collect();
                builder.tool_calls(calls);
            }
            builder.build()?.into()
        }
        Turn::ToolResult(result) => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(result.call_id.as_str())
            .content(result.content())
            .build()?
            .into(),
    };
    Ok(msg)
}

/// 会話履歴とモデル設定からChatCompletionリクエストを構築する
pub fn build_request(
    transcript: &[Turn],
    functions: &[FunctionSignature],
    config: &Config,
) -> Result<CreateChatCompletionRequest, OpenAIError> {
    let messages = transcript
        .iter()
        .map(to_request_message)
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = CreateChatCompletionRequestArgs::default();
    builder.model(&config.model).messages(messages);

    // an empty `tools` array is rejected by the API
    if !functions.is_empty() {
        let tools: Vec<_> = functions.iter().map(FunctionSignature::as_chat_tool).collect();
        builder.tools(tools);
    }

    let strategy = determine_token_limit_strategy(&config.model);
    debug!(target: "openai", model = %config.model, ?strategy, "token limit strategy");
    match strategy {
        TokenLimitStrategy::MaxTokens => builder.max_tokens(config.max_tokens),
        TokenLimitStrategy::MaxCompletionTokens => builder.max_completion_tokens(config.max_completion_tokens),
    };

    builder.build()
}
