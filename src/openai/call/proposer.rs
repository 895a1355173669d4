use async_openai::config::OpenAIConfig;
use async_openai::types::CreateChatCompletionResponse;
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::config::{Config, Credentials};
use crate::error::ChatError;
use crate::openai::history::{FunctionCallRequest, Turn};
use crate::openai::tools::FunctionSignature;

use super::request::build_request;
use super::types::CompletionResponse;

/// The remote side of a round: given the transcript and the advertised
/// functions, answer with final text or function-call requests.
///
/// Timeouts and retries belong to implementations; the conversation loop
/// treats any error as fatal for the current invocation.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        transcript: &[Turn],
        functions: &[FunctionSignature],
    ) -> Result<CompletionResponse, ChatError>;
}

/// `CompletionClient` backed by the OpenAI chat-completions API.
#[derive(Debug, Clone)]
pub struct OpenAiCompletionClient {
    client: Client<OpenAIConfig>,
    config: Config,
}

impl OpenAiCompletionClient {
    pub fn new(credentials: &Credentials, config: Config) -> Self {
        let api = OpenAIConfig::new().with_api_key(credentials.openai_api_key.clone());
        Self { client: Client::with_config(api), config }
    }

    /// Use a prebuilt SDK client (custom base URL, proxies, ...).
    pub fn with_client(client: Client<OpenAIConfig>, config: Config) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    #[instrument(name = "complete", skip_all, fields(model = %self.config.model, transcript_len = transcript.len()))]
    async fn complete(
        &self,
        transcript: &[Turn],
        functions: &[FunctionSignature],
    ) -> Result<CompletionResponse, ChatError> {
        let req = build_request(transcript, functions, &self.config)?;
        info!(target: "openai", functions = functions.len(), "chat_completion_request");
        let resp = self.client.chat().create(req).await?;
        debug!(target: "openai", choices = resp.choices.len(), "chat_completion_response");
        interpret_response(resp)
    }
}

/// Map an API response onto `CompletionResponse`.
///
/// Tool calls win over text; a choice carrying neither is a protocol error.
pub fn interpret_response(resp: CreateChatCompletionResponse) -> Result<CompletionResponse, ChatError> {
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ChatError::protocol("response contained no choices"))?;
    let message = choice.message;

    let calls: Vec<FunctionCallRequest> = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|c| FunctionCallRequest::new(c.id, c.function.name, c.function.arguments))
        .collect();

    if !calls.is_empty() {
        if let Some(bad) = calls.iter().find(|c| c.id.is_empty() || c.name.is_empty()) {
            return Err(ChatError::protocol(format!(
                "malformed function call request (id='{}', name='{}')",
                bad.id, bad.name
            )));
        }
        return Ok(CompletionResponse::FunctionCalls { content: message.content, calls });
    }

    match message.content {
        Some(text) => Ok(CompletionResponse::Final { text }),
        None => Err(ChatError::protocol("response had neither content nor tool calls")),
    }
}

/// Single request/response with no functions advertised.
#[instrument(name = "ask_once", skip(client, system_prompt))]
pub async fn ask_once(client: &dyn CompletionClient, system_prompt: &str, prompt: &str) -> Result<String, ChatError> {
    let transcript = [Turn::system(system_prompt), Turn::user(prompt)];
    match client.complete(&transcript, &[]).await? {
        CompletionResponse::Final { text } => Ok(text),
        CompletionResponse::FunctionCalls { calls, .. } => Err(ChatError::protocol(format!(
            "model requested {} function call(s) although none were offered",
            calls.len()
        ))),
    }
}
